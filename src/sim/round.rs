//! Host-facing round driver
//!
//! [`GameRound`] couples the fixed-step clock to the round state. The host
//! calls [`GameRound::tick`] with real elapsed time every frame, forwards
//! input through [`GameRound::release_block`] / [`GameRound::steer_crane`],
//! and reads [`GameRound::snapshot`] for rendering.

use serde::{Deserialize, Serialize};

use super::body::{BlockCategory, PhysicsBody};
use super::clock::SimulationClock;
use super::crane::CraneAnim;
use super::state::{GamePhase, GameState, RoundEvent};
use super::tick::{release_block, step};
use crate::lerp;
use crate::settings::{Difficulty, Settings};

/// Result of one host tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    /// Fraction of a logical step pending, in [0, 1)
    pub interpolation: f64,
    /// Events produced since the previous tick, in order
    pub events: Vec<RoundEvent>,
}

/// Render data for one block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockView {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub category: BlockCategory,
}

impl From<&PhysicsBody> for BlockView {
    fn from(body: &PhysicsBody) -> Self {
        Self {
            id: body.id,
            x: body.pos.x,
            y: body.pos.y,
            width: body.width(),
            height: body.height(),
            category: body.category,
        }
    }
}

/// Read-only view of the round for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub tower_blocks: Vec<BlockView>,
    /// Logical crane position
    pub crane_x: f64,
    pub crane_y: f64,
    /// Crane x blended between the last two steps
    pub crane_render_x: f64,
    pub crane_anim: CraneAnim,
    pub carried_block: Option<BlockView>,
    /// Falling block, position blended between the last two steps
    pub falling_block: Option<BlockView>,
    pub score: u64,
    pub combo: u32,
    pub best_combo: u32,
    /// Landings in the perfect tier this round
    pub perfect_count: u32,
    pub lives: u8,
    pub height: u32,
    pub instability: f64,
    pub tilt: f64,
    pub difficulty: Difficulty,
    pub interpolation: f64,
}

/// One play session
#[derive(Debug, Clone)]
pub struct GameRound {
    clock: SimulationClock,
    state: GameState,
    /// Events raised between ticks (input handlers)
    pending: Vec<RoundEvent>,
}

impl GameRound {
    /// New round waiting in `Menu`
    pub fn new(settings: Settings) -> Self {
        let clock = SimulationClock::new(settings.step_dt(), settings.clock.max_catch_up);
        Self {
            clock,
            state: GameState::new(settings),
            pending: Vec::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    /// Leave the menu and hang the first block
    pub fn start(&mut self) -> bool {
        if self.state.phase != GamePhase::Menu {
            return false;
        }
        log::info!(
            "Round start (seed {}, {})",
            self.state.settings.seed,
            self.state.round.difficulty.as_str()
        );
        self.state.phase = GamePhase::Playing;
        self.state.spawn_block();
        true
    }

    /// Advance by `elapsed` real seconds
    pub fn tick(&mut self, elapsed: f64) -> TickOutput {
        let mut events = std::mem::take(&mut self.pending);

        if self.state.phase.is_terminal() || self.state.phase == GamePhase::Menu {
            return TickOutput {
                interpolation: self.clock.interpolation(),
                events,
            };
        }

        let state = &mut self.state;
        let advance = self.clock.advance(elapsed, |dt| step(state, dt, &mut events));
        TickOutput {
            interpolation: advance.interpolation,
            events,
        }
    }

    /// Drop the carried block; no-op while nothing is carried or the claw is busy
    pub fn release_block(&mut self) -> bool {
        release_block(&mut self.state, &mut self.pending)
    }

    /// Move the manual crane target; no-op for other drives
    pub fn steer_crane(&mut self, x: f64) -> bool {
        if self.state.phase != GamePhase::Playing {
            return false;
        }
        self.state.crane.steer(x)
    }

    /// Change difficulty. Only allowed before the first drop of the round.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        let allowed = match self.state.phase {
            GamePhase::Menu => true,
            GamePhase::Playing => !self.state.round.first_drop_made,
            _ => false,
        };
        if !allowed {
            log::debug!("Ignoring difficulty change to {}", difficulty.as_str());
            return false;
        }

        log::info!("Difficulty set to {}", difficulty.as_str());
        self.state.settings.difficulty = difficulty;
        self.state.round.difficulty = difficulty;
        self.state.crane.retune(self.state.round.height, difficulty);
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state.phase != GamePhase::Playing {
            return false;
        }
        self.state.phase = GamePhase::Paused;
        self.clock.pause();
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state.phase != GamePhase::Paused {
            return false;
        }
        self.state.phase = GamePhase::Playing;
        self.clock.resume();
        true
    }

    /// Throw away the round and return to `Menu` with fresh state
    pub fn reset(&mut self) {
        log::info!("Round reset");
        let settings = self.state.settings.clone();
        self.clock = SimulationClock::new(settings.step_dt(), settings.clock.max_catch_up);
        self.state = GameState::new(settings);
        self.pending.clear();
    }

    /// Read-only view for rendering
    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        let t = self.clock.interpolation();
        let crane = state.crane.state();

        let crane_render_x = lerp(state.prev_crane_x, crane.x, t);

        // A carried block hangs from the hook, so it is drawn under the blended crane
        let carried_block = state.carried().map(|body| BlockView {
            x: crane_render_x,
            ..BlockView::from(body)
        });
        let falling_block = state.falling().map(|body| {
            let mut view = BlockView::from(body);
            if let Some(prev) = state.prev_active_pos {
                view.x = lerp(prev.x, body.pos.x, t);
                view.y = lerp(prev.y, body.pos.y, t);
            }
            view
        });

        Snapshot {
            phase: state.phase,
            tower_blocks: state.tower.blocks().iter().map(BlockView::from).collect(),
            crane_x: crane.x,
            crane_y: crane.y,
            crane_render_x,
            crane_anim: crane.anim,
            carried_block,
            falling_block,
            score: state.round.score,
            combo: state.round.combo,
            best_combo: state.round.best_combo,
            perfect_count: state.round.perfect_count,
            lives: state.round.lives,
            height: state.round.height,
            instability: state.tower.instability(),
            tilt: state.tower.tilt(),
            difficulty: state.round.difficulty,
            interpolation: t,
        }
    }
}
