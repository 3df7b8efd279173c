//! Round state and core simulation types
//!
//! Everything mutated by a fixed logical step lives in [`GameState`].

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Playfield, PhysicsBody, PhysicsParams};
use super::crane::CraneMotion;
use super::spawn::{roll_block, spawn_carried};
use super::tower::Tower;
use crate::settings::{Difficulty, Settings};

/// Current phase of the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the host to start the round
    Menu,
    /// Active gameplay
    Playing,
    /// Frozen mid-round
    Paused,
    /// Round ended badly
    GameOver { reason: GameOverReason },
    /// Target height reached
    Victory,
}

impl GamePhase {
    /// True once the round has ended and needs a reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::GameOver { .. } | GamePhase::Victory)
    }
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Instability crossed the threshold
    TowerCollapsed,
    /// A block dropped with no overlap onto the tower
    MissedTower,
    /// Lives ran out from lost blocks
    OutOfLives,
}

/// Quality tier of a landing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreTier {
    Perfect,
    Good,
    Partial,
}

impl ScoreTier {
    /// Good-or-better placements keep the combo going
    pub fn extends_combo(&self) -> bool {
        matches!(self, ScoreTier::Perfect | ScoreTier::Good)
    }
}

/// Discrete events emitted by the simulation for the host to relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoundEvent {
    /// A carried block was dropped
    BlockReleased { x: f64 },
    /// A block settled on the tower
    BlockLanded {
        score: u64,
        combo: u32,
        alignment: f64,
        tier: ScoreTier,
    },
    /// A falling block left the playfield
    BlockLost { lives_left: u8 },
    /// A falling block reached the tower top without touching it
    BlockMissed,
    /// Tower height reached a multiple of the milestone interval
    HeightMilestone { n: u32 },
    /// Instability crossed the threshold
    TowerCollapsed,
    Victory,
    GameOver { reason: GameOverReason },
}

/// Score, lives and progression for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub score: u64,
    /// Consecutive good-or-better landings
    pub combo: u32,
    pub best_combo: u32,
    pub lives: u8,
    pub height: u32,
    pub difficulty: Difficulty,
    pub perfect_count: u32,
    /// True once any block has been released this round
    pub first_drop_made: bool,
}

impl RoundState {
    pub fn new(lives: u8, difficulty: Difficulty) -> Self {
        Self {
            score: 0,
            combo: 0,
            best_combo: 0,
            lives,
            height: 0,
            difficulty,
            perfect_count: 0,
            first_drop_made: false,
        }
    }
}

/// Complete fixed-step state of a round
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    pub phase: GamePhase,
    pub round: RoundState,
    pub tower: Tower,
    pub crane: CraneMotion,
    /// Block hanging from the crane or falling
    pub active: Option<PhysicsBody>,
    pub playfield: Playfield,
    pub physics: PhysicsParams,
    pub rng: Pcg32,
    /// Logical steps run this round
    pub time_ticks: u64,
    /// Crane x and active body position before the last step (for interpolation)
    pub prev_crane_x: f64,
    pub prev_active_pos: Option<glam::DVec2>,
    next_id: u32,
}

impl GameState {
    /// Fresh round in the `Menu` phase
    pub fn new(settings: Settings) -> Self {
        let playfield = Playfield {
            width: settings.physics.playfield_width,
            ground_y: settings.physics.ground_y,
        };
        let crane = CraneMotion::new(&settings.crane, &playfield, settings.difficulty);
        Self {
            phase: GamePhase::Menu,
            round: RoundState::new(settings.lives, settings.difficulty),
            tower: Tower::new(settings.stability),
            prev_crane_x: crane.state().x,
            crane,
            active: None,
            playfield,
            physics: PhysicsParams::from(&settings.physics),
            rng: Pcg32::seed_from_u64(settings.seed),
            time_ticks: 0,
            prev_active_pos: None,
            next_id: 1,
            settings,
        }
    }

    /// Allocate a new block ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The block currently hanging from the crane
    pub fn carried(&self) -> Option<&PhysicsBody> {
        self.active
            .as_ref()
            .filter(|b| b.phase == super::body::BodyPhase::Carried)
    }

    /// The block currently falling
    pub fn falling(&self) -> Option<&PhysicsBody> {
        self.active
            .as_ref()
            .filter(|b| b.phase == super::body::BodyPhase::Falling)
    }

    /// Spawn the next carried block under the crane
    pub fn spawn_block(&mut self) {
        let spec = roll_block(&self.settings.spawn, self.round.height, &mut self.rng);
        let id = self.next_entity_id();
        let body = spawn_carried(id, spec, self.crane.hook());
        log::debug!(
            "Spawned block {} ({:?}, {:.0} wide) at height {}",
            id,
            body.category,
            body.width(),
            self.round.height
        );
        self.prev_active_pos = Some(body.pos);
        self.active = Some(body);
        self.crane.begin_grab();
    }
}
