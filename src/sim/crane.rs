//! Crane motion
//!
//! The crane swings across a bounded range above the tower. The default
//! pendulum drive moves fastest at center, eases toward the extremes and
//! hesitates at each turning point. Range shrinks and speed grows with tower
//! height; that is the main difficulty curve. Recorded and manual drives
//! replace the pendulum without touching the rest of the round.

use std::f64::consts::PI;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::body::Playfield;
use crate::settings::{CraneDrive, CraneSettings, Difficulty};

/// Presentation-only animation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CraneAnim {
    #[default]
    Idle,
    /// Claw opening after a drop
    Releasing,
    /// Claw picking up the next block
    Grabbing,
}

/// Runtime state of the active drive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CraneStrategy {
    Pendulum,
    Recorded {
        samples: Vec<f64>,
        looped: bool,
        cursor: usize,
    },
    Manual {
        target: f64,
    },
}

impl CraneStrategy {
    fn from_drive(drive: &CraneDrive, start_x: f64) -> Self {
        match drive {
            CraneDrive::Pendulum => CraneStrategy::Pendulum,
            CraneDrive::Recorded { samples, looped } => CraneStrategy::Recorded {
                samples: samples.clone(),
                looped: *looped,
                cursor: 0,
            },
            CraneDrive::Manual => CraneStrategy::Manual { target: start_x },
        }
    }
}

/// Everything the crane knows about itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraneState {
    pub x: f64,
    /// Crane height (world y), follows the tower top
    pub y: f64,
    /// Current base speed after height and difficulty scaling
    pub base_speed: f64,
    /// Current swing half-range
    pub half_range: f64,
    /// Swing center
    pub center: f64,
    /// +1 moving right, -1 moving left
    pub direction: f64,
    /// Remaining hesitation at a turning point
    pub pause_timer: f64,
    /// Horizontal velocity over the last step
    pub velocity: f64,
    pub anim: CraneAnim,
    pub anim_timer: f64,
}

impl CraneState {
    pub fn min_x(&self) -> f64 {
        self.center - self.half_range
    }

    pub fn max_x(&self) -> f64 {
        self.center + self.half_range
    }
}

/// Owns the crane state and advances it one logical step at a time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraneMotion {
    state: CraneState,
    strategy: CraneStrategy,
    params: CraneSettings,
    speed_multiplier: f64,
    /// Tower height the current speed/range were derived from
    tuned_height: u32,
}

impl CraneMotion {
    pub fn new(params: &CraneSettings, playfield: &Playfield, difficulty: Difficulty) -> Self {
        let center = playfield.center_x();
        let state = CraneState {
            x: center,
            y: playfield.ground_y + params.clearance,
            base_speed: params.base_speed * difficulty.speed_multiplier(),
            half_range: params.half_range,
            center,
            direction: 1.0,
            pause_timer: 0.0,
            velocity: 0.0,
            anim: CraneAnim::Idle,
            anim_timer: 0.0,
        };
        Self {
            strategy: CraneStrategy::from_drive(&params.drive, center),
            params: params.clone(),
            speed_multiplier: difficulty.speed_multiplier(),
            tuned_height: 0,
            state,
        }
    }

    pub fn state(&self) -> &CraneState {
        &self.state
    }

    /// Where the carried block's top edge hangs
    pub fn hook(&self) -> DVec2 {
        DVec2::new(self.state.x, self.state.y - self.params.rope_length)
    }

    /// Horizontal velocity over the last step
    pub fn velocity(&self) -> f64 {
        self.state.velocity
    }

    /// Drop is allowed only while the claw is idle
    pub fn is_locked(&self) -> bool {
        self.state.anim != CraneAnim::Idle
    }

    /// Base speed for a tower of `height` levels
    pub fn speed_for_height(&self, height: u32) -> f64 {
        let steps = (height / self.params.speed_step_every.max(1)) as f64;
        self.params.base_speed * (1.0 + self.params.speed_step * steps) * self.speed_multiplier
    }

    /// Swing half-range for a tower of `height` levels
    pub fn range_for_height(&self, height: u32) -> f64 {
        let steps = (height / self.params.range_shrink_every.max(1)) as f64;
        (self.params.half_range - self.params.range_shrink * steps).max(self.params.min_half_range)
    }

    /// Recompute speed and range for a new tower height and difficulty.
    ///
    /// If the range shrank past the crane, the crane is clamped onto the new
    /// bound and turned back inward.
    pub fn retune(&mut self, height: u32, difficulty: Difficulty) {
        self.speed_multiplier = difficulty.speed_multiplier();
        let speed = self.speed_for_height(height);
        let range = self.range_for_height(height);

        if speed != self.state.base_speed || range != self.state.half_range {
            log::debug!(
                "Crane retune at height {}: speed {:.1} -> {:.1}, range {:.1} -> {:.1}",
                height,
                self.state.base_speed,
                speed,
                self.state.half_range,
                range
            );
        }
        self.state.base_speed = speed;
        self.state.half_range = range;
        self.tuned_height = height;

        let (min_x, max_x) = (self.state.min_x(), self.state.max_x());
        if self.state.x > max_x {
            self.state.x = max_x;
            self.state.direction = -1.0;
        } else if self.state.x < min_x {
            self.state.x = min_x;
            self.state.direction = 1.0;
        }
    }

    pub fn tuned_height(&self) -> u32 {
        self.tuned_height
    }

    /// Keep the crane `clearance` above the tower top
    pub fn follow_tower(&mut self, tower_top_y: f64) {
        self.state.y = tower_top_y + self.params.clearance;
    }

    /// Set the steering target; ignored unless the drive is manual
    pub fn steer(&mut self, target_x: f64) -> bool {
        match &mut self.strategy {
            CraneStrategy::Manual { target } => {
                *target = target_x;
                true
            }
            _ => false,
        }
    }

    /// Claw opens after a drop
    pub fn begin_release(&mut self) {
        self.state.anim = CraneAnim::Releasing;
        self.state.anim_timer = self.params.release_anim;
    }

    /// Claw picks up a freshly spawned block
    pub fn begin_grab(&mut self) {
        self.state.anim = CraneAnim::Grabbing;
        self.state.anim_timer = self.params.grab_anim;
    }

    /// Advance one logical step
    pub fn step(&mut self, dt: f64) {
        self.step_anim(dt);

        let old_x = self.state.x;
        match &mut self.strategy {
            CraneStrategy::Pendulum => {
                pendulum_step(&mut self.state, &self.params, dt);
            }
            CraneStrategy::Recorded {
                samples,
                looped,
                cursor,
            } => {
                if let Some(&sample) = samples.get(*cursor) {
                    self.state.x = sample.clamp(self.state.min_x(), self.state.max_x());
                    *cursor += 1;
                    if *cursor >= samples.len() {
                        *cursor = if *looped { 0 } else { samples.len() - 1 };
                    }
                }
            }
            CraneStrategy::Manual { target } => {
                let target = target.clamp(self.state.min_x(), self.state.max_x());
                let max_delta = self.state.base_speed * dt;
                let delta = (target - self.state.x).clamp(-max_delta, max_delta);
                self.state.x += delta;
            }
        }

        let moved = self.state.x - old_x;
        if !matches!(self.strategy, CraneStrategy::Pendulum) && moved != 0.0 {
            self.state.direction = moved.signum();
        }
        self.state.velocity = if dt > 0.0 { moved / dt } else { 0.0 };
    }

    fn step_anim(&mut self, dt: f64) {
        if self.state.anim == CraneAnim::Idle {
            return;
        }
        self.state.anim_timer -= dt;
        if self.state.anim_timer <= 0.0 {
            self.state.anim_timer = 0.0;
            self.state.anim = CraneAnim::Idle;
        }
    }
}

/// Sinusoidal swing across `[center - range, center + range]`
fn pendulum_step(state: &mut CraneState, params: &CraneSettings, dt: f64) {
    if state.pause_timer > 0.0 {
        state.pause_timer = (state.pause_timer - dt).max(0.0);
        return;
    }

    let (min_x, max_x) = (state.min_x(), state.max_x());
    let span = max_x - min_x;
    let rel = if span > 0.0 {
        ((state.x - min_x) / span).clamp(0.0, 1.0)
    } else {
        0.5
    };

    // Fastest at center, never fully stalled at the extremes
    let profile = (rel * PI).sin().max(params.min_profile);
    let centrality = 1.0 - (2.0 * rel - 1.0).abs();
    let accel = 1.0 - params.center_boost / 2.0 + params.center_boost * centrality;
    let speed = state.base_speed * profile * accel;

    let mut x = state.x + state.direction * speed * dt;
    if x >= max_x {
        x = max_x;
        state.direction = -1.0;
        state.pause_timer = params.turn_pause;
    } else if x <= min_x {
        x = min_x;
        state.direction = 1.0;
        state.pause_timer = params.turn_pause;
    }
    state.x = x;
}
