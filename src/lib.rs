//! Tower Stack - crane-and-tower stacking arcade simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, physics, crane, tower, round state machine)
//! - `settings`: Data-driven game balance and difficulty presets
//! - `highscores`: Leaderboard fed by finished rounds
//!
//! Rendering, input routing, audio and persistence belong to the host. The host
//! drives [`sim::GameRound::tick`] from its frame loop and relays the returned
//! [`sim::RoundEvent`]s.

pub mod highscores;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::{CraneDrive, Difficulty, Settings, SettingsError};
pub use sim::{GameRound, RoundEvent, Snapshot, TickOutput};

/// Game configuration constants
pub mod consts {
    /// Logical simulation rate (60 Hz)
    pub const SIM_HZ: f64 = 60.0;
    /// Fixed simulation timestep
    pub const SIM_DT: f64 = 1.0 / SIM_HZ;
    /// Maximum logical steps per host tick to prevent spiral of death
    pub const MAX_CATCH_UP: u32 = 12;

    /// Playfield width in world units
    pub const PLAYFIELD_WIDTH: f64 = 480.0;
    /// Ground level (world is y-up)
    pub const GROUND_Y: f64 = 0.0;

    /// Gravity (negative = down)
    pub const GRAVITY: f64 = -980.0;
    /// Horizontal velocity kept per step while falling
    pub const FRICTION: f64 = 0.985;
    /// Velocities below this snap to zero
    pub const VELOCITY_EPSILON: f64 = 0.5;
    /// Terminal fall speed
    pub const MAX_FALL_SPEED: f64 = 1400.0;

    /// Block defaults
    pub const BLOCK_HEIGHT: f64 = 40.0;
    pub const BLOCK_WIDTH: f64 = 120.0;

    /// Tower never stands once instability reaches this
    pub const STABILITY_THRESHOLD: f64 = 0.6;
    /// Tilt that counts as fully unstable (30 degrees)
    pub const MAX_TILT: f64 = std::f64::consts::PI / 6.0;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Clamp to the unit interval, mapping NaN to zero
#[inline]
pub fn unit_clamp(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
