//! Game settings and balance tuning
//!
//! Every tunable of a round lives here so balance changes never touch the
//! simulation code. Settings are plain serde data and can be loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Settings load/validation errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl SettingsError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        SettingsError::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Crane speed multiplier
    pub fn speed_multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.3,
        }
    }

    /// Score multiplier
    pub fn score_multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
        }
    }
}

/// How the crane's horizontal position is driven
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CraneDrive {
    /// Bounded pendulum swing
    #[default]
    Pendulum,
    /// Replay of a recorded x track, one sample per logical step
    Recorded { samples: Vec<f64>, looped: bool },
    /// Host steers the crane toward a target x
    Manual,
}

/// Fixed-step clock tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Logical steps per second
    pub sim_hz: f64,
    /// Most steps a single host tick may run
    pub max_catch_up: u32,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            sim_hz: SIM_HZ,
            max_catch_up: MAX_CATCH_UP,
        }
    }
}

/// Falling-body integration tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub playfield_width: f64,
    pub ground_y: f64,
    pub gravity: f64,
    /// Horizontal velocity multiplier applied every step
    pub friction: f64,
    pub velocity_epsilon: f64,
    pub max_fall_speed: f64,
    /// Fraction of the crane's velocity a released block keeps
    pub release_velocity_inherit: f64,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            playfield_width: PLAYFIELD_WIDTH,
            ground_y: GROUND_Y,
            gravity: GRAVITY,
            friction: FRICTION,
            velocity_epsilon: VELOCITY_EPSILON,
            max_fall_speed: MAX_FALL_SPEED,
            release_velocity_inherit: 0.5,
        }
    }
}

/// Crane swing and progression tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraneSettings {
    /// Base horizontal speed at height 0 (units/s)
    pub base_speed: f64,
    /// Swing half-range at height 0
    pub half_range: f64,
    /// Half-range never shrinks below this
    pub min_half_range: f64,
    /// Half-range lost per shrink step
    pub range_shrink: f64,
    /// Levels per shrink step
    pub range_shrink_every: u32,
    /// Speed gained per speed step (fraction of base)
    pub speed_step: f64,
    /// Levels per speed step
    pub speed_step_every: u32,
    /// Hesitation at each turning point (s)
    pub turn_pause: f64,
    /// Floor for the sinusoidal velocity profile so the crane leaves the extremes
    pub min_profile: f64,
    /// Extra speed near center, less near the extremes
    pub center_boost: f64,
    /// Crane height above the tower top
    pub clearance: f64,
    /// Distance from crane hook to the top of the carried block
    pub rope_length: f64,
    pub release_anim: f64,
    pub grab_anim: f64,
    pub drive: CraneDrive,
}

impl Default for CraneSettings {
    fn default() -> Self {
        Self {
            base_speed: 180.0,
            half_range: 260.0,
            min_half_range: 60.0,
            range_shrink: 10.0,
            range_shrink_every: 5,
            speed_step: 0.3,
            speed_step_every: 10,
            turn_pause: 0.15,
            min_profile: 0.2,
            center_boost: 0.5,
            clearance: 220.0,
            rope_length: 60.0,
            release_anim: 0.2,
            grab_anim: 0.3,
            drive: CraneDrive::Pendulum,
        }
    }
}

/// Tower stability tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilitySettings {
    /// Tower stands while instability is below this
    pub threshold: f64,
    /// Tilt that saturates the tilt term (degrees)
    pub max_tilt_degrees: f64,
    /// Share of normalized tilt added to instability
    pub tilt_weight: f64,
    /// Extra weight given to higher pairs
    pub height_weight: f64,
}

impl Default for StabilitySettings {
    fn default() -> Self {
        Self {
            threshold: STABILITY_THRESHOLD,
            max_tilt_degrees: MAX_TILT.to_degrees(),
            tilt_weight: 0.3,
            height_weight: 0.5,
        }
    }
}

impl StabilitySettings {
    pub fn max_tilt(&self) -> f64 {
        self.max_tilt_degrees.to_radians()
    }
}

/// Landing score tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub perfect_threshold: f64,
    pub good_threshold: f64,
    pub perfect_points: u64,
    pub good_points: u64,
    pub partial_points: u64,
    pub combo_step: f64,
    pub max_combo_multiplier: f64,
    /// Flat bonus per tower level
    pub height_bonus: u64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            perfect_threshold: 0.85,
            good_threshold: 0.65,
            perfect_points: 100,
            good_points: 60,
            partial_points: 25,
            combo_step: 0.1,
            max_combo_multiplier: 2.0,
            height_bonus: 2,
        }
    }
}

/// Width range for blocks spawned below `max_height`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnTier {
    /// Tier applies while tower height is below this (None = open ended)
    pub max_height: Option<u32>,
    pub min_width: f64,
    pub max_width: f64,
}

/// Block spawning tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    pub block_height: f64,
    /// Ordered by `max_height`, last tier open ended
    pub tiers: Vec<SpawnTier>,
    /// Chance (percent) of a Wide block
    pub wide_chance: u32,
    /// Chance (percent) of a Narrow block
    pub narrow_chance: u32,
    /// Chance (percent) of a Bonus block
    pub bonus_chance: u32,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            block_height: BLOCK_HEIGHT,
            tiers: vec![
                SpawnTier {
                    max_height: Some(10),
                    min_width: 110.0,
                    max_width: 140.0,
                },
                SpawnTier {
                    max_height: Some(25),
                    min_width: 90.0,
                    max_width: 120.0,
                },
                SpawnTier {
                    max_height: None,
                    min_width: 70.0,
                    max_width: 100.0,
                },
            ],
            wide_chance: 15,
            narrow_chance: 15,
            bonus_chance: 5,
        }
    }
}

/// Complete round configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed (block sizes and categories only)
    pub seed: u64,
    pub difficulty: Difficulty,
    pub lives: u8,
    /// Height that wins the round
    pub target_height: u32,
    /// Emit a milestone event every this many levels
    pub milestone_every: u32,

    pub clock: ClockSettings,
    pub physics: PhysicsSettings,
    pub crane: CraneSettings,
    pub stability: StabilitySettings,
    pub scoring: ScoringSettings,
    pub spawn: SpawnSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            difficulty: Difficulty::Normal,
            lives: 3,
            target_height: 50,
            milestone_every: 10,
            clock: ClockSettings::default(),
            physics: PhysicsSettings::default(),
            crane: CraneSettings::default(),
            stability: StabilitySettings::default(),
            scoring: ScoringSettings::default(),
            spawn: SpawnSettings::default(),
        }
    }
}

impl Settings {
    /// Default settings with the given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse and validate settings from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fixed logical timestep in seconds
    pub fn step_dt(&self) -> f64 {
        1.0 / self.clock.sim_hz
    }

    /// Check that every value keeps the simulation well-formed
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.clock.sim_hz.is_finite() && self.clock.sim_hz > 0.0) {
            return Err(SettingsError::invalid(
                "clock.sim_hz",
                format!("{} (must be > 0)", self.clock.sim_hz),
            ));
        }
        if self.clock.max_catch_up == 0 {
            return Err(SettingsError::invalid("clock.max_catch_up", "must be >= 1"));
        }

        let p = &self.physics;
        if p.playfield_width <= 0.0 {
            return Err(SettingsError::invalid(
                "physics.playfield_width",
                format!("{} (must be > 0)", p.playfield_width),
            ));
        }
        if p.gravity >= 0.0 {
            return Err(SettingsError::invalid(
                "physics.gravity",
                format!("{} (world is y-up, must be < 0)", p.gravity),
            ));
        }
        if !(p.friction > 0.0 && p.friction <= 1.0) {
            return Err(SettingsError::invalid(
                "physics.friction",
                format!("{} (must be in (0, 1])", p.friction),
            ));
        }
        if p.velocity_epsilon < 0.0 || p.max_fall_speed <= 0.0 {
            return Err(SettingsError::invalid(
                "physics.velocity_epsilon",
                "epsilon must be >= 0 and max_fall_speed > 0",
            ));
        }

        let c = &self.crane;
        if c.base_speed <= 0.0 {
            return Err(SettingsError::invalid("crane.base_speed", "must be > 0"));
        }
        if c.min_half_range <= 0.0 || c.min_half_range > c.half_range {
            return Err(SettingsError::invalid(
                "crane.min_half_range",
                format!(
                    "{} (must be in (0, half_range = {}])",
                    c.min_half_range, c.half_range
                ),
            ));
        }
        if c.range_shrink_every == 0 || c.speed_step_every == 0 {
            return Err(SettingsError::invalid(
                "crane.range_shrink_every",
                "level intervals must be >= 1",
            ));
        }
        if !(0.0..=1.0).contains(&c.min_profile) || c.min_profile == 0.0 {
            return Err(SettingsError::invalid(
                "crane.min_profile",
                format!("{} (must be in (0, 1])", c.min_profile),
            ));
        }

        let s = &self.stability;
        if !(s.threshold > 0.0 && s.threshold <= 1.0) {
            return Err(SettingsError::invalid(
                "stability.threshold",
                format!("{} (must be in (0, 1])", s.threshold),
            ));
        }
        if s.max_tilt_degrees <= 0.0 {
            return Err(SettingsError::invalid(
                "stability.max_tilt_degrees",
                "must be > 0",
            ));
        }

        if self.scoring.good_threshold > self.scoring.perfect_threshold {
            return Err(SettingsError::invalid(
                "scoring.good_threshold",
                "must not exceed perfect_threshold",
            ));
        }

        if self.spawn.block_height <= 0.0 {
            return Err(SettingsError::invalid("spawn.block_height", "must be > 0"));
        }
        if self.spawn.tiers.is_empty() {
            return Err(SettingsError::invalid("spawn.tiers", "at least one tier"));
        }
        for tier in &self.spawn.tiers {
            if tier.min_width <= 0.0 || tier.max_width < tier.min_width {
                return Err(SettingsError::invalid(
                    "spawn.tiers",
                    format!("bad width range {}..={}", tier.min_width, tier.max_width),
                ));
            }
        }

        if self.lives == 0 {
            return Err(SettingsError::invalid("lives", "must be >= 1"));
        }
        if self.target_height == 0 || self.milestone_every == 0 {
            return Err(SettingsError::invalid(
                "target_height",
                "target height and milestone interval must be >= 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{ "seed": 7, "difficulty": "Hard" }"#).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.crane, CraneSettings::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut settings = Settings::with_seed(42);
        settings.crane.drive = CraneDrive::Recorded {
            samples: vec![100.0, 120.0],
            looped: true,
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_rejects_upward_gravity() {
        let err = Settings::from_json(r#"{ "physics": { "gravity": 9.8 } }"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidValue {
                field: "physics.gravity",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            Settings::from_json("{ nope"),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_zero_step_rate() {
        let mut settings = Settings::default();
        settings.clock.sim_hz = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_str("nightmare"), None);
        assert_eq!(Difficulty::Normal.speed_multiplier(), 1.0);
    }
}
