//! Physics bodies: the blocks carried, dropped and stacked
//!
//! Positions are block centers in a y-up world. Only `Falling` bodies are
//! integrated; `Carried` bodies follow the crane and `Settled` bodies never move.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::PhysicsSettings;

/// Lifecycle of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyPhase {
    /// Hanging from the crane
    Carried,
    /// Released, under gravity
    Falling,
    /// Part of the tower (or resting on the ground)
    Settled,
}

/// Block category. Affects only size and score, never physics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockCategory {
    #[default]
    Standard,
    Wide,
    Narrow,
    Bonus,
}

impl BlockCategory {
    /// Width multiplier applied to the tier's rolled width
    pub fn width_scale(&self) -> f64 {
        match self {
            BlockCategory::Standard | BlockCategory::Bonus => 1.0,
            BlockCategory::Wide => 1.25,
            BlockCategory::Narrow => 0.75,
        }
    }

    /// Score multiplier for landing this block
    pub fn score_multiplier(&self) -> f64 {
        match self {
            BlockCategory::Standard => 1.0,
            BlockCategory::Wide => 0.9,
            BlockCategory::Narrow => 1.3,
            BlockCategory::Bonus => 2.0,
        }
    }
}

/// Integration constants for falling bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    pub gravity: f64,
    pub friction: f64,
    pub velocity_epsilon: f64,
    pub max_fall_speed: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            friction: FRICTION,
            velocity_epsilon: VELOCITY_EPSILON,
            max_fall_speed: MAX_FALL_SPEED,
        }
    }
}

impl From<&PhysicsSettings> for PhysicsParams {
    fn from(s: &PhysicsSettings) -> Self {
        Self {
            gravity: s.gravity,
            friction: s.friction,
            velocity_epsilon: s.velocity_epsilon,
            max_fall_speed: s.max_fall_speed,
        }
    }
}

/// Playfield bounds: `[0, width]` horizontally, nothing below `ground_y`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f64,
    pub ground_y: f64,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            ground_y: GROUND_Y,
        }
    }
}

impl Playfield {
    pub fn center_x(&self) -> f64 {
        self.width / 2.0
    }

    /// True once the body's center has left the lot. A block hanging past
    /// either wall cannot come to rest on it.
    pub fn is_outside(&self, body: &PhysicsBody) -> bool {
        body.pos.x < 0.0 || body.pos.x > self.width || body.pos.y < self.ground_y
    }
}

/// A rectangular block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    pub id: u32,
    /// Center position
    pub pos: DVec2,
    /// Full width and height
    pub size: DVec2,
    pub vel: DVec2,
    pub phase: BodyPhase,
    pub category: BlockCategory,
}

impl PhysicsBody {
    /// A new block hanging from the crane
    pub fn carried(id: u32, pos: DVec2, size: DVec2, category: BlockCategory) -> Self {
        Self {
            id,
            pos,
            size,
            vel: DVec2::ZERO,
            phase: BodyPhase::Carried,
            category,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.size.y
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.pos.x - self.size.x / 2.0
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.pos.x + self.size.x / 2.0
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.pos.y + self.size.y / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.pos.y - self.size.y / 2.0
    }

    pub fn is_settled(&self) -> bool {
        self.phase == BodyPhase::Settled
    }

    /// Move a carried body so its top edge hangs at `hook`
    pub fn hang_from(&mut self, hook: DVec2) {
        if self.phase == BodyPhase::Carried {
            self.pos = DVec2::new(hook.x, hook.y - self.size.y / 2.0);
        }
    }

    /// Let go of a carried body with an initial velocity
    pub fn release(&mut self, vel: DVec2) -> bool {
        if self.phase != BodyPhase::Carried {
            return false;
        }
        self.vel = vel;
        self.phase = BodyPhase::Falling;
        true
    }

    /// Rest the body's lower edge exactly on `surface_y` and stop it
    pub fn settle_on(&mut self, surface_y: f64) {
        self.pos.y = surface_y + self.size.y / 2.0;
        self.vel = DVec2::ZERO;
        self.phase = BodyPhase::Settled;
    }

    /// One semi-implicit Euler step: velocity first, then position with the new velocity
    pub fn integrate(&mut self, dt: f64, params: &PhysicsParams) {
        if self.phase != BodyPhase::Falling {
            return;
        }

        self.vel.y += params.gravity * dt;
        self.vel.y = self.vel.y.max(-params.max_fall_speed);
        self.vel.x *= params.friction;

        if self.vel.x.abs() < params.velocity_epsilon {
            self.vel.x = 0.0;
        }
        if self.vel.y.abs() < params.velocity_epsilon {
            self.vel.y = 0.0;
        }

        self.pos += self.vel * dt;
    }
}
