//! The tower of settled blocks and its stability model
//!
//! Instability is re-derived from the full block sequence after every append:
//! a weighted average of adjacent-pair misalignment (higher pairs weigh more)
//! plus a share of the normalized tilt. It is a pure function of the blocks.

use serde::{Deserialize, Serialize};

use super::body::PhysicsBody;
use super::collision::alignment;
use crate::settings::StabilitySettings;
use crate::unit_clamp;

/// Derived stability of a block sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stability {
    /// Cumulative misalignment and tilt, in [0, 1]
    pub instability: f64,
    /// Lean of the tower in radians (positive = leaning right)
    pub tilt: f64,
    /// Instability below the threshold
    pub is_stable: bool,
}

impl Stability {
    /// Stability of an empty or single-block tower
    pub fn settled() -> Self {
        Self {
            instability: 0.0,
            tilt: 0.0,
            is_stable: true,
        }
    }
}

/// Small-angle tilt between the bottom and top block centers
pub fn tilt_of(blocks: &[PhysicsBody]) -> f64 {
    let (Some(bottom), Some(top)) = (blocks.first(), blocks.last()) else {
        return 0.0;
    };
    let span = top.pos.y - bottom.pos.y;
    if blocks.len() < 2 || span <= 0.0 {
        return 0.0;
    }
    (top.pos.x - bottom.pos.x) / span
}

/// Weighted misalignment of adjacent pairs, later pairs weighted by
/// `1 + i / n * height_weight`
pub fn weighted_misalignment(blocks: &[PhysicsBody], height_weight: f64) -> f64 {
    let n = blocks.len();
    if n < 2 {
        return 0.0;
    }

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for (i, pair) in blocks.windows(2).enumerate() {
        let index = (i + 1) as f64;
        let weight = 1.0 + index / n as f64 * height_weight;
        weighted += (1.0 - alignment(&pair[1], &pair[0])) * weight;
        total_weight += weight;
    }
    weighted / total_weight
}

/// Full stability of a block sequence (bottom to top)
pub fn stability_of(blocks: &[PhysicsBody], params: &StabilitySettings) -> Stability {
    if blocks.len() < 2 {
        return Stability::settled();
    }

    let tilt = tilt_of(blocks);
    let tilt_term = (tilt.abs() / params.max_tilt()).min(1.0) * params.tilt_weight;
    let instability = unit_clamp(weighted_misalignment(blocks, params.height_weight) + tilt_term);

    Stability {
        instability,
        tilt,
        is_stable: instability < params.threshold,
    }
}

/// Ordered stack of settled blocks, bottom first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    blocks: Vec<PhysicsBody>,
    stability: Stability,
    params: StabilitySettings,
}

impl Default for Tower {
    fn default() -> Self {
        Self::new(StabilitySettings::default())
    }
}

impl Tower {
    pub fn new(params: StabilitySettings) -> Self {
        Self {
            blocks: Vec::new(),
            stability: Stability::settled(),
            params,
        }
    }

    /// Number of blocks stacked
    pub fn height(&self) -> u32 {
        self.blocks.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[PhysicsBody] {
        &self.blocks
    }

    pub fn top(&self) -> Option<&PhysicsBody> {
        self.blocks.last()
    }

    /// Height of the tower's top surface, or `ground_y` when empty
    pub fn top_y(&self, ground_y: f64) -> f64 {
        self.top().map_or(ground_y, |b| b.top())
    }

    pub fn stability(&self) -> Stability {
        self.stability
    }

    pub fn instability(&self) -> f64 {
        self.stability.instability
    }

    pub fn tilt(&self) -> f64 {
        self.stability.tilt
    }

    pub fn is_stable(&self) -> bool {
        self.stability.is_stable
    }

    /// Append a settled block and recompute stability from scratch
    pub fn push(&mut self, body: PhysicsBody) -> Stability {
        debug_assert!(body.is_settled(), "only settled bodies join the tower");
        self.blocks.push(body);
        self.stability = stability_of(&self.blocks, &self.params);
        self.stability
    }
}
