//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (block sizes and categories)
//! - No rendering or platform dependencies

pub mod body;
pub mod clock;
pub mod collision;
pub mod crane;
pub mod round;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod tower;

pub use body::{BlockCategory, BodyPhase, PhysicsBody, PhysicsParams, Playfield};
pub use clock::{ClockAdvance, SimulationClock};
pub use collision::{Contact, Surface, alignment, detect_landing, horizontal_overlap, resolve_landing};
pub use crane::{CraneAnim, CraneMotion, CraneState, CraneStrategy};
pub use round::{BlockView, GameRound, Snapshot, TickOutput};
pub use spawn::{BlockSpec, roll_block};
pub use state::{GameOverReason, GamePhase, GameState, RoundEvent, RoundState, ScoreTier};
pub use tick::{landing_score, release_block, score_tier, step};
pub use tower::{Stability, Tower, stability_of};
