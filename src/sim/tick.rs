//! Fixed timestep simulation step
//!
//! Advances one round by exactly one logical step: crane motion, the carried
//! or falling block, landing resolution, scoring and the end-of-round checks.

use glam::DVec2;

use super::body::BodyPhase;
use super::collision::{Contact, Surface, detect_landing, resolve_landing};
use super::state::{GameOverReason, GamePhase, GameState, RoundEvent, ScoreTier};
use crate::settings::{Difficulty, ScoringSettings};

/// Tier for a landing alignment
pub fn score_tier(alignment: f64, scoring: &ScoringSettings) -> ScoreTier {
    if alignment >= scoring.perfect_threshold {
        ScoreTier::Perfect
    } else if alignment >= scoring.good_threshold {
        ScoreTier::Good
    } else {
        ScoreTier::Partial
    }
}

/// Multiplier for a streak of `combo` good-or-better landings
pub fn combo_multiplier(combo: u32, scoring: &ScoringSettings) -> f64 {
    let extra = combo.saturating_sub(1) as f64 * scoring.combo_step;
    (1.0 + extra).min(scoring.max_combo_multiplier)
}

/// Points for one landing
pub fn landing_score(
    tier: ScoreTier,
    combo: u32,
    height: u32,
    category_multiplier: f64,
    difficulty: Difficulty,
    scoring: &ScoringSettings,
) -> u64 {
    let points = match tier {
        ScoreTier::Perfect => scoring.perfect_points,
        ScoreTier::Good => scoring.good_points,
        ScoreTier::Partial => scoring.partial_points,
    } as f64;
    let scaled = points
        * combo_multiplier(combo, scoring)
        * difficulty.score_multiplier()
        * category_multiplier;
    scaled.round() as u64 + u64::from(height) * scoring.height_bonus
}

/// Drop the carried block. Returns false (and does nothing) when no block is
/// carried, the claw animation is still running, or the round is not playing.
pub fn release_block(state: &mut GameState, events: &mut Vec<RoundEvent>) -> bool {
    if state.phase != GamePhase::Playing || state.crane.is_locked() {
        return false;
    }
    let inherit = state.settings.physics.release_velocity_inherit;
    let crane_vel = state.crane.velocity();
    let Some(body) = state
        .active
        .as_mut()
        .filter(|b| b.phase == BodyPhase::Carried)
    else {
        return false;
    };

    body.release(DVec2::new(crane_vel * inherit, 0.0));
    let x = body.pos.x;
    state.crane.begin_release();
    state.round.first_drop_made = true;
    events.push(RoundEvent::BlockReleased { x });
    true
}

/// Advance the round by one fixed timestep
pub fn step(state: &mut GameState, dt: f64, events: &mut Vec<RoundEvent>) {
    if state.phase != GamePhase::Playing {
        return;
    }
    state.time_ticks += 1;

    state.prev_crane_x = state.crane.state().x;
    state.prev_active_pos = state.active.as_ref().map(|b| b.pos);

    if state.crane.tuned_height() != state.round.height {
        state.crane.retune(state.round.height, state.round.difficulty);
    }
    let ground_y = state.playfield.ground_y;
    state.crane.follow_tower(state.tower.top_y(ground_y));
    state.crane.step(dt);

    let Some(body) = state.active.as_mut() else {
        state.spawn_block();
        return;
    };

    match body.phase {
        BodyPhase::Carried => body.hang_from(state.crane.hook()),
        BodyPhase::Falling => {
            body.integrate(dt, &state.physics);

            if state.playfield.is_outside(body) {
                on_block_lost(state, events);
                return;
            }

            let surface = match state.tower.top() {
                Some(top) => Surface::Block(top),
                None => Surface::Ground { y: ground_y },
            };
            let contact = detect_landing(body, surface);
            match contact {
                Contact::None => {}
                Contact::Missed => on_block_missed(state, events),
                Contact::Landed { .. } => {
                    if let Some(alignment) = resolve_landing(body, contact) {
                        on_block_landed(state, alignment, events);
                    }
                }
            }
        }
        // Settled bodies move straight into the tower
        BodyPhase::Settled => {}
    }
}

fn end_round(state: &mut GameState, reason: GameOverReason, events: &mut Vec<RoundEvent>) {
    log::info!(
        "Game over ({:?}) at height {} with score {}",
        reason,
        state.round.height,
        state.round.score
    );
    state.phase = GamePhase::GameOver { reason };
    events.push(RoundEvent::GameOver { reason });
}

fn on_block_landed(state: &mut GameState, alignment: f64, events: &mut Vec<RoundEvent>) {
    let Some(body) = state.active.take() else {
        return;
    };
    let category = body.category;
    let stability = state.tower.push(body);
    state.round.height = state.tower.height();

    let scoring = &state.settings.scoring;
    let tier = score_tier(alignment, scoring);
    if tier.extends_combo() {
        state.round.combo += 1;
    } else {
        state.round.combo = 0;
    }
    state.round.best_combo = state.round.best_combo.max(state.round.combo);
    if tier == ScoreTier::Perfect {
        state.round.perfect_count += 1;
    }

    let score = landing_score(
        tier,
        state.round.combo,
        state.round.height,
        category.score_multiplier(),
        state.round.difficulty,
        scoring,
    );
    state.round.score += score;
    log::debug!(
        "Landed at height {}: alignment {:.3} ({:?}), +{} (combo {}), instability {:.3}",
        state.round.height,
        alignment,
        tier,
        score,
        state.round.combo,
        stability.instability
    );
    events.push(RoundEvent::BlockLanded {
        score,
        combo: state.round.combo,
        alignment,
        tier,
    });

    let height = state.round.height;
    if height % state.settings.milestone_every.max(1) == 0 {
        events.push(RoundEvent::HeightMilestone { n: height });
    }

    state.crane.retune(height, state.round.difficulty);
    state
        .crane
        .follow_tower(state.tower.top_y(state.playfield.ground_y));

    if !stability.is_stable {
        events.push(RoundEvent::TowerCollapsed);
        end_round(state, GameOverReason::TowerCollapsed, events);
        return;
    }

    if height >= state.settings.target_height {
        log::info!(
            "Victory at height {} with score {}",
            height,
            state.round.score
        );
        state.phase = GamePhase::Victory;
        events.push(RoundEvent::Victory);
        return;
    }

    state.spawn_block();
}

fn on_block_lost(state: &mut GameState, events: &mut Vec<RoundEvent>) {
    state.active = None;
    state.round.combo = 0;
    state.round.lives = state.round.lives.saturating_sub(1);
    log::debug!("Block lost, {} lives left", state.round.lives);
    events.push(RoundEvent::BlockLost {
        lives_left: state.round.lives,
    });

    if state.round.lives == 0 {
        end_round(state, GameOverReason::OutOfLives, events);
        return;
    }
    state.spawn_block();
}

fn on_block_missed(state: &mut GameState, events: &mut Vec<RoundEvent>) {
    state.active = None;
    state.round.combo = 0;
    events.push(RoundEvent::BlockMissed);
    end_round(state, GameOverReason::MissedTower, events);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::{CraneDrive, Settings};

    fn playing(settings: Settings) -> GameState {
        let mut state = GameState::new(settings);
        state.phase = GamePhase::Playing;
        state.spawn_block();
        state
    }

    fn manual() -> Settings {
        let mut settings = Settings::with_seed(7);
        settings.crane.drive = CraneDrive::Manual;
        settings
    }

    /// Step until the claw is idle
    fn wait_idle(state: &mut GameState, events: &mut Vec<RoundEvent>) {
        for _ in 0..120 {
            if !state.crane.is_locked() {
                return;
            }
            step(state, SIM_DT, events);
        }
        panic!("crane never unlocked");
    }

    /// Step until the active block is gone (landed, lost or missed) or a new one hangs
    fn drop_and_settle(state: &mut GameState, events: &mut Vec<RoundEvent>) {
        wait_idle(state, events);
        assert!(release_block(state, events));
        for _ in 0..600 {
            step(state, SIM_DT, events);
            if state.falling().is_none() {
                return;
            }
        }
        panic!("block never settled");
    }

    #[test]
    fn test_score_tiers() {
        let scoring = ScoringSettings::default();
        assert_eq!(score_tier(1.0, &scoring), ScoreTier::Perfect);
        assert_eq!(score_tier(0.85, &scoring), ScoreTier::Perfect);
        assert_eq!(score_tier(0.7, &scoring), ScoreTier::Good);
        assert_eq!(score_tier(0.3, &scoring), ScoreTier::Partial);
    }

    #[test]
    fn test_combo_multiplier_caps() {
        let scoring = ScoringSettings::default();
        assert_eq!(combo_multiplier(0, &scoring), 1.0);
        assert_eq!(combo_multiplier(1, &scoring), 1.0);
        assert!((combo_multiplier(4, &scoring) - 1.3).abs() < 1e-12);
        assert_eq!(combo_multiplier(100, &scoring), 2.0);
    }

    #[test]
    fn test_landing_score_combines_bonuses() {
        let scoring = ScoringSettings::default();
        let base = landing_score(ScoreTier::Perfect, 1, 0, 1.0, Difficulty::Normal, &scoring);
        assert_eq!(base, 100);
        let hard = landing_score(ScoreTier::Perfect, 1, 0, 1.0, Difficulty::Hard, &scoring);
        assert_eq!(hard, 150);
        let tall = landing_score(ScoreTier::Good, 3, 10, 1.0, Difficulty::Normal, &scoring);
        assert_eq!(tall, 72 + 20);
    }

    #[test]
    fn test_no_step_outside_playing() {
        let mut state = GameState::new(Settings::default());
        let mut events = Vec::new();
        step(&mut state, SIM_DT, &mut events);
        assert_eq!(state.time_ticks, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_carried_block_follows_crane() {
        let mut state = playing(Settings::default());
        let mut events = Vec::new();
        for _ in 0..30 {
            step(&mut state, SIM_DT, &mut events);
            let carried = state.carried().unwrap();
            assert_eq!(carried.pos.x, state.crane.state().x);
        }
        assert!(events.is_empty());
    }

    #[test]
    fn test_release_locked_during_grab() {
        let mut state = playing(Settings::default());
        let mut events = Vec::new();
        assert!(!release_block(&mut state, &mut events));
        wait_idle(&mut state, &mut events);
        assert!(release_block(&mut state, &mut events));
        // Nothing carried any more
        assert!(!release_block(&mut state, &mut events));
        assert!(matches!(events[..], [RoundEvent::BlockReleased { .. }]));
    }

    #[test]
    fn test_first_block_is_perfect_anywhere() {
        for target in [100.0, 240.0, 390.0] {
            let mut state = playing(manual());
            let mut events = Vec::new();
            state.crane.steer(target);
            for _ in 0..120 {
                step(&mut state, SIM_DT, &mut events);
            }
            drop_and_settle(&mut state, &mut events);

            let landed = events
                .iter()
                .find_map(|e| match e {
                    RoundEvent::BlockLanded {
                        alignment, tier, ..
                    } => Some((*alignment, *tier)),
                    _ => None,
                })
                .unwrap();
            assert_eq!(landed, (1.0, ScoreTier::Perfect));
            assert_eq!(state.round.height, 1);
            assert_eq!(state.tower.blocks()[0].bottom(), 0.0);
            // Next block already hanging
            assert!(state.carried().is_some());
        }
    }

    #[test]
    fn test_zero_milestone_interval_counts_every_level() {
        // Unvalidated settings must not bring the step down
        let mut settings = manual();
        settings.milestone_every = 0;
        assert!(settings.validate().is_err());
        let mut state = playing(settings);
        let mut events = Vec::new();
        drop_and_settle(&mut state, &mut events);
        assert_eq!(state.round.height, 1);
        assert!(events.contains(&RoundEvent::HeightMilestone { n: 1 }));
    }

    #[test]
    fn test_missed_tower_ends_round() {
        let mut state = playing(manual());
        let mut events = Vec::new();
        state.crane.steer(100.0);
        for _ in 0..120 {
            step(&mut state, SIM_DT, &mut events);
        }
        drop_and_settle(&mut state, &mut events);
        assert_eq!(state.round.height, 1);

        state.crane.steer(400.0);
        for _ in 0..120 {
            step(&mut state, SIM_DT, &mut events);
        }
        drop_and_settle(&mut state, &mut events);

        assert_eq!(
            state.phase,
            GamePhase::GameOver {
                reason: GameOverReason::MissedTower
            }
        );
        assert!(events.contains(&RoundEvent::BlockMissed));
        assert_eq!(state.round.height, 1);
        assert!(state.active.is_none());
    }

    #[test]
    fn test_lost_block_costs_a_life() {
        let mut settings = manual();
        settings.lives = 2;
        let mut state = playing(settings);
        let mut events = Vec::new();
        wait_idle(&mut state, &mut events);

        // Fling the carried block sideways out of the playfield
        release_block(&mut state, &mut events);
        if let Some(body) = state.active.as_mut() {
            body.vel.x = 5000.0;
        }
        for _ in 0..60 {
            step(&mut state, SIM_DT, &mut events);
        }
        assert!(events.contains(&RoundEvent::BlockLost { lives_left: 1 }));
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.carried().is_some());

        wait_idle(&mut state, &mut events);
        release_block(&mut state, &mut events);
        if let Some(body) = state.active.as_mut() {
            body.vel.x = -5000.0;
        }
        for _ in 0..60 {
            step(&mut state, SIM_DT, &mut events);
        }
        assert_eq!(
            state.phase,
            GamePhase::GameOver {
                reason: GameOverReason::OutOfLives
            }
        );
        assert_eq!(state.round.lives, 0);
    }
}
