//! Tower Stack headless runner
//!
//! Plays one round with a simple autopilot (drop when the crane is over the
//! tower top) and logs every event. Usage: `tower-stack [seed] [settings.json]`.

use anyhow::{Context, Result};

use tower_stack::sim::{GameRound, RoundEvent};
use tower_stack::{HighScores, Settings};

/// Host frame time (a 60 Hz display)
const FRAME_DT: f64 = 1.0 / 60.0;
/// Give up after this many frames (10 minutes of play)
const MAX_FRAMES: u32 = 60 * 60 * 10;
/// How close the crane must be to the tower center before the autopilot drops
const DROP_TOLERANCE: f64 = 4.0;

fn load_settings() -> Result<Settings> {
    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .map(|s| s.parse::<u64>().with_context(|| format!("invalid seed '{}'", s)))
        .transpose()?;

    let mut settings = match args.next() {
        Some(path) => Settings::load(&path)
            .with_context(|| format!("failed to load settings from {}", path))?,
        None => Settings::default(),
    };
    if let Some(seed) = seed {
        settings.seed = seed;
    }
    Ok(settings)
}

/// Drop when the carried block is centered over the tower top (or the lot)
fn autopilot(round: &mut GameRound) {
    let snapshot = round.snapshot();
    let Some(carried) = snapshot.carried_block else {
        return;
    };
    let target = snapshot
        .tower_blocks
        .last()
        .map_or(round.state().playfield.center_x(), |top| top.x);
    if (carried.x - target).abs() <= DROP_TOLERANCE {
        round.release_block();
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let settings = load_settings()?;
    log::info!(
        "Tower Stack (headless) seed {} difficulty {}",
        settings.seed,
        settings.difficulty.as_str()
    );

    let mut round = GameRound::new(settings);
    round.start();

    let mut frames = 0;
    while !round.phase().is_terminal() && frames < MAX_FRAMES {
        autopilot(&mut round);
        let out = round.tick(FRAME_DT);
        for event in &out.events {
            match event {
                RoundEvent::BlockLanded {
                    score,
                    combo,
                    alignment,
                    tier,
                } => log::info!(
                    "Landed {:?} ({:.0}%) +{} combo x{}",
                    tier,
                    alignment * 100.0,
                    score,
                    combo
                ),
                RoundEvent::HeightMilestone { n } => log::info!("Height {}!", n),
                other => log::info!("{:?}", other),
            }
        }
        frames += 1;
    }

    let snapshot = round.snapshot();
    println!(
        "{:?}: height {}, score {}, instability {:.3}, {} frames",
        snapshot.phase, snapshot.height, snapshot.score, snapshot.instability, frames
    );
    println!(
        "Best combo x{}, {} perfect drops",
        snapshot.best_combo, snapshot.perfect_count
    );

    let mut scores = HighScores::new();
    if let Some(rank) = scores.record_round(&round, 0.0) {
        println!("High score rank #{}", rank);
    }
    println!("{}", scores.to_json()?);
    Ok(())
}
