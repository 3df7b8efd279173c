//! Fixed timestep scheduler
//!
//! Converts variable host frame times into whole logical steps of constant
//! size. Leftover time is exposed as an interpolation fraction so the host can
//! render smoothly between steps.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_CATCH_UP, SIM_DT};

/// Result of advancing the clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockAdvance {
    /// Whole logical steps run during this advance
    pub steps: u32,
    /// Leftover time as a fraction of one step, in [0, 1)
    pub interpolation: f64,
}

/// Accumulator-based fixed-step clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    step: f64,
    max_catch_up: u32,
    accumulator: f64,
    paused: bool,
    total_steps: u64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_CATCH_UP)
    }
}

impl SimulationClock {
    /// Create a clock stepping `step` seconds at a time, running at most
    /// `max_catch_up` steps per advance
    pub fn new(step: f64, max_catch_up: u32) -> Self {
        Self {
            step,
            max_catch_up: max_catch_up.max(1),
            accumulator: 0.0,
            paused: false,
            total_steps: 0,
        }
    }

    /// Steps run since creation or the last reset
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Current fraction of a step waiting in the accumulator
    pub fn interpolation(&self) -> f64 {
        (self.accumulator / self.step).clamp(0.0, 1.0 - f64::EPSILON)
    }

    /// Freeze the accumulator; the interpolation fraction is kept
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Drop accumulated time and step count
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.total_steps = 0;
        self.paused = false;
    }

    /// Feed `elapsed` real seconds and run `update(step)` once per whole step.
    ///
    /// Negative or non-finite elapsed time counts as zero. When more than
    /// `max_catch_up` steps are owed, the surplus whole steps are discarded and
    /// only the fractional remainder carries over.
    pub fn advance(&mut self, elapsed: f64, mut update: impl FnMut(f64)) -> ClockAdvance {
        if self.paused {
            return ClockAdvance {
                steps: 0,
                interpolation: self.interpolation(),
            };
        }

        if elapsed.is_finite() && elapsed > 0.0 {
            self.accumulator += elapsed;
        }

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_catch_up {
            update(self.step);
            self.accumulator -= self.step;
            steps += 1;
        }
        self.total_steps += u64::from(steps);

        if self.accumulator >= self.step {
            let owed = (self.accumulator / self.step).floor();
            log::debug!("Clock behind by {} steps, dropping them", owed);
            self.accumulator -= owed * self.step;
        }

        ClockAdvance {
            steps,
            interpolation: self.interpolation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_whole_steps_and_fraction() {
        let mut clock = SimulationClock::new(0.1, 10);
        let mut calls = Vec::new();
        let adv = clock.advance(0.25, |dt| calls.push(dt));
        assert_eq!(adv.steps, 2);
        assert_eq!(calls, vec![0.1, 0.1]);
        assert!((adv.interpolation - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_small_deltas_accumulate() {
        let mut clock = SimulationClock::new(0.1, 10);
        let mut steps = 0;
        for _ in 0..3 {
            steps += clock.advance(0.04, |_| {}).steps;
        }
        assert_eq!(steps, 1);
        assert!((clock.interpolation() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_catch_up_cap_discards_surplus() {
        let mut clock = SimulationClock::new(0.1, 4);
        let adv = clock.advance(1.05, |_| {});
        assert_eq!(adv.steps, 4);
        assert!(adv.interpolation < 1.0);
        assert!((adv.interpolation - 0.5).abs() < 1e-6);

        // Discarded steps are not replayed later
        let adv = clock.advance(0.0, |_| {});
        assert_eq!(adv.steps, 0);
        assert_eq!(clock.total_steps(), 4);
    }

    #[test]
    fn test_pause_freezes_accumulator() {
        let mut clock = SimulationClock::new(0.1, 10);
        clock.advance(0.15, |_| {});
        let before = clock.interpolation();

        clock.pause();
        let adv = clock.advance(5.0, |_| panic!("no steps while paused"));
        assert_eq!(adv.steps, 0);
        assert_eq!(adv.interpolation, before);

        clock.resume();
        let adv = clock.advance(0.06, |_| {});
        assert_eq!(adv.steps, 1);
    }

    #[test]
    fn test_bad_elapsed_is_ignored() {
        let mut clock = SimulationClock::default();
        assert_eq!(clock.advance(-1.0, |_| {}).steps, 0);
        assert_eq!(clock.advance(f64::NAN, |_| {}).steps, 0);
        assert_eq!(clock.advance(f64::INFINITY, |_| {}).steps, 0);
        assert_eq!(clock.interpolation(), 0.0);
    }

    #[test]
    fn test_ten_frames_match_one_long_frame() {
        let mut a = SimulationClock::default();
        let mut b = SimulationClock::default();
        let mut steps_a = 0;
        for _ in 0..10 {
            steps_a += a.advance(0.016, |_| {}).steps;
        }
        let steps_b = b.advance(0.160, |_| {}).steps;
        assert_eq!(steps_a, 9);
        assert_eq!(steps_a, steps_b);
        assert_eq!(a.total_steps(), b.total_steps());
    }

    proptest! {
        #[test]
        fn prop_interpolation_in_unit_range(deltas in proptest::collection::vec(0.0f64..0.5, 1..40)) {
            let mut clock = SimulationClock::default();
            for d in deltas {
                let adv = clock.advance(d, |dt| assert_eq!(dt, SIM_DT));
                prop_assert!(adv.interpolation >= 0.0 && adv.interpolation < 1.0);
                prop_assert!(adv.steps <= MAX_CATCH_UP);
            }
        }

        #[test]
        fn prop_split_frames_match_total(frames in 1usize..30, ms in 1u32..20) {
            let dt = f64::from(ms) / 1000.0;
            let mut split = SimulationClock::new(SIM_DT, u32::MAX);
            let mut whole = SimulationClock::new(SIM_DT, u32::MAX);
            for _ in 0..frames {
                split.advance(dt, |_| {});
            }
            whole.advance(dt * frames as f64, |_| {});
            let diff = split.total_steps().abs_diff(whole.total_steps());
            // Float summation may land a hair either side of a step boundary
            prop_assert!(diff <= 1);
        }
    }
}
