//! Two-speed simulated loading progress.
//!
//! While media is loading the bar creeps forward by small random steps and
//! stalls at the ceiling; once media is ready it finishes in large steps.
//! The value never decreases and lands exactly on 100.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ConfigResult, ProgressPolicy, StepRange};

pub const COMPLETE: f64 = 100.0;

/// Result of one simulator tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressTick {
    /// Progress moved (or held at the ceiling) and is still below 100.
    Advanced(f64),
    /// Progress reached 100 on this tick. Reported exactly once.
    Completed,
    /// The simulator already completed; the tick was a no-op.
    Finished,
}

pub struct ProgressSimulator<R: Rng = StdRng> {
    policy: ProgressPolicy,
    progress: f64,
    completed: bool,
    ticks: u64,
    rng: R,
}

impl ProgressSimulator<StdRng> {
    pub fn new(policy: ProgressPolicy) -> ConfigResult<Self> {
        Self::with_rng(policy, StdRng::from_os_rng())
    }

    pub fn seeded(policy: ProgressPolicy, seed: u64) -> ConfigResult<Self> {
        Self::with_rng(policy, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ProgressSimulator<R> {
    /// Rejects empty step ranges and ceilings outside `(0, 100)`, which
    /// would otherwise fail on the first sample.
    pub fn with_rng(policy: ProgressPolicy, rng: R) -> ConfigResult<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            progress: 0.0,
            completed: false,
            ticks: 0,
            rng,
        })
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance one tick, reading the current media readiness.
    pub fn tick(&mut self, media_ready: bool) -> ProgressTick {
        if self.completed {
            return ProgressTick::Finished;
        }
        self.ticks += 1;

        if media_ready {
            self.progress += self.sample(self.policy.fast_step);
        } else if self.progress < self.policy.stall_ceiling {
            let next = self.progress + self.sample(self.policy.slow_step);
            self.progress = next.min(self.policy.stall_ceiling);
        }

        if self.progress > COMPLETE {
            self.progress = COMPLETE;
        }

        if self.progress == COMPLETE {
            self.completed = true;
            ProgressTick::Completed
        } else {
            ProgressTick::Advanced(self.progress)
        }
    }

    fn sample(&mut self, range: StepRange) -> f64 {
        self.rng.random_range(range.min..range.max)
    }
}

/// CSS width value for the progress fill, e.g. `42.37%` or `100%`.
pub fn fill_width(progress: f64) -> String {
    let rounded = (progress * 100.0).round() / 100.0;
    format!("{rounded}%")
}
