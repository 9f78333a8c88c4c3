//! Sample value and delay generation.
//!
//! Values depend only on the value and limit modes; delays depend only on the
//! timing mode. The generator owns a seedable ChaCha RNG so runs can be
//! reproduced, and a free-running step counter for the deterministic sawtooth.

use crate::config::SensorConfig;
use crate::sensor::modes::{LimitMode, TimingMode, ValueMode};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Half-width of the symmetric range used by `LimitMode::Unbounded`.
pub const UNBOUNDED_MAGNITUDE: f64 = 2_147_483_647.0;

/// Steps per sawtooth ramp in deterministic mode.
pub const SAWTOOTH_STEPS: u64 = 20;

/// Produces one value and one delay per tick.
pub struct SampleGenerator {
    rng: ChaCha8Rng,
    step: u64,
}

impl SampleGenerator {
    /// Create a generator. Without a seed the RNG is seeded from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { rng, step: 0 }
    }

    /// Number of deterministic values produced so far.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Next sample value for the given settings.
    pub fn next_value(&mut self, settings: &SensorConfig) -> f64 {
        let (low, high) = match settings.limit {
            LimitMode::Range => (settings.lower_bound, settings.upper_bound),
            LimitMode::Unbounded => (-UNBOUNDED_MAGNITUDE, UNBOUNDED_MAGNITUDE),
        };

        match settings.value_mode {
            ValueMode::Random => self.rng.gen_range(low..=high),
            ValueMode::Deterministic => {
                let phase = (self.step % SAWTOOTH_STEPS) as f64 / (SAWTOOTH_STEPS - 1) as f64;
                self.step = self.step.wrapping_add(1);
                low + phase * (high - low)
            }
        }
    }

    /// Delay before the next tick.
    pub fn next_delay(&mut self, settings: &SensorConfig) -> Duration {
        let millis = match settings.timing {
            TimingMode::Periodic => settings.period_ms,
            TimingMode::Aperiodic => self
                .rng
                .gen_range(settings.min_period_ms..=settings.max_period_ms),
        };
        Duration::from_millis(millis)
    }
}

impl std::fmt::Debug for SampleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleGenerator")
            .field("rng", &"<ChaCha8Rng>")
            .field("step", &self.step)
            .finish()
    }
}
