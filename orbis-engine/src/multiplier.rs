//! GDP multiplier sources.
//!
//! Estimated GDP is `population * multiplier / rate` with the multiplier
//! drawn uniformly from `[GDP_MULTIPLIER_MIN, GDP_MULTIPLIER_MAX)` per record.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Inclusive lower bound of the multiplier
pub const GDP_MULTIPLIER_MIN: f64 = 1000.0;

/// Exclusive upper bound of the multiplier
pub const GDP_MULTIPLIER_MAX: f64 = 2000.0;

/// Source of per-record GDP multipliers.
pub trait GdpMultiplier: Send + Sync {
    /// Draw one multiplier. Callers clamp into the half-open range.
    fn sample(&self) -> f64;
}

/// Clamp a sampled value into `[GDP_MULTIPLIER_MIN, GDP_MULTIPLIER_MAX)`.
pub(crate) fn clamp_to_range(value: f64) -> f64 {
    // largest f64 strictly below the upper bound
    let max_below = f64::from_bits(GDP_MULTIPLIER_MAX.to_bits() - 1);
    if value.is_nan() {
        return GDP_MULTIPLIER_MIN;
    }
    value.clamp(GDP_MULTIPLIER_MIN, max_below)
}

// =============================================================================
// Random
// =============================================================================

/// Thread-local RNG, a fresh draw for every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomMultiplier;

impl GdpMultiplier for RandomMultiplier {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen_range(GDP_MULTIPLIER_MIN..GDP_MULTIPLIER_MAX)
    }
}

// =============================================================================
// Seeded
// =============================================================================

/// Reproducible multiplier sequence from a fixed seed.
pub struct SeededMultiplier {
    rng: Mutex<StdRng>,
    seed: u64,
}

impl SeededMultiplier {
    /// Create a generator from a seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            seed,
        }
    }

    /// Seed used at construction
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl GdpMultiplier for SeededMultiplier {
    fn sample(&self) -> f64 {
        // a poisoned RNG is still a valid RNG
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(GDP_MULTIPLIER_MIN..GDP_MULTIPLIER_MAX)
    }
}

impl std::fmt::Debug for SeededMultiplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeededMultiplier").field("seed", &self.seed).finish()
    }
}

// =============================================================================
// Fixed
// =============================================================================

/// Always returns the same value. For tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedMultiplier(pub f64);

impl GdpMultiplier for FixedMultiplier {
    fn sample(&self) -> f64 {
        self.0
    }
}
