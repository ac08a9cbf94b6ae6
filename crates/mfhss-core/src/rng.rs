//! Deterministic, seedable-per-(row, column) random number generator (§6b).
//!
//! Indirect sampling (§4.4 step 2, §8 property 4) needs the same random
//! column to come out bit-identical no matter when or on which thread it is
//! regenerated, so seeding is a pure function of `(row, column)` rather than
//! advancing shared generator state.

use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Distributions recognized by `HssOptions::random_distribution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RandomDistribution {
    Uniform,
    Normal,
}

impl Default for RandomDistribution {
    fn default() -> Self {
        RandomDistribution::Normal
    }
}

/// Random engines recognized by `HssOptions::random_engine`. Only one
/// concrete engine is shipped (`StdRng64`); the enum exists so the option
/// round-trips through config the way `gat-algo`'s `OpfMethod`-style enums
/// do, and so a caller can add engines without breaking the option schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RandomEngine {
    StdRng64,
}

impl Default for RandomEngine {
    fn default() -> Self {
        RandomEngine::StdRng64
    }
}

/// A generator that can be seeded by `(row, column)` and then asked for one
/// value, reproducibly, independent of task scheduling (§5 ordering
/// guarantee iv).
pub trait SeedableRowRng {
    /// Flops accounted per draw, for bookkeeping parity with the reference's
    /// `flops_per_prng()` constant.
    const FLOPS_PER_PRNG: u64;

    fn seed(&mut self, row: u32, col: u32);
    fn get(&mut self) -> f64;
}

/// SplitMix64-seeded `StdRng`, mapped through the configured distribution.
///
/// `seed(row, col)` folds both coordinates into one 64-bit state via a
/// SplitMix64 mix (the same family of mixer `HashMap`-adjacent code in the
/// ecosystem uses to combine two integers into one well-distributed seed);
/// `get()` draws from a freshly re-seeded `StdRng` each time, so repeated
/// calls to `seed` with the same `(row, col)` always yield the same `get()`.
#[derive(Debug, Clone)]
pub struct SplitMixRng {
    state: u64,
    distribution: RandomDistribution,
}

impl SplitMixRng {
    pub fn new(distribution: RandomDistribution) -> Self {
        SplitMixRng {
            state: 0,
            distribution,
        }
    }

    fn mix(mut z: u64) -> u64 {
        z = z.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

impl SeedableRowRng for SplitMixRng {
    const FLOPS_PER_PRNG: u64 = 8;

    fn seed(&mut self, row: u32, col: u32) {
        let combined = ((row as u64) << 32) | (col as u64);
        self.state = Self::mix(combined);
    }

    fn get(&mut self) -> f64 {
        let mut rng = rand::rngs::StdRng::seed_from_u64(self.state);
        match self.distribution {
            RandomDistribution::Uniform => rng.gen::<f64>(),
            RandomDistribution::Normal => {
                // Box-Muller using two draws from the freshly re-seeded
                // stream; both draws are a deterministic function of `state`.
                let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
                let u2: f64 = rng.gen::<f64>();
                (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
            }
        }
    }
}
