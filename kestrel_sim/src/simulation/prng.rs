// kestrel_sim/src/simulation/prng.rs

use rand::RngCore;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};

/// A newtype wrapper around `ChaCha8Rng`.
/// This is the central, deterministic pseudo-random number generator for the simulation.
pub struct SimulationRng {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SimulationRng {
    /// Seeds from `seed`, or draws a fresh seed when none is given. The seed
    /// actually used is kept so the run can be reproduced.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// An independent stream for one sensor. Forks are drawn in sensor order,
    /// so appending a sensor leaves the earlier streams unchanged, while
    /// inserting one shifts the streams of every sensor after it.
    pub fn fork(&mut self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.rng.next_u64())
    }
}
