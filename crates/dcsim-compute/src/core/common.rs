//! Common data structures.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;

/// Identifier of a compute resource (flavor, image or server).
///
/// The upper 64 bits carry the simulated creation time in milliseconds, the
/// lower 64 bits a pseudo-random tail, so identifiers are unique within a run
/// and reproducible across runs with the same seed.
pub type ResourceId = u128;

/// Mints [`ResourceId`]s from a deterministic generator owned by the compute
/// service and seeded at its construction.
pub struct IdGenerator {
    rand: Pcg64,
}

impl IdGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rand: Pcg64::seed_from_u64(seed),
        }
    }

    /// Returns a fresh identifier stamped with the given simulated time.
    pub fn generate(&mut self, now: f64) -> ResourceId {
        let millis = now.max(0.) as u64;
        ((millis as u128) << 64) | self.rand.gen::<u64>() as u128
    }
}
