//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each `(stream, path_index)`
//! pair. Sub-seeds are derived via BLAKE3 hashing, independently of thread
//! scheduling order, so Monte Carlo results are identical regardless of thread
//! count or the order in which paths complete.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stream for the price/variance innovations of a path.
pub const MARKET_STREAM: &str = "market";

/// Stream for per-path parameter perturbation.
pub const PERTURBATION_STREAM: &str = "perturbation";

/// Deterministic RNG hierarchy.
///
/// Because derivation is hash-based (not order-dependent), the same master
/// seed produces identical sub-seeds regardless of the order in which paths
/// are processed.
#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Derive a deterministic sub-seed for a specific (stream, path_index).
    pub fn sub_seed(&self, stream: &str, path_index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&path_index.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Create a seeded StdRng for one stream of one path.
    pub fn rng_for(&self, stream: &str, path_index: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(stream, path_index))
    }
}
