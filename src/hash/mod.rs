//! Locality-sensitive hash families.
//!
//! A family turns a point into a [`HashSignature`] holding `L` sub-signatures,
//! one per table, and extracts from it the bucket key a point occupies in a
//! given table. It also owns the validity predicate that decides whether a
//! colliding point is a true neighbor of the query.
//!
//! Two families are provided:
//!
//! 1. [`E2Lsh`]: p-stable random projections for Euclidean distance
//! 2. [`OneBitMinHash`]: one-bit minhash for Jaccard similarity
//!
//! Adding a family means implementing [`HashFamily`]; the index and the
//! samplers are generic over it.
//!
//! References:
//! - Datar et al. (2004): "Locality-sensitive hashing scheme based on p-stable distributions"
//! - Li & König (2010): "b-Bit minwise hashing"

mod e2lsh;
mod minhash;

pub use e2lsh::E2Lsh;
pub use minhash::{MinHash, OneBitMinHash};

use crate::error::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::fmt::Debug;
use std::hash::Hash;

/// Dense identifier of a dataset point (its position in the dataset).
pub type PointId = u32;

/// Scalar hash outputs of one point across all tables.
///
/// Layout is family specific; only [`HashFamily::bucket_key`] interprets it.
pub type HashSignature = Vec<i64>;

/// Capability shared by every LSH family.
pub trait HashFamily: Send + Sync {
    /// Point representation hashed by this family.
    type Point: Send + Sync;

    /// Per-table bucket key.
    type Key: Hash + Eq + Clone + Debug + Send + Sync;

    /// Number of hash tables (`L`).
    fn num_tables(&self) -> usize;

    /// Number of hash functions concatenated per table.
    fn k(&self) -> usize;

    /// Computes the signature of a single point.
    fn hash_point(&self, point: &Self::Point) -> Result<HashSignature>;

    /// Extracts the bucket key of `table` from a signature.
    fn bucket_key(&self, signature: &HashSignature, table: usize) -> Self::Key;

    /// Whether `candidate` is a true neighbor of `query`.
    fn is_candidate_valid(&self, query: &Self::Point, candidate: &Self::Point) -> bool;

    /// Computes one signature per point, in input order.
    fn hash(&self, points: &[Self::Point]) -> Result<Vec<HashSignature>> {
        points.par_iter().map(|p| self.hash_point(p)).collect()
    }
}

/// Creates the RNG for a seed, falling back to entropy when none is given.
pub(crate) fn rng_from_seed(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}
