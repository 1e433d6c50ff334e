//! # lsh-sampler - Neighborhood Sampling over LSH
//!
//! An LSH index paired with randomized query algorithms that draw samples
//! from a query's candidate neighborhood without materializing it.
//!
//! ## Overview
//!
//! The index hashes every point into `L` tables. For a query, the union of
//! its buckets is the *candidate* set, and the candidates within the
//! configured threshold are the *validated* candidates. Instead of returning
//! them all, a sampler emits a stream of draws whose distribution
//! approximates uniform sampling over the validated candidates.
//!
//! ## Quick Start
//!
//! ```rust
//! use lsh_sampler::{HashFamilyConfig, IndexConfig, LshIndex, SamplerConfig, Strategy};
//!
//! let points = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![5.0, 5.0], vec![5.0, 6.0]];
//! let config = IndexConfig {
//!     k: 1,
//!     num_tables: 4,
//!     threshold: 1.5,
//!     family: HashFamilyConfig::E2Lsh { w: 2.0 },
//!     ..IndexConfig::default()
//! };
//! let index = LshIndex::euclidean(points, &config)?;
//!
//! let samples = index.sample(&[vec![0.0, 0.5]], Strategy::Rank, &SamplerConfig::with_runs(10))?;
//! assert!(samples[0].iter().all(|s| matches!(s, Some(0) | Some(1))));
//! # Ok::<(), lsh_sampler::SamplerError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`hash`] - Hash families (E2LSH, one-bit minhash)
//! - [`index`] - Bucket index and per-query contexts
//! - [`sampler`] - The five sampling strategies
//! - [`similarity`] - Distance and similarity predicates
//! - [`config`] - Configuration structures

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod hash;
pub mod index;
pub mod sampler;
pub mod similarity;

// Re-export commonly used types
pub use config::{Config, DrawCount, HashFamilyConfig, IndexConfig, RankScope, SamplerConfig};
pub use error::{Result, SamplerError};
pub use hash::{E2Lsh, HashFamily, HashSignature, MinHash, OneBitMinHash, PointId};
pub use index::{LshIndex, LshStats, QueryContext};
pub use sampler::{approx_degree, RankHeap, RankState, Sample, Strategy};
pub use similarity::{jaccard, l2};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
