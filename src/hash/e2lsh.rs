//! p-stable LSH for Euclidean distance.
//!
//! Each scalar hash is `floor((a · x + b) / w)` where `a` has i.i.d. standard
//! normal entries and `b` is uniform in `[0, w)`. Table `t` concatenates the
//! `k` scalars `t*k .. (t+1)*k`.

use super::{rng_from_seed, HashFamily, HashSignature};
use crate::config::{HashFamilyConfig, IndexConfig};
use crate::error::{Result, SamplerError};
use crate::similarity::l2;
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;

/// Euclidean LSH family built from random projections.
#[derive(Debug, Clone)]
pub struct E2Lsh {
    /// Hash functions per table.
    k: usize,
    /// Number of tables.
    num_tables: usize,
    /// Bucket width.
    w: f64,
    /// Maximum distance of a valid candidate.
    radius: f64,
    /// Whether the radius is enforced.
    validate: bool,
    /// Point dimension.
    dim: usize,
    /// Projection directions, one row of length `dim` per scalar hash.
    projections: Vec<Vec<f64>>,
    /// Offsets in `[0, w)`, one per scalar hash.
    offsets: Vec<f64>,
}

impl E2Lsh {
    /// Creates a family of `num_tables` tables with `k` projections each.
    pub fn new(
        dim: usize,
        k: usize,
        num_tables: usize,
        w: f64,
        radius: f64,
        validate: bool,
        seed: Option<u64>,
    ) -> Result<Self> {
        if k == 0 || num_tables == 0 {
            return Err(SamplerError::Config(format!(
                "k and L must be positive, got k={k}, L={num_tables}"
            )));
        }
        if !(w.is_finite() && w > 0.0) {
            return Err(SamplerError::Config(format!(
                "bucket width must be positive and finite, got {w}"
            )));
        }
        if dim == 0 {
            return Err(SamplerError::Config(
                "point dimension must be positive".to_string(),
            ));
        }

        let mut rng = rng_from_seed(seed);
        let num_hashes = k * num_tables;

        let projections: Vec<Vec<f64>> = (0..num_hashes)
            .map(|_| (0..dim).map(|_| rng.sample(StandardNormal)).collect())
            .collect();
        let offsets: Vec<f64> = (0..num_hashes).map(|_| rng.gen_range(0.0..w)).collect();

        Ok(Self {
            k,
            num_tables,
            w,
            radius,
            validate,
            dim,
            projections,
            offsets,
        })
    }

    /// Creates the family described by an index configuration.
    pub fn from_config(config: &IndexConfig, dim: usize) -> Result<Self> {
        config.validate()?;
        match config.family {
            HashFamilyConfig::E2Lsh { w } => Self::new(
                dim,
                config.k,
                config.num_tables,
                w,
                config.threshold,
                config.validate,
                config.seed,
            ),
            HashFamilyConfig::OneBitMinHash => Err(SamplerError::Config(
                "configuration selects the one-bit minhash family".to_string(),
            )),
        }
    }

    /// Bucket width.
    pub fn width(&self) -> f64 {
        self.w
    }

    /// Point dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Compact identifier, e.g. `k_2_L_3_w_4`.
    pub fn label(&self) -> String {
        format!("k_{}_L_{}_w_{}", self.k, self.num_tables, self.w)
    }
}

impl HashFamily for E2Lsh {
    type Point = Vec<f64>;
    type Key = Vec<i64>;

    fn num_tables(&self) -> usize {
        self.num_tables
    }

    fn k(&self) -> usize {
        self.k
    }

    fn hash_point(&self, point: &Vec<f64>) -> Result<HashSignature> {
        if point.len() != self.dim {
            return Err(SamplerError::DimensionMismatch {
                expected: self.dim,
                found: point.len(),
            });
        }

        Ok(self
            .projections
            .iter()
            .zip(self.offsets.iter())
            .map(|(a, &b)| {
                let dot: f64 = a.iter().zip(point.iter()).map(|(x, y)| x * y).sum();
                ((dot + b) / self.w).floor() as i64
            })
            .collect())
    }

    fn bucket_key(&self, signature: &HashSignature, table: usize) -> Vec<i64> {
        signature[table * self.k..(table + 1) * self.k].to_vec()
    }

    fn is_candidate_valid(&self, query: &Vec<f64>, candidate: &Vec<f64>) -> bool {
        !self.validate || l2(query, candidate) <= self.radius
    }
}

impl fmt::Display for E2Lsh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E2LSH(k={}, L={}, w={})", self.k, self.num_tables, self.w)
    }
}
