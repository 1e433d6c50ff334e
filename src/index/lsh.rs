//! Multi-table LSH bucket index.
//!
//! Built once from a dataset: every point is hashed with the family and its
//! id is inserted into one bucket per table. Queries never mutate the index.

use super::query::QueryContext;
use crate::config::{IndexConfig, SamplerConfig};
use crate::error::{Result, SamplerError};
use crate::hash::{E2Lsh, HashFamily, OneBitMinHash, PointId};
use crate::sampler::{self, Sample, Strategy};
use log::info;
use rayon::prelude::*;
use std::collections::HashMap;

/// LSH index over an owned dataset.
///
/// Table `t` maps a bucket key to the ids of the points hashing to it. Ids
/// within a bucket are strictly increasing.
pub struct LshIndex<H: HashFamily> {
    /// The hash family.
    family: H,
    /// The dataset; point ids are positions in this vector.
    points: Vec<H::Point>,
    /// Hash tables: tables[t] = HashMap<key, ids>.
    tables: Vec<HashMap<H::Key, Vec<PointId>>>,
}

impl<H: HashFamily> LshIndex<H> {
    /// Hashes the whole dataset and fills the tables.
    pub fn build(family: H, points: Vec<H::Point>) -> Result<Self> {
        if points.is_empty() {
            return Err(SamplerError::EmptyInput("dataset is empty".to_string()));
        }
        if points.len() > PointId::MAX as usize {
            return Err(SamplerError::Config(format!(
                "dataset of {} points exceeds the id space",
                points.len()
            )));
        }

        let num_tables = family.num_tables();
        let signatures = family.hash(&points)?;

        let mut tables: Vec<HashMap<H::Key, Vec<PointId>>> = vec![HashMap::new(); num_tables];
        for (id, signature) in signatures.iter().enumerate() {
            for (t, table) in tables.iter_mut().enumerate() {
                table
                    .entry(family.bucket_key(signature, t))
                    .or_default()
                    .push(id as PointId);
            }
        }

        let index = Self {
            family,
            points,
            tables,
        };
        let stats = index.stats();
        info!(
            "Built LSH index: {} points, {} tables, {} buckets (max bucket {})",
            index.len(),
            stats.num_tables,
            stats.total_buckets,
            stats.max_bucket_size
        );
        Ok(index)
    }

    /// The hash family.
    pub fn family(&self) -> &H {
        &self.family
    }

    /// The dataset.
    pub fn points(&self) -> &[H::Point] {
        &self.points
    }

    /// The point with the given id.
    #[inline]
    pub fn point(&self, id: PointId) -> &H::Point {
        &self.points[id as usize]
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a built index.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of hash tables.
    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    /// Ids stored under `key` in `table`; absent keys are empty buckets.
    #[inline]
    pub fn bucket(&self, table: usize, key: &H::Key) -> &[PointId] {
        self.tables[table]
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Computes the per-query substrate shared by every sampler.
    pub fn prepare(&self, queries: &[H::Point]) -> Result<Vec<QueryContext<H::Key>>> {
        let signatures = self.family.hash(queries)?;

        let contexts: Vec<QueryContext<H::Key>> = queries
            .par_iter()
            .zip(signatures.par_iter())
            .map(|(query, signature)| QueryContext::build(self, query, signature))
            .collect();

        info!(
            "Prepared {} queries: {} validated candidates in total",
            contexts.len(),
            contexts.iter().map(|c| c.num_candidates()).sum::<usize>()
        );
        Ok(contexts)
    }

    /// Number of validated candidates per query.
    pub fn query_sizes(&self, queries: &[H::Point]) -> Result<Vec<usize>> {
        Ok(self
            .prepare(queries)?
            .iter()
            .map(QueryContext::num_candidates)
            .collect())
    }

    /// Draws sampled neighbors for every query.
    ///
    /// Entry `i` of the result holds the draws of `queries[i]`, in order;
    /// `None` marks a draw for a query without validated candidates.
    pub fn sample(
        &self,
        queries: &[H::Point],
        strategy: Strategy,
        config: &SamplerConfig,
    ) -> Result<Vec<Vec<Sample>>> {
        sampler::sample(self, queries, strategy, config)
    }

    /// Statistics about the tables.
    pub fn stats(&self) -> LshStats {
        let mut total_buckets = 0;
        let mut total_items = 0;
        let mut max_bucket_size = 0;

        for table in &self.tables {
            total_buckets += table.len();
            for bucket in table.values() {
                total_items += bucket.len();
                max_bucket_size = max_bucket_size.max(bucket.len());
            }
        }

        LshStats {
            num_tables: self.tables.len(),
            total_buckets,
            total_items,
            avg_bucket_size: if total_buckets > 0 {
                total_items as f64 / total_buckets as f64
            } else {
                0.0
            },
            max_bucket_size,
        }
    }
}

impl LshIndex<E2Lsh> {
    /// Builds a Euclidean index; the dimension is taken from the first point.
    pub fn euclidean(points: Vec<Vec<f64>>, config: &IndexConfig) -> Result<Self> {
        let dim = points
            .first()
            .map(Vec::len)
            .ok_or_else(|| SamplerError::EmptyInput("dataset is empty".to_string()))?;
        let family = E2Lsh::from_config(config, dim)?;
        Self::build(family, points)
    }
}

impl LshIndex<OneBitMinHash> {
    /// Builds a Jaccard index over token sets.
    pub fn jaccard(points: Vec<Vec<u32>>, config: &IndexConfig) -> Result<Self> {
        let family = OneBitMinHash::from_config(config)?;
        Self::build(family, points)
    }
}

/// Statistics about an LSH index.
#[derive(Debug, Clone)]
pub struct LshStats {
    /// Number of hash tables.
    pub num_tables: usize,
    /// Total number of non-empty buckets.
    pub total_buckets: usize,
    /// Total number of slots; always `points * tables`.
    pub total_items: usize,
    /// Average bucket size.
    pub avg_bucket_size: f64,
    /// Maximum bucket size.
    pub max_bucket_size: usize,
}
