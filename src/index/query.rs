//! Per-query candidate aggregation.

use super::lsh::LshIndex;
use crate::hash::{HashFamily, HashSignature, PointId};
use log::debug;

/// Buckets, sizes and validated candidates of one query.
///
/// Built by [`LshIndex::prepare`] and discarded after sampling.
#[derive(Debug, Clone)]
pub struct QueryContext<K> {
    /// `(table, key)` of the query's bucket in every table.
    buckets: Vec<(usize, K)>,
    /// Size of each of those buckets, invalid points included.
    bucket_sizes: Vec<usize>,
    /// Running totals of `bucket_sizes`.
    prefix_sums: Vec<usize>,
    /// Number of distinct points colliding in at least one table.
    raw_size: usize,
    /// Validated candidates, ascending.
    candidates: Vec<PointId>,
}

impl<K> QueryContext<K> {
    pub(crate) fn build<H>(index: &LshIndex<H>, query: &H::Point, signature: &HashSignature) -> Self
    where
        H: HashFamily<Key = K>,
    {
        let family = index.family();
        let num_tables = family.num_tables();

        let mut buckets = Vec::with_capacity(num_tables);
        let mut bucket_sizes = Vec::with_capacity(num_tables);
        let mut prefix_sums = Vec::with_capacity(num_tables);
        let mut union: Vec<PointId> = Vec::new();
        let mut total = 0;

        for t in 0..num_tables {
            let key = family.bucket_key(signature, t);
            let bucket = index.bucket(t, &key);
            total += bucket.len();
            union.extend_from_slice(bucket);
            bucket_sizes.push(bucket.len());
            prefix_sums.push(total);
            buckets.push((t, key));
        }

        union.sort_unstable();
        union.dedup();
        let raw_size = union.len();

        let candidates: Vec<PointId> = union
            .into_iter()
            .filter(|&id| family.is_candidate_valid(query, index.point(id)))
            .collect();

        debug!(
            "Query context: {} slots, {} distinct colliding, {} validated",
            total,
            raw_size,
            candidates.len()
        );

        Self {
            buckets,
            bucket_sizes,
            prefix_sums,
            raw_size,
            candidates,
        }
    }

    /// `(table, key)` pairs, one per table.
    pub fn buckets(&self) -> &[(usize, K)] {
        &self.buckets
    }

    /// Bucket sizes, one per table.
    pub fn bucket_sizes(&self) -> &[usize] {
        &self.bucket_sizes
    }

    /// Running totals of the bucket sizes.
    pub fn prefix_sums(&self) -> &[usize] {
        &self.prefix_sums
    }

    /// Total number of slots over all of the query's buckets.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.prefix_sums.last().copied().unwrap_or(0)
    }

    /// Number of distinct colliding points before validation.
    pub fn raw_size(&self) -> usize {
        self.raw_size
    }

    /// Validated candidates, ascending.
    pub fn candidates(&self) -> &[PointId] {
        &self.candidates
    }

    /// Number of validated candidates.
    #[inline]
    pub fn num_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Whether `id` is a validated candidate.
    #[inline]
    pub fn contains(&self, id: PointId) -> bool {
        self.candidates.binary_search(&id).is_ok()
    }

    /// Position of the bucket owning global slot `slot` (`slot < total_size`).
    #[inline]
    pub fn locate_slot(&self, slot: usize) -> usize {
        self.prefix_sums.partition_point(|&s| s <= slot)
    }

    /// Exact number of the query's tables whose bucket holds `id`.
    pub fn exact_degree<H>(&self, index: &LshIndex<H>, id: PointId) -> usize
    where
        H: HashFamily<Key = K>,
    {
        self.buckets
            .iter()
            .filter(|(table, key)| index.bucket(*table, key).binary_search(&id).is_ok())
            .count()
    }
}
