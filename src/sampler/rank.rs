//! Rank-based sampling with re-ranking.
//!
//! Every dataset point gets a position in a uniformly random permutation.
//! Repeatedly extracting the candidate of minimum rank yields a uniform
//! candidate; after each draw the sampled point is swapped to a uniformly
//! chosen position in `[rank, n)`, which renews its priority without
//! regenerating the whole permutation.
//!
//! The heap holds `(rank, point)` entries tagged with the rank current at
//! push time. An entry whose point has since moved is stale and is skipped
//! when popped.

use super::Sample;
use crate::error::{Result, SamplerError};
use crate::hash::{HashFamily, PointId};
use crate::index::{LshIndex, QueryContext};
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Heap entries allowed per live candidate before stale entries are purged.
const COMPACT_FACTOR: usize = 4;

/// Minimum heap size before compaction is considered.
const COMPACT_MIN_LEN: usize = 64;

/// A random permutation of the dataset and its inverse.
///
/// `ranks[point_rank[p]] == p` holds for every point at all times.
#[derive(Debug, Clone)]
pub struct RankState {
    /// ranks[r] = point holding rank r.
    ranks: Vec<PointId>,
    /// point_rank[p] = rank of point p.
    point_rank: Vec<usize>,
}

impl RankState {
    /// Draws a uniformly random permutation of `n` points.
    pub fn new<R: Rng>(n: usize, rng: &mut R) -> Self {
        let mut ranks: Vec<PointId> = (0..n as PointId).collect();
        ranks.shuffle(rng);

        let mut point_rank = vec![0; n];
        for (rank, &point) in ranks.iter().enumerate() {
            point_rank[point as usize] = rank;
        }

        Self { ranks, point_rank }
    }

    /// Number of ranked points.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Whether the permutation is empty.
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Current rank of `point`.
    #[inline]
    pub fn rank_of(&self, point: PointId) -> usize {
        self.point_rank[point as usize]
    }

    /// Point currently holding `rank`.
    #[inline]
    pub fn point_at(&self, rank: usize) -> PointId {
        self.ranks[rank]
    }

    /// Exchanges the points at ranks `a` and `b`; returns the point that
    /// was at `b`.
    pub fn swap(&mut self, a: usize, b: usize) -> PointId {
        let pa = self.ranks[a];
        let pb = self.ranks[b];
        self.ranks[a] = pb;
        self.ranks[b] = pa;
        self.point_rank[pb as usize] = a;
        self.point_rank[pa as usize] = b;
        pb
    }

    /// Whether `ranks` is a permutation and `point_rank` its inverse.
    pub fn is_consistent(&self) -> bool {
        let n = self.ranks.len();
        if self.point_rank.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for (rank, &point) in self.ranks.iter().enumerate() {
            let p = point as usize;
            if p >= n || seen[p] || self.point_rank[p] != rank {
                return false;
            }
            seen[p] = true;
        }
        true
    }
}

/// Min-heap of rank-tagged entries with lazy deletion.
#[derive(Debug, Default)]
pub struct RankHeap {
    heap: BinaryHeap<Reverse<(usize, PointId)>>,
}

impl RankHeap {
    /// Seeds the heap with each point at its current rank.
    pub fn from_points(points: &[PointId], state: &RankState) -> Self {
        let heap = points
            .iter()
            .map(|&p| Reverse((state.rank_of(p), p)))
            .collect();
        Self { heap }
    }

    /// Pushes `point` tagged with `rank`.
    #[inline]
    pub fn push(&mut self, rank: usize, point: PointId) {
        self.heap.push(Reverse((rank, point)));
    }

    /// Pops the minimum entry that is still current, discarding stale ones.
    pub fn pop_fresh(&mut self, state: &RankState) -> Option<(usize, PointId)> {
        let mut stale = 0;
        while let Some(Reverse((rank, point))) = self.heap.pop() {
            if state.rank_of(point) == rank {
                if stale > 0 {
                    trace!("Skipped {} stale heap entries", stale);
                }
                return Some((rank, point));
            }
            stale += 1;
        }
        None
    }

    /// Drops every stale entry.
    pub fn compact(&mut self, state: &RankState) {
        let before = self.heap.len();
        self.heap
            .retain(|Reverse((rank, point))| state.rank_of(*point) == *rank);
        trace!("Compacted rank heap: {} -> {} entries", before, self.heap.len());
    }

    /// Number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the heap holds no entries.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Samples one query against a rank state that may be shared with others.
pub(crate) fn sample_query<H: HashFamily, R: Rng>(
    index: &LshIndex<H>,
    query: &H::Point,
    ctx: &QueryContext<H::Key>,
    state: &mut RankState,
    draws: usize,
    rng: &mut R,
) -> Result<Vec<Sample>> {
    if ctx.num_candidates() == 0 {
        return Ok(vec![None; draws]);
    }

    let family = index.family();
    let n = state.len();
    let compact_at = (COMPACT_FACTOR * ctx.num_candidates()).max(COMPACT_MIN_LEN);
    let mut heap = RankHeap::from_points(ctx.candidates(), state);
    let mut samples = Vec::with_capacity(draws);

    for _ in 0..draws {
        // Invalid pops are dropped, not requeued.
        let (rank, point) = loop {
            let (rank, point) = heap.pop_fresh(state).ok_or_else(|| {
                SamplerError::InvariantViolation(
                    "rank heap drained while the query has candidates".to_string(),
                )
            })?;
            if family.is_candidate_valid(query, index.point(point)) {
                break (rank, point);
            }
        };
        samples.push(Some(point));

        let new_rank = rng.gen_range(rank..n);
        let displaced = state.swap(rank, new_rank);
        heap.push(new_rank, point);
        if displaced != point && ctx.contains(displaced) {
            heap.push(rank, displaced);
        }

        if heap.len() > compact_at {
            heap.compact(state);
        }
    }

    Ok(samples)
}
