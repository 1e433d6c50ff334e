//! Oracle sampler over the materialized candidate set.

use super::Sample;
use crate::index::QueryContext;
use rand::seq::SliceRandom;
use rand::Rng;

/// Draws `draws` samples uniformly with replacement from the validated candidates.
pub(crate) fn sample_query<K, R: Rng>(
    ctx: &QueryContext<K>,
    draws: usize,
    rng: &mut R,
) -> Vec<Sample> {
    let candidates = ctx.candidates();
    (0..draws)
        .map(|_| candidates.choose(rng).copied())
        .collect()
}
