//! Degree-corrected slot sampling.
//!
//! A slot draw picks candidate `p` with probability proportional to its
//! degree `D(p)`, the number of the query's tables in which it collides.
//! Accepting the draw with probability `1 / D̂(p)` cancels that weighting.

use super::uniform::draw_slot;
use super::Sample;
use crate::error::{Result, SamplerError};
use crate::hash::{HashFamily, PointId};
use crate::index::{LshIndex, QueryContext};
use rand::Rng;

/// Estimates the degree of `id` for the query behind `ctx`.
///
/// Probes tables chosen independently at random (repeats allowed) until one
/// holds `id`, at most `L` times, and returns `L / probes` (integer division).
/// When no probe hits, the estimate is 1.
pub fn approx_degree<H: HashFamily, R: Rng>(
    index: &LshIndex<H>,
    ctx: &QueryContext<H::Key>,
    id: PointId,
    rng: &mut R,
) -> usize {
    let buckets = ctx.buckets();
    let num_tables = buckets.len();
    let mut probes = 0;

    while probes < num_tables {
        probes += 1;
        let (table, key) = &buckets[rng.gen_range(0..num_tables)];
        if index.bucket(*table, key).binary_search(&id).is_ok() {
            break;
        }
    }

    num_tables / probes
}

pub(crate) fn sample_query<H: HashFamily, R: Rng>(
    index: &LshIndex<H>,
    query: &H::Point,
    ctx: &QueryContext<H::Key>,
    draws: usize,
    rng: &mut R,
) -> Result<Vec<Sample>> {
    if ctx.num_candidates() == 0 {
        return Ok(vec![None; draws]);
    }
    if ctx.total_size() == 0 {
        return Err(SamplerError::InvariantViolation(format!(
            "{} validated candidates but every bucket is empty",
            ctx.num_candidates()
        )));
    }

    let family = index.family();
    let mut samples = Vec::with_capacity(draws);

    for _ in 0..draws {
        loop {
            let p = draw_slot(index, ctx, rng)?;
            if !family.is_candidate_valid(query, index.point(p)) {
                continue;
            }
            // Keep with probability 1/D.
            let degree = approx_degree(index, ctx, p, rng);
            if rng.gen_range(1..=degree) == degree {
                samples.push(Some(p));
                break;
            }
        }
    }

    Ok(samples)
}
