//! Rejection samplers over table slots.
//!
//! Both samplers pick a slot, keep it when the point is valid and retry
//! otherwise. A point colliding with the query in several tables owns
//! several slots, so neither is uniform over distinct candidates.

use super::Sample;
use crate::error::{Result, SamplerError};
use crate::hash::{HashFamily, PointId};
use crate::index::{LshIndex, QueryContext};
use rand::Rng;

/// Uniform table, then uniform element of that table's bucket.
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
        return Err(empty_buckets_error(ctx.num_candidates()));
    }

    let family = index.family();
    let buckets = ctx.buckets();
    let mut samples = Vec::with_capacity(draws);

    for _ in 0..draws {
        loop {
            let (table, key) = &buckets[rng.gen_range(0..buckets.len())];
            let bucket = index.bucket(*table, key);
            if bucket.is_empty() {
                continue;
            }
            let p = bucket[rng.gen_range(0..bucket.len())];
            if family.is_candidate_valid(query, index.point(p)) {
                samples.push(Some(p));
                break;
            }
        }
    }

    Ok(samples)
}

/// Uniform slot over the concatenation of all of the query's buckets.
pub(crate) fn sample_query_weighted<H: HashFamily, R: Rng>(
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
        return Err(empty_buckets_error(ctx.num_candidates()));
    }

    let family = index.family();
    let mut samples = Vec::with_capacity(draws);

    for _ in 0..draws {
        loop {
            let p = draw_slot(index, ctx, rng)?;
            if family.is_candidate_valid(query, index.point(p)) {
                samples.push(Some(p));
                break;
            }
        }
    }

    Ok(samples)
}

/// Picks a slot uniformly among all `total_size` slots and returns its point.
///
/// Requires `ctx.total_size() > 0`.
pub(crate) fn draw_slot<H: HashFamily, R: Rng>(
    index: &LshIndex<H>,
    ctx: &QueryContext<H::Key>,
    rng: &mut R,
) -> Result<PointId> {
    let slot = rng.gen_range(0..ctx.total_size());
    let pos = ctx.locate_slot(slot);
    let (table, key) = ctx.buckets().get(pos).ok_or_else(|| {
        SamplerError::InvariantViolation(format!("slot {slot} beyond the prefix sums"))
    })?;

    let bucket = index.bucket(*table, key);
    if bucket.is_empty() {
        return Err(SamplerError::InvariantViolation(format!(
            "slot {slot} resolved to empty bucket in table {table}"
        )));
    }
    Ok(bucket[rng.gen_range(0..bucket.len())])
}

fn empty_buckets_error(candidates: usize) -> SamplerError {
    SamplerError::InvariantViolation(format!(
        "{candidates} validated candidates but every bucket is empty"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::E2Lsh;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn line_index(radius: f64) -> LshIndex<E2Lsh> {
        let points: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64 * 0.2, 0.0]).collect();
        let family = E2Lsh::new(2, 1, 6, 3.0, radius, true, Some(3)).unwrap();
        LshIndex::build(family, points).unwrap()
    }

    #[test]
    fn test_uniform_only_emits_valid_candidates() {
        let index = line_index(0.7);
        let query = vec![2.0, 0.0];
        let ctx = &index.prepare(std::slice::from_ref(&query)).unwrap()[0];
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let samples = sample_query(&index, &query, ctx, 300, &mut rng).unwrap();
        assert_eq!(samples.len(), 300);
        assert!(samples.iter().all(|s| ctx.contains(s.unwrap())));
    }

    #[test]
    fn test_weighted_only_emits_valid_candidates() {
        let index = line_index(0.7);
        let query = vec![2.0, 0.0];
        let ctx = &index.prepare(std::slice::from_ref(&query)).unwrap()[0];
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let samples = sample_query_weighted(&index, &query, ctx, 300, &mut rng).unwrap();
        assert!(samples.iter().all(|s| ctx.contains(s.unwrap())));
    }

    #[test]
    fn test_draw_slot_frequency_tracks_slot_multiplicity() {
        // Without validation every slot is accepted, so the frequency of
        // a point is proportional to the number of buckets holding it.
        let points: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64 * 0.5, 0.0]).collect();
        let family = E2Lsh::new(2, 1, 5, 3.0, 0.0, false, Some(8)).unwrap();
        let index = LshIndex::build(family, points).unwrap();
        let ctx = &index.prepare(&[vec![2.5, 0.0]]).unwrap()[0];
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let trials = 60_000;
        let mut counts: HashMap<PointId, usize> = HashMap::new();
        for _ in 0..trials {
            *counts.entry(draw_slot(&index, ctx, &mut rng).unwrap()).or_insert(0) += 1;
        }

        let total = ctx.total_size() as f64;
        for &id in ctx.candidates() {
            let expected = ctx.exact_degree(&index, id) as f64 / total;
            let observed = counts.get(&id).copied().unwrap_or(0) as f64 / trials as f64;
            assert!((observed - expected).abs() < 0.02, "point {id}");
        }
    }

    #[test]
    fn test_sentinels_without_candidates() {
        let index = line_index(0.01);
        let query = vec![100.0, 100.0];
        let ctx = &index.prepare(std::slice::from_ref(&query)).unwrap()[0];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert_eq!(
            sample_query(&index, &query, ctx, 5, &mut rng).unwrap(),
            vec![None; 5]
        );
        assert_eq!(
            sample_query_weighted(&index, &query, ctx, 5, &mut rng).unwrap(),
            vec![None; 5]
        );
    }

    #[test]
    fn test_uniform_keeps_multiplicity_bias() {
        // Table-then-element: P(p) = (1/L) * sum over tables holding p of 1/|bucket|.
        let points: Vec<Vec<f64>> = (0..17).map(|i| vec![i as f64 * 0.5, 0.0]).collect();
        let family = E2Lsh::new(2, 1, 20, 4.0, 0.0, false, Some(31)).unwrap();
        let index = LshIndex::build(family, points).unwrap();
        let query = index.point(0).clone();
        let ctx = &index.prepare(std::slice::from_ref(&query)).unwrap()[0];
        let num_tables = ctx.buckets().len() as f64;
        let draws = ctx.num_candidates() * 3000;
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let mut counts: HashMap<PointId, usize> = HashMap::new();
        for s in sample_query(&index, &query, ctx, draws, &mut rng).unwrap() {
            *counts.entry(s.unwrap()).or_insert(0) += 1;
        }

        for &id in ctx.candidates() {
            let p: f64 = ctx
                .buckets()
                .iter()
                .map(|(t, key)| index.bucket(*t, key))
                .filter(|bucket| bucket.binary_search(&id).is_ok())
                .map(|bucket| 1.0 / (bucket.len() as f64 * num_tables))
                .sum();
            let expected = draws as f64 * p;
            let sd = (draws as f64 * p * (1.0 - p)).sqrt();
            let observed = counts.get(&id).copied().unwrap_or(0) as f64;
            assert!((observed - expected).abs() <= 5.0 * sd + 1.0, "point {id}");
        }

        // The query point sits in every bucket and beats the least-colliding candidate.
        let lowest = *ctx
            .candidates()
            .iter()
            .min_by_key(|&&id| ctx.exact_degree(&index, id))
            .unwrap();
        assert!(ctx.exact_degree(&index, lowest) < index.num_tables());
        assert!(counts[&0] > counts.get(&lowest).copied().unwrap_or(0));
    }
}
