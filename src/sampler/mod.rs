//! Neighborhood samplers.
//!
//! Every strategy consumes the [`QueryContext`] of a query and emits a
//! sequence of sampled candidate ids:
//!
//! | Strategy | Draw | Bias |
//! |----------|------|------|
//! | `opt` | uniform over the materialized candidates | none (oracle) |
//! | `uniform` | random table, random bucket element | collision multiplicity |
//! | `weighted_uniform` | random slot over all buckets | collision multiplicity |
//! | `approx_degree` | random slot, kept with prob. `1/D̂` | approximately none |
//! | `rank` | minimum random rank, then re-rank | none |
//!
//! Only `opt` needs the full candidate set; the others touch the buckets
//! directly and reject invalid slots.

mod degree;
mod opt;
mod rank;
mod uniform;

pub use degree::approx_degree;
pub use rank::{RankHeap, RankState};

use crate::config::{RankScope, SamplerConfig};
use crate::error::{Result, SamplerError};
use crate::hash::{rng_from_seed, HashFamily, PointId};
use crate::index::{LshIndex, QueryContext};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

/// One draw: a sampled point, or `None` when the query has no candidates.
pub type Sample = Option<PointId>;

/// Sampling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Uniform over the materialized validated candidates.
    Opt,
    /// Uniform table, uniform bucket element, rejection on invalid.
    Uniform,
    /// Uniform slot over all buckets, rejection on invalid.
    WeightedUniform,
    /// Uniform slot, accepted with probability `1 / estimated degree`.
    ApproxDegree,
    /// Random-rank order statistics with re-ranking after each draw.
    Rank,
}

impl Strategy {
    /// All strategies, in declaration order.
    pub const ALL: [Strategy; 5] = [
        Strategy::Opt,
        Strategy::Uniform,
        Strategy::WeightedUniform,
        Strategy::ApproxDegree,
        Strategy::Rank,
    ];

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Opt => "opt",
            Strategy::Uniform => "uniform",
            Strategy::WeightedUniform => "weighted_uniform",
            Strategy::ApproxDegree => "approx_degree",
            Strategy::Rank => "rank",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "opt" => Ok(Strategy::Opt),
            "uniform" => Ok(Strategy::Uniform),
            "weighted_uniform" => Ok(Strategy::WeightedUniform),
            "approx_degree" => Ok(Strategy::ApproxDegree),
            "rank" | "rank_simulate" => Ok(Strategy::Rank),
            other => Err(SamplerError::Config(format!("unknown strategy: {other}"))),
        }
    }
}

/// Samples every query of a batch with one strategy.
///
/// Queries are processed in order with a single RNG seeded from the
/// configuration, so a fixed seed reproduces the output exactly. The rank
/// strategy with [`RankScope::PerQuery`] instead gives each query its own
/// RNG stream and rank permutation and samples queries in parallel.
pub fn sample<H: HashFamily>(
    index: &LshIndex<H>,
    queries: &[H::Point],
    strategy: Strategy,
    config: &SamplerConfig,
) -> Result<Vec<Vec<Sample>>> {
    config.validate()?;
    let contexts = index.prepare(queries)?;
    info!(
        "Sampling {} queries with {} (runs={})",
        queries.len(),
        strategy,
        config.runs
    );

    if strategy == Strategy::Rank && config.rank_scope == RankScope::PerQuery {
        return sample_rank_per_query(index, queries, &contexts, config);
    }

    let mut rng = rng_from_seed(config.seed);
    let mut state = match strategy {
        Strategy::Rank => Some(RankState::new(index.len(), &mut rng)),
        _ => None,
    };

    let mut results = Vec::with_capacity(queries.len());
    for (j, (query, ctx)) in queries.iter().zip(contexts.iter()).enumerate() {
        let draws = config.draws_for(ctx.num_candidates())?;
        let samples = match (strategy, state.as_mut()) {
            (Strategy::Opt, _) => opt::sample_query(ctx, draws, &mut rng),
            (Strategy::Uniform, _) => {
                uniform::sample_query(index, query, ctx, draws, &mut rng)?
            }
            (Strategy::WeightedUniform, _) => {
                uniform::sample_query_weighted(index, query, ctx, draws, &mut rng)?
            }
            (Strategy::ApproxDegree, _) => {
                degree::sample_query(index, query, ctx, draws, &mut rng)?
            }
            (Strategy::Rank, Some(state)) => {
                rank::sample_query(index, query, ctx, state, draws, &mut rng)?
            }
            (Strategy::Rank, None) => {
                return Err(SamplerError::InvariantViolation(
                    "rank strategy without rank state".to_string(),
                ))
            }
        };
        debug!("Query {}: {} draws", j, samples.len());
        results.push(samples);
    }

    Ok(results)
}

fn sample_rank_per_query<H: HashFamily>(
    index: &LshIndex<H>,
    queries: &[H::Point],
    contexts: &[QueryContext<H::Key>],
    config: &SamplerConfig,
) -> Result<Vec<Vec<Sample>>> {
    let base_seed = match config.seed {
        Some(s) => s,
        None => rand::thread_rng().gen(),
    };

    queries
        .par_iter()
        .zip(contexts.par_iter())
        .enumerate()
        .map(|(j, (query, ctx))| {
            let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
            rng.set_stream(j as u64);
            let mut state = RankState::new(index.len(), &mut rng);
            let draws = config.draws_for(ctx.num_candidates())?;
            rank::sample_query(index, query, ctx, &mut state, draws, &mut rng)
        })
        .collect()
}
