//! Configuration for index construction and sampling.

use crate::error::{Result, SamplerError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest `k` the one-bit minhash family can pack into a 64-bit key.
pub const MAX_ONE_BIT_K: usize = 63;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Index construction parameters.
    pub index: IndexConfig,

    /// Sampling parameters.
    pub sampler: SamplerConfig,
}

impl Config {
    /// Parses a configuration from a JSON string and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file and validates it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<()> {
        self.index.validate()?;
        self.sampler.validate()
    }
}

/// Parameters of the LSH index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of concatenated hash functions per table.
    /// Default: 2.
    pub k: usize,

    /// Number of independent hash tables (`L`).
    /// Default: 3.
    pub num_tables: usize,

    /// Validity threshold: maximum L2 distance for the Euclidean family,
    /// minimum Jaccard similarity for the minhash family.
    /// Default: 1.0.
    pub threshold: f64,

    /// Filter candidates through the threshold. When false every colliding
    /// point counts as a validated candidate.
    /// Default: true.
    pub validate: bool,

    /// Seed for the hash functions.
    /// Default: Some(3).
    pub seed: Option<u64>,

    /// Which hash family to build.
    /// Default: E2LSH with w = 4.0.
    pub family: HashFamilyConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            k: 2,
            num_tables: 3,
            threshold: 1.0,
            validate: true,
            seed: Some(3),
            family: HashFamilyConfig::default(),
        }
    }
}

impl IndexConfig {
    /// Rejects parameters that cannot produce a usable index.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(SamplerError::Config("k must be positive".to_string()));
        }
        if self.num_tables == 0 {
            return Err(SamplerError::Config(
                "number of tables must be positive".to_string(),
            ));
        }
        if !self.threshold.is_finite() {
            return Err(SamplerError::Config(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        match self.family {
            HashFamilyConfig::E2Lsh { w } => {
                if !(w.is_finite() && w > 0.0) {
                    return Err(SamplerError::Config(format!(
                        "bucket width must be positive and finite, got {w}"
                    )));
                }
            }
            HashFamilyConfig::OneBitMinHash => {
                if self.k > MAX_ONE_BIT_K {
                    return Err(SamplerError::Config(format!(
                        "one-bit minhash supports k <= {MAX_ONE_BIT_K}, got {}",
                        self.k
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Hash family selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HashFamilyConfig {
    /// p-stable projections for Euclidean distance.
    #[serde(rename = "e2lsh")]
    E2Lsh {
        /// Bucket width.
        w: f64,
    },

    /// One-bit minhash for Jaccard similarity.
    #[serde(rename = "onebitminhash")]
    OneBitMinHash,
}

impl Default for HashFamilyConfig {
    fn default() -> Self {
        HashFamilyConfig::E2Lsh { w: 4.0 }
    }
}

/// How many draws a query receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawCount {
    /// `|validated candidates| * runs` draws.
    #[default]
    PerCandidate,
    /// Exactly `runs` draws, whatever the candidate count.
    Fixed,
}

/// Sharing scope of the rank permutation used by the rank sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankScope {
    /// One permutation for the whole batch; queries run sequentially and
    /// observe the rank changes made by earlier queries.
    #[default]
    Batch,
    /// A private permutation per query; queries run in parallel.
    PerQuery,
}

/// Parameters of a sampling call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Draw multiplier.
    /// Default: 100.
    pub runs: usize,

    /// Whether `runs` is scaled by the candidate count.
    /// Default: PerCandidate.
    pub draw_count: DrawCount,

    /// Rank permutation scope for the rank sampler.
    /// Default: Batch.
    pub rank_scope: RankScope,

    /// Seed for the sampling RNG.
    /// Default: Some(0). None draws a seed from entropy.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            runs: 100,
            draw_count: DrawCount::PerCandidate,
            rank_scope: RankScope::Batch,
            seed: Some(0),
        }
    }
}

impl SamplerConfig {
    /// Creates the default configuration with the given multiplier.
    pub fn with_runs(runs: usize) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// Rejects a zero multiplier.
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(SamplerError::Config("runs must be positive".to_string()));
        }
        Ok(())
    }

    /// Number of draws for a query with `candidates` validated candidates.
    ///
    /// Fails when `candidates * runs` does not fit in a `usize`.
    #[inline]
    pub fn draws_for(&self, candidates: usize) -> Result<usize> {
        match self.draw_count {
            DrawCount::PerCandidate => candidates.checked_mul(self.runs).ok_or_else(|| {
                SamplerError::Config(format!(
                    "{candidates} candidates x {} runs overflows the draw count",
                    self.runs
                ))
            }),
            DrawCount::Fixed => Ok(self.runs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.index.k, 2);
        assert_eq!(config.index.num_tables, 3);
        assert_eq!(config.index.family, HashFamilyConfig::E2Lsh { w: 4.0 });
        assert_eq!(config.sampler.runs, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_k_and_tables() {
        let mut config = IndexConfig::default();
        config.k = 0;
        assert!(matches!(config.validate(), Err(SamplerError::Config(_))));

        let mut config = IndexConfig::default();
        config.num_tables = 0;
        assert!(matches!(config.validate(), Err(SamplerError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_width_and_wide_minhash() {
        let mut config = IndexConfig::default();
        config.family = HashFamilyConfig::E2Lsh { w: 0.0 };
        assert!(config.validate().is_err());

        config.family = HashFamilyConfig::OneBitMinHash;
        config.k = MAX_ONE_BIT_K + 1;
        assert!(config.validate().is_err());
        config.k = MAX_ONE_BIT_K;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "index": { "k": 4, "num_tables": 10, "threshold": 0.5,
                       "family": { "type": "onebitminhash" } },
            "sampler": { "runs": 7, "draw_count": "fixed", "rank_scope": "per_query" }
        }"#;
        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.index.k, 4);
        assert_eq!(config.index.family, HashFamilyConfig::OneBitMinHash);
        assert!(config.index.validate);
        assert_eq!(config.sampler.runs, 7);
        assert_eq!(config.sampler.draw_count, DrawCount::Fixed);
        assert_eq!(config.sampler.rank_scope, RankScope::PerQuery);
        assert_eq!(config.sampler.seed, Some(0));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let json = r#"{ "sampler": { "runs": 0 } }"#;
        assert!(matches!(
            Config::from_json_str(json),
            Err(SamplerError::Config(_))
        ));
        assert!(matches!(
            Config::from_json_str("not json"),
            Err(SamplerError::Json(_))
        ));
    }

    #[test]
    fn test_draws_for() {
        let mut config = SamplerConfig::with_runs(5);
        assert_eq!(config.draws_for(3).unwrap(), 15);
        assert_eq!(config.draws_for(0).unwrap(), 0);
        config.draw_count = DrawCount::Fixed;
        assert_eq!(config.draws_for(3).unwrap(), 5);
        assert_eq!(config.draws_for(0).unwrap(), 5);
    }

    #[test]
    fn test_draws_for_overflow() {
        let config = SamplerConfig::with_runs(usize::MAX);
        assert_eq!(config.draws_for(1).unwrap(), usize::MAX);
        assert!(matches!(config.draws_for(2), Err(SamplerError::Config(_))));
    }
}
