//! One-bit minhash for Jaccard similarity on token sets.
//!
//! Each minhash function is a tabulation hash over the four bytes of a
//! token: four independent 256-entry tables whose lookups are XOR-ed. The
//! function's value for a set is the minimum over its tokens, and only the
//! parity of that minimum is kept. Table `t` packs its `k` parity bits into
//! one integer key.

use super::{rng_from_seed, HashFamily, HashSignature};
use crate::config::{HashFamilyConfig, IndexConfig, MAX_ONE_BIT_K};
use crate::error::{Result, SamplerError};
use crate::similarity::jaccard;
use rand::Rng;
use std::fmt;

/// A single tabulation-based minhash function over 32-bit tokens.
#[derive(Clone)]
pub struct MinHash {
    /// Lookup tables indexed by byte 3, 2, 1, 0 of the token.
    tables: [[u32; 256]; 4],
}

impl MinHash {
    /// Draws the four lookup tables from `rng`.
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let mut tables = [[0u32; 256]; 4];
        for table in tables.iter_mut() {
            for entry in table.iter_mut() {
                *entry = rng.gen();
            }
        }
        Self { tables }
    }

    /// Hash of a single token.
    #[inline]
    pub fn hash_token(&self, x: u32) -> u32 {
        self.tables[0][((x >> 24) & 0xff) as usize]
            ^ self.tables[1][((x >> 16) & 0xff) as usize]
            ^ self.tables[2][((x >> 8) & 0xff) as usize]
            ^ self.tables[3][(x & 0xff) as usize]
    }

    /// Minimum token hash of a set. An empty set maps to `u32::MAX`.
    pub fn min_hash(&self, set: &[u32]) -> u32 {
        set.iter()
            .map(|&x| self.hash_token(x))
            .min()
            .unwrap_or(u32::MAX)
    }

    /// The first token of `set` attaining the minimum hash.
    pub fn argmin_element(&self, set: &[u32]) -> Option<u32> {
        set.iter().copied().min_by_key(|&x| self.hash_token(x))
    }
}

impl fmt::Debug for MinHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinHash").finish_non_exhaustive()
    }
}

/// One-bit minhash LSH family.
#[derive(Debug, Clone)]
pub struct OneBitMinHash {
    /// Bits per table.
    k: usize,
    /// Number of tables.
    num_tables: usize,
    /// Minimum Jaccard similarity of a valid candidate.
    threshold: f64,
    /// Whether the threshold is enforced.
    validate: bool,
    /// `k * num_tables` functions, table-major.
    functions: Vec<MinHash>,
}

impl OneBitMinHash {
    /// Creates a family of `num_tables` tables with `k` bits each.
    pub fn new(
        k: usize,
        num_tables: usize,
        threshold: f64,
        validate: bool,
        seed: Option<u64>,
    ) -> Result<Self> {
        if k == 0 || num_tables == 0 {
            return Err(SamplerError::Config(format!(
                "k and L must be positive, got k={k}, L={num_tables}"
            )));
        }
        if k > MAX_ONE_BIT_K {
            return Err(SamplerError::Config(format!(
                "one-bit minhash supports k <= {MAX_ONE_BIT_K}, got {k}"
            )));
        }

        let mut rng = rng_from_seed(seed);
        let functions = (0..k * num_tables).map(|_| MinHash::new(&mut rng)).collect();

        Ok(Self {
            k,
            num_tables,
            threshold,
            validate,
            functions,
        })
    }

    /// Creates the family described by an index configuration.
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        match config.family {
            HashFamilyConfig::OneBitMinHash => Self::new(
                config.k,
                config.num_tables,
                config.threshold,
                config.validate,
                config.seed,
            ),
            HashFamilyConfig::E2Lsh { .. } => Err(SamplerError::Config(
                "configuration selects the E2LSH family".to_string(),
            )),
        }
    }

    /// Compact identifier, e.g. `k_4_L_10`.
    pub fn label(&self) -> String {
        format!("k_{}_L_{}", self.k, self.num_tables)
    }
}

impl HashFamily for OneBitMinHash {
    type Point = Vec<u32>;
    type Key = u64;

    fn num_tables(&self) -> usize {
        self.num_tables
    }

    fn k(&self) -> usize {
        self.k
    }

    fn hash_point(&self, point: &Vec<u32>) -> Result<HashSignature> {
        Ok(self
            .functions
            .chunks(self.k)
            .map(|table| {
                table
                    .iter()
                    .fold(0i64, |h, f| (h << 1) | i64::from(f.min_hash(point) & 1))
            })
            .collect())
    }

    fn bucket_key(&self, signature: &HashSignature, table: usize) -> u64 {
        signature[table] as u64
    }

    fn is_candidate_valid(&self, query: &Vec<u32>, candidate: &Vec<u32>) -> bool {
        !self.validate || jaccard(query, candidate) >= self.threshold
    }
}

impl fmt::Display for OneBitMinHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OneBitMinHash(k={}, L={})", self.k, self.num_tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_min_hash_is_order_independent() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mh = MinHash::new(&mut rng);
        assert_eq!(mh.min_hash(&[1, 2, 3, 400]), mh.min_hash(&[400, 3, 2, 1]));
        assert_eq!(mh.min_hash(&[]), u32::MAX);
    }

    #[test]
    fn test_argmin_element() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mh = MinHash::new(&mut rng);
        let set = [10, 20, 30, 40];
        let arg = mh.argmin_element(&set).unwrap();
        assert_eq!(mh.hash_token(arg), mh.min_hash(&set));
        assert_eq!(mh.argmin_element(&[]), None);
    }

    #[test]
    fn test_signature_fits_k_bits() {
        let lsh = OneBitMinHash::new(4, 6, 0.5, true, Some(3)).unwrap();
        let sig = lsh.hash_point(&vec![1, 5, 9, 77]).unwrap();
        assert_eq!(sig.len(), 6);
        assert!(sig.iter().all(|&h| (0..16).contains(&h)));
        assert_eq!(lsh.bucket_key(&sig, 5), sig[5] as u64);
    }

    #[test]
    fn test_identical_sets_collide_everywhere() {
        let lsh = OneBitMinHash::new(8, 10, 0.5, true, Some(3)).unwrap();
        let a = lsh.hash_point(&vec![3, 1, 2]).unwrap();
        let b = lsh.hash_point(&vec![1, 2, 3, 3]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_similar_sets_collide_more_often() {
        let lsh = OneBitMinHash::new(1, 400, 0.5, true, Some(9)).unwrap();
        let base: Vec<u32> = (0..100).collect();
        let near: Vec<u32> = (5..105).collect();
        let far: Vec<u32> = (1000..1100).collect();

        let sig = |p: &Vec<u32>| lsh.hash_point(p).unwrap();
        let agree = |a: &HashSignature, b: &HashSignature| {
            a.iter().zip(b.iter()).filter(|(x, y)| x == y).count()
        };

        let s_base = sig(&base);
        // One-bit agreement rate is (1 + J) / 2: about 0.95 for near, 0.5 for far.
        assert!(agree(&s_base, &sig(&near)) > agree(&s_base, &sig(&far)));
    }

    #[test]
    fn test_validity_predicate() {
        let lsh = OneBitMinHash::new(2, 2, 0.5, true, Some(0)).unwrap();
        assert!(lsh.is_candidate_valid(&vec![1, 2, 3], &vec![1, 2, 3, 4]));
        assert!(!lsh.is_candidate_valid(&vec![1, 2, 3], &vec![3, 4, 5, 6]));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(OneBitMinHash::new(0, 1, 0.5, true, None).is_err());
        assert!(OneBitMinHash::new(1, 0, 0.5, true, None).is_err());
        assert!(OneBitMinHash::new(64, 1, 0.5, true, None).is_err());
    }

    #[test]
    fn test_display_and_label() {
        let lsh = OneBitMinHash::new(4, 10, 0.5, true, Some(0)).unwrap();
        assert_eq!(lsh.to_string(), "OneBitMinHash(k=4, L=10)");
        assert_eq!(lsh.label(), "k_4_L_10");
    }
}
