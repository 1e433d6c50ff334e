//! Jaccard similarity for token sets.

use std::collections::HashSet;

/// Jaccard similarity `|A ∩ B| / |A ∪ B|` of two token collections.
///
/// Duplicate tokens are ignored. Two empty collections have similarity 0.
pub fn jaccard(a: &[u32], b: &[u32]) -> f64 {
    let a: HashSet<u32> = a.iter().copied().collect();
    let b: HashSet<u32> = b.iter().copied().collect();

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    intersection as f64 / union as f64
}
