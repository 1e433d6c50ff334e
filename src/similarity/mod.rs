//! Distance and similarity predicates used to validate candidates.

mod euclidean;
mod jaccard;

pub use euclidean::{l2, l2_squared};
pub use jaccard::jaccard;
