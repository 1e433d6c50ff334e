//! LSH bucket index and per-query candidate aggregation.

mod lsh;
mod query;

pub use lsh::{LshIndex, LshStats};
pub use query::QueryContext;
