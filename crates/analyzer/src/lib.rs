//! Views over the cached universe and filters over candidate alphas.
//!
//! - [`partition`] splits a `RegionIndex` by membership of a classification tag
//!   without touching the cache itself.
//! - [`dedup`] thins a batch of candidate expressions down to one per
//!   `target_data` sub-expression.

pub mod dedup;
pub mod error;
pub mod partition;

pub use dedup::{Candidate, dedup_exact, deduplicate, parse_candidates};
pub use error::AnalyzerError;
pub use partition::{filter, partition};
