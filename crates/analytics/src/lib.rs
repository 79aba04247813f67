//! # Self-Correlation Analytics
//!
//! This crate measures how much a candidate alpha duplicates what is already
//! in the cached universe: its maximum correlation against the cached peers of
//! its own region.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no network and no cache access. Callers hand in the
//!   region index, the wide table and the target's own series.
//! - **Returns are derived, never stored:** windows are recomputed from the
//!   PnL on every call, so a grown cache never serves stale returns.
//! - **Degenerate means zero:** an empty region or an undefined coefficient
//!   yields `0.0` instead of an error.
//!
//! ## Public API
//!
//! - `SelfCorrelationEngine`: scores a target and writes the report artifact.
//! - `CorrelationReport`: the sorted, rounded peer vector.
//! - `pearson`: pairwise-complete Pearson correlation of two return series.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod correlation;
pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use correlation::pearson;
pub use engine::{SelfCorrelation, SelfCorrelationEngine};
pub use error::AnalyticsError;
pub use report::{CorrelationReport, CorrelationRow};
