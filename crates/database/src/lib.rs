//! # Incremental Cache Store
//!
//! This crate persists the state the correlation pipeline builds up between
//! runs: the per-region id index, the wide PnL table and the partition tag set.
//!
//! ## Architectural Principles
//!
//! - **Narrow persistence seam:** everything goes through the `BlobStore`
//!   key/bytes trait. `FsBlobStore` keeps one JSON file per key.
//! - **Versioned format:** every blob is an envelope `{version, payload}` and
//!   the table is stored columnar, so a schema change is detected instead of
//!   silently misread.
//! - **Full overwrite, fail-soft load:** `save` rewrites all keys; `load`
//!   falls back to an empty state on any miss so a first run needs no setup.
//!
//! ## Public API
//!
//! - `CacheStore`: load/save of a `CacheState`.
//! - `BlobStore`, `FsBlobStore`: the persistence seam and its file implementation.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use error::DbError;
pub use repository::{CacheState, CacheStore};
pub use store::{BlobStore, FsBlobStore};
