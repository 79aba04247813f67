use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error while accessing the cache: {0}")]
    Io(#[from] std::io::Error),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("The key '{0}' was not found in the cache.")]
    NotFound(String),

    #[error("Blob '{key}' has format version {found}, expected {expected}")]
    VersionMismatch { key: String, found: u32, expected: u32 },

    #[error("Cached data is malformed: {0}")]
    Malformed(#[from] core_types::CoreError),

    #[error("Cached index and table disagree: {0}")]
    Inconsistent(String),
}
