use crate::error::ApiError;
use async_trait::async_trait;

/// A response as seen by the fetcher: status, the server's rate-limit hint,
/// and the undecoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// Seconds from the `Retry-After` header, if present and numeric.
    pub retry_after: Option<f64>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn with_retry_after(mut self, seconds: f64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status >= 400
    }

    /// The wait requested by the server, if it is a positive number of seconds.
    pub fn rate_limit_wait(&self) -> Option<f64> {
        self.retry_after.filter(|s| s.is_finite() && *s > 0.0)
    }
}

/// An authenticated, shareable connection to the remote platform.
///
/// Implementations must be safe for concurrent use: the bulk retriever shares
/// one channel across all of its workers.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Issues a single GET. Transport failures are errors; HTTP error statuses
    /// are not.
    async fn get(&self, url: &str) -> Result<RawResponse, ApiError>;
}
