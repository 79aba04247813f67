use crate::channel::{Channel, RawResponse};
use crate::error::ApiError;
use configuration::FetcherSettings;
use std::sync::Arc;
use std::time::Duration;

/// Issues one logical GET with rate-limit compliance and exponential backoff.
///
/// Within an attempt, the fetcher re-polls while the server sends a positive
/// `Retry-After`, sleeping exactly that long each time. An attempt whose final
/// response has status >= 400 (or whose transport failed) is followed by a
/// `2^attempt` second backoff. Once `max_retries` attempts are spent the last
/// response is returned as-is: callers must check the status themselves.
#[derive(Clone)]
pub struct Fetcher {
    channel: Arc<dyn Channel>,
    settings: FetcherSettings,
}

impl Fetcher {
    pub fn new(channel: Arc<dyn Channel>, settings: FetcherSettings) -> Self {
        Self { channel, settings }
    }

    pub async fn fetch(&self, url: &str) -> Result<RawResponse, ApiError> {
        let attempts = self.settings.max_retries.max(1);
        let mut last = Err(ApiError::InvalidData(format!("no attempt made for {}", url)));

        for attempt in 0..attempts {
            match self.poll_until_ready(url).await {
                Ok(response) if !response.is_failure() => return Ok(response),
                Ok(response) => {
                    tracing::warn!(url, status = response.status, attempt, "Request failed; backing off.");
                    last = Ok(response);
                }
                Err(e) => {
                    tracing::warn!(url, error = %e, attempt, "Transport failure; backing off.");
                    last = Err(e);
                }
            }
            tokio::time::sleep(backoff(attempt)).await;
        }

        last
    }

    /// Polls `url` until the server stops asking us to come back later.
    async fn poll_until_ready(&self, url: &str) -> Result<RawResponse, ApiError> {
        let mut polls = 0;
        loop {
            let response = self.channel.get(url).await?;
            let Some(wait) = response.rate_limit_wait() else {
                return Ok(response);
            };
            // A hint too large for a `Duration` counts as exhausted polling.
            match Duration::try_from_secs_f64(wait) {
                Ok(wait) if polls < self.settings.max_rate_limit_polls => {
                    tracing::debug!(url, wait = ?wait, "Rate limited; sleeping.");
                    tokio::time::sleep(wait).await;
                    polls += 1;
                }
                _ => {
                    tracing::warn!(url, polls, retry_after = wait, "Giving up on Retry-After polling for this attempt.");
                    return Ok(response);
                }
            }
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(16))
}
