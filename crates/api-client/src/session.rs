use crate::channel::{Channel, RawResponse};
use crate::error::ApiError;
use async_trait::async_trait;
use configuration::Credentials;
use reqwest::header::RETRY_AFTER;

/// The authenticated HTTP channel produced by [`crate::sign_in`].
///
/// `reqwest::Client` is internally reference counted, so cloning a session is
/// cheap and every clone shares the same connection pool and cookies.
#[derive(Clone)]
pub struct Session {
    client: reqwest::Client,
    credentials: Credentials,
}

impl Session {
    pub(crate) fn new(client: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl Channel for Session {
    async fn get(&self, url: &str) -> Result<RawResponse, ApiError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// The platform sends fractional seconds ("2.5"). HTTP-date values are not
/// used by it and are treated as absent.
fn parse_retry_after(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}
