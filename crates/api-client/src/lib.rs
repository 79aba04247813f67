use crate::error::ApiError;
use crate::fetcher::Fetcher;
use core_types::{Alpha, PnlSeries};
use serde::de::DeserializeOwned;

mod auth;
pub mod catalog;
pub mod channel;
pub mod error;
pub mod fetcher;
pub mod responses;
mod session;

// --- Public API ---
pub use auth::sign_in;
pub use channel::{Channel, RawResponse};
pub use responses::{AlphaListResponse, AlphaRecord, PnlRecordSet};
pub use session::Session;

/// Typed access to the platform endpoints the correlation pipeline needs.
///
/// All requests go through the resilient [`Fetcher`]; this layer adds the
/// "must be a success" check and the decoding into explicit schemas.
#[derive(Clone)]
pub struct AlphaClient {
    fetcher: Fetcher,
    base_url: String,
}

impl AlphaClient {
    pub fn new(fetcher: Fetcher, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches one alpha record (`GET /alphas/{id}`).
    pub async fn alpha(&self, alpha_id: &str) -> Result<Alpha, ApiError> {
        let url = format!("{}/alphas/{}", self.base_url, alpha_id);
        let record: AlphaRecord = self.get_json(&url).await?;
        Ok(record.into())
    }

    /// Fetches the full cumulative PnL of one alpha.
    pub async fn pnl(&self, alpha_id: &str) -> Result<PnlSeries, ApiError> {
        let url = format!("{}/alphas/{}/recordsets/pnl", self.base_url, alpha_id);
        let set: PnlRecordSet = self.get_json(&url).await?;
        set.into_series(alpha_id)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.fetcher.fetch(url).await?;
        if response.is_failure() {
            return Err(ApiError::Status {
                status: response.status,
                url: url.to_string(),
            });
        }
        serde_json::from_str::<T>(&response.body).map_err(|e| {
            ApiError::Deserialization(format!("{} (from {})", e, url))
        })
    }
}
