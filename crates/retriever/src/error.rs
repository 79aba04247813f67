use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrieverError {
    #[error("Failed to fetch the PnL of alpha {alpha_id}: {source}")]
    Fetch {
        alpha_id: String,
        #[source]
        source: api_client::error::ApiError,
    },
}
