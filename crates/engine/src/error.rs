use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] configuration::ConfigError),

    #[error("API client error: {0}")]
    ApiClient(#[from] api_client::error::ApiError),

    #[error("Retrieval error: {0}")]
    Retriever(#[from] retriever::error::RetrieverError),

    #[error("Cache error: {0}")]
    Database(#[from] database::DbError),

    #[error("Correlation error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),
}
