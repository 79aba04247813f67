use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("I/O error while writing the correlation report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode the correlation report: {0}")]
    Csv(#[from] csv::Error),
}
