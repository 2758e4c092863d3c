use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestWiseError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Price prediction failed: {0}")]
    Prediction(#[from] PredictionError),
}

/// Failures raised by the price prediction client.
///
/// Only `Validation` is terminal on the first attempt; everything else is
/// eligible for another attempt while the retry budget lasts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("prediction service returned status {status}")]
    Upstream { status: u16 },

    #[error("malformed prediction response: {0}")]
    Malformed(String),

    #[error("prediction service unreachable: {0}")]
    Transport(String),

    #[error("prediction request timed out after {0}s")]
    Timeout(u64),

    #[error("prediction failed after {0} attempts")]
    Exhausted(u32),
}

impl PredictionError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PredictionError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, HarvestWiseError>;
