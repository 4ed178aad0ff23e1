use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::types::AppError;

/// Transport-level failures talking to the extraction provider
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction provider did not respond in time")]
    Timeout,

    #[error("Error connecting to external Instagram API: {0}")]
    Transport(String),

    #[error("External Instagram API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("External Instagram API returned invalid JSON.")]
    InvalidJson(String),
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::Timeout => AppError::UpstreamTimeout,
            ExtractionError::Transport(_) | ExtractionError::Status { .. } => {
                AppError::UpstreamUnavailable(err.to_string())
            }
            ExtractionError::InvalidJson(_) => AppError::UpstreamProtocol(err.to_string()),
        }
    }
}

/// A service that turns a post URL into a JSON description of its media.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    async fn fetch(&self, source_url: &str) -> Result<Value, ExtractionError>;
}
