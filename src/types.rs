// Error taxonomy for the relay request boundary

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures that abort a relay request.
///
/// Per-item upload failures are not part of this enum: they are recovered
/// inside the upload loop and reported in the outcome list instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Cloudinary service is not configured on the server.")]
    Configuration,

    #[error("{0}")]
    InvalidInput(String),

    #[error("The request to the external Instagram API timed out.")]
    UpstreamTimeout,

    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error("{0}")]
    UpstreamProtocol(String),

    #[error("Failed to fetch data from Instagram via external API: {0}")]
    UpstreamReportedFailure(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Configuration => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::UpstreamUnavailable(_) | AppError::UpstreamProtocol(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::UpstreamReportedFailure(_) => StatusCode::FAILED_DEPENDENCY,
        }
    }

    /// Machine-readable code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Configuration => "configuration_missing",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::UpstreamTimeout => "upstream_timeout",
            AppError::UpstreamUnavailable(_) => "upstream_unavailable",
            AppError::UpstreamProtocol(_) => "upstream_protocol_error",
            AppError::UpstreamReportedFailure(_) => "upstream_reported_failure",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Relay request failed");
        } else {
            tracing::warn!(error = %self, code = self.code(), "Relay request rejected");
        }

        let body = ErrorResponse {
            detail: self.to_string(),
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
