//! Extraction Provider
//!
//! Talks to the third-party API that resolves a post URL into direct media
//! links plus post metadata, and decodes its loosely-typed JSON into
//! explicit records:
//!
//! - [`ExtractionResponse`]: the envelope (`success`, `message`, `error`, `data`)
//! - [`ExtractionData`]: the nested payload with the media URL field and
//!   descriptive fields
//!
//! Every field decodes with a defined default, so classification never
//! depends on ad-hoc key lookups. Descriptive fields are kept as raw JSON
//! and echoed to callers unchanged.

pub mod client;
pub mod provider;

pub use client::HttpExtractionClient;
pub use provider::{ExtractionError, ExtractionProvider};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::types::{AppError, AppResult};

const MISSING_SUCCESS: &str =
    "Received an unexpected response structure from the external Instagram API.";
const MISSING_DATA: &str =
    "External Instagram API reported success but provided no valid data.";
const UNKNOWN_FAILURE: &str =
    "Unknown error from the external Instagram API, \"success\" flag was not true.";

/// Keeps a present-but-null key distinguishable from an absent one.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Top-level provider payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default, deserialize_with = "present")]
    pub success: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub message: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub error: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub data: Option<Value>,
}

/// The `url` field of the data payload, which the provider sends either as
/// a single string or as a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MediaUrlField {
    Single(String),
    List(Vec<Value>),
    Other(Value),
}

impl Default for MediaUrlField {
    fn default() -> Self {
        MediaUrlField::Other(Value::Null)
    }
}

/// Nested `data` payload of a successful extraction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionData {
    #[serde(default)]
    pub url: MediaUrlField,
    #[serde(default)]
    pub caption: Option<Value>,
    #[serde(default)]
    pub username: Option<Value>,
    #[serde(default)]
    pub like: Option<Value>,
    #[serde(default)]
    pub comment: Option<Value>,
    #[serde(rename = "isVideo", default)]
    pub is_video: Option<Value>,
}

impl ExtractionResponse {
    /// Decode the envelope, rejecting anything without a `success` key.
    pub fn from_value(value: Value) -> AppResult<Self> {
        if !value.is_object() {
            debug!(response = %value, "Extraction response is not an object");
            return Err(AppError::UpstreamProtocol(MISSING_SUCCESS.to_string()));
        }

        let response: Self = serde_json::from_value(value)
            .map_err(|e| AppError::UpstreamProtocol(format!("{MISSING_SUCCESS} ({e})")))?;

        if response.success.is_none() {
            debug!("Extraction response has no success field");
            return Err(AppError::UpstreamProtocol(MISSING_SUCCESS.to_string()));
        }

        Ok(response)
    }

    /// Unwrap the data payload of a successful response.
    pub fn into_data(self) -> AppResult<ExtractionData> {
        if self.success != Some(Value::Bool(true)) {
            return Err(AppError::UpstreamReportedFailure(self.failure_message()));
        }

        match self.data {
            Some(data @ Value::Object(_)) => serde_json::from_value(data)
                .map_err(|e| AppError::UpstreamProtocol(format!("{MISSING_DATA} ({e})"))),
            _ => Err(AppError::UpstreamProtocol(MISSING_DATA.to_string())),
        }
    }

    /// The provider's own explanation.
    ///
    /// A truthy `message` wins. Otherwise a non-null `error` is forwarded as
    /// is, even when empty, and only then the default text.
    pub fn failure_message(&self) -> String {
        if let Some(message) = self.message.as_ref().filter(|v| is_truthy(v)) {
            return render(message);
        }
        match &self.error {
            Some(error) if !error.is_null() => render(error),
            _ => UNKNOWN_FAILURE.to_string(),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Stage 1 classification: raw provider JSON to the data payload or a request-fatal error.
pub fn classify(value: Value) -> AppResult<ExtractionData> {
    ExtractionResponse::from_value(value)?.into_data()
}

/// Media URLs from the data payload, in provider order.
///
/// Only strings starting with `http` survive; anything else is dropped
/// without error. Duplicates are kept.
pub fn extract_media_urls(data: &ExtractionData) -> Vec<String> {
    match &data.url {
        MediaUrlField::Single(url) if url.starts_with("http") => vec![url.clone()],
        MediaUrlField::List(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|url| url.starts_with("http"))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
