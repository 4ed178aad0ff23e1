use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::provider::{ExtractionError, ExtractionProvider};
use crate::config::ExtractionConfig;

/// Everything except ASCII alphanumerics and `-._~` gets escaped, slashes included.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const BODY_PREVIEW_CHARS: usize = 200;

pub struct HttpExtractionClient {
    client: Client,
    base_url: String,
}

impl HttpExtractionClient {
    pub fn new(config: &ExtractionConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Full provider URL for a post, with the post URL carried as the `url` query parameter
    pub fn request_url(&self, source_url: &str) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}url={}",
            self.base_url,
            separator,
            utf8_percent_encode(source_url, QUERY_VALUE)
        )
    }
}

fn map_request_error(err: reqwest::Error) -> ExtractionError {
    if err.is_timeout() {
        ExtractionError::Timeout
    } else {
        ExtractionError::Transport(err.to_string())
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[async_trait]
impl ExtractionProvider for HttpExtractionClient {
    async fn fetch(&self, source_url: &str) -> Result<Value, ExtractionError> {
        let url = self.request_url(source_url);
        info!(url = %url, "Requesting media data from extraction provider");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_request_error)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Extraction provider returned an error status");
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        debug!(bytes = body.len(), "Extraction provider response received");

        serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, body = %preview(&body), "Extraction provider returned invalid JSON");
            ExtractionError::InvalidJson(e.to_string())
        })
    }
}
