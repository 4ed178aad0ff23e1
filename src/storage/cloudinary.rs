// Cloudinary client using the signed upload API
// Documentation: https://cloudinary.com/documentation/image_upload_api_reference#upload
//
// The asset host fetches the remote file itself, so only the source URL is
// sent. Requests are signed with SHA-256 over the sorted signed parameters
// followed by the API secret.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{AssetStore, UploadError, UploadRequest, UploadedAsset};
use crate::config::{CloudinaryCredentials, StorageConfig};

const ERROR_PREVIEW_CHARS: usize = 200;

pub struct CloudinaryClient {
    client: Client,
    credentials: CloudinaryCredentials,
    api_base: String,
}

#[derive(Deserialize)]
struct CloudinaryErrorResponse {
    error: CloudinaryError,
}

#[derive(Deserialize)]
struct CloudinaryError {
    message: String,
}

impl CloudinaryClient {
    /// Returns `Ok(None)` when the credentials are incomplete.
    pub fn from_config(config: &StorageConfig) -> anyhow::Result<Option<Self>> {
        let Some(credentials) = config.credentials() else {
            return Ok(None);
        };

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Some(Self {
            client,
            credentials,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }))
    }

    pub fn upload_url(&self, request: &UploadRequest) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.api_base, self.credentials.cloud_name, request.resource_type
        )
    }

    fn form(&self, request: &UploadRequest, timestamp: i64) -> Vec<(&'static str, String)> {
        let signed = vec![
            ("folder", request.folder.clone()),
            ("timestamp", timestamp.to_string()),
        ];
        let signature = sign(&signed, &self.credentials.api_secret);

        let mut form = signed;
        form.push(("file", request.source_url.clone()));
        form.push(("api_key", self.credentials.api_key.clone()));
        form.push(("signature", signature));
        form.push(("signature_algorithm", "sha256".to_string()));
        form
    }
}

/// Hex SHA-256 of `k1=v1&k2=v2...` (keys sorted) with the secret appended.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<CloudinaryErrorResponse>(body)
        .ok()
        .map(|e| e.error.message)
}

#[async_trait]
impl AssetStore for CloudinaryClient {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadedAsset, UploadError> {
        let timestamp = chrono::Utc::now().timestamp();
        let url = self.upload_url(request);
        debug!(url = %url, source = %request.source_url, "Submitting upload to Cloudinary");

        let response = self
            .client
            .post(&url)
            .form(&self.form(request, timestamp))
            .send()
            .await
            .map_err(|e| UploadError::Unexpected(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Unexpected(e.to_string()))?;

        if let Some(message) = provider_message(&body) {
            return Err(UploadError::Provider(message));
        }

        if !status.is_success() {
            let preview: String = body.chars().take(ERROR_PREVIEW_CHARS).collect();
            return Err(UploadError::Provider(format!("HTTP {}: {}", status.as_u16(), preview)));
        }

        serde_json::from_str(&body).map_err(|e| UploadError::Unexpected(e.to_string()))
    }
}
