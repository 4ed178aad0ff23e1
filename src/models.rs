use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::config::Config;
use crate::extraction::{ExtractionData, HttpExtractionClient};
use crate::relay::RelayService;
use crate::storage::{AssetStore, CloudinaryClient, UploadedAsset};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: Arc<RelayService>,
}

impl AppState {
    /// Wire the HTTP clients described by the configuration.
    ///
    /// Missing Cloudinary credentials leave the relay without an asset store,
    /// which it reports as a configuration error on every request.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let extractor = Arc::new(HttpExtractionClient::new(&config.extraction)?);
        let store = CloudinaryClient::from_config(&config.storage)?
            .map(|client| Arc::new(client) as Arc<dyn AssetStore>);

        let relay = RelayService::new(extractor, store, config.storage.upload_folder.clone());

        Ok(Self {
            config: Arc::new(config),
            relay: Arc::new(relay),
        })
    }
}

// API Request/Response types

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RelayQuery {
    /// The full URL of the Instagram post or reel
    #[serde(default)]
    #[validate(length(min = 1, message = "Instagram URL cannot be empty."))]
    pub instagram_url: String,
}

/// Final response of a relay request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayResult {
    pub message: String,
    pub instagram_url: String,
    #[serde(rename = "original_yabes_desu_data_summary")]
    pub summary: DataSummary,
    #[serde(rename = "cloudinary_uploads")]
    pub uploads: Vec<MediaUploadOutcome>,
}

/// Descriptive fields echoed from the extraction payload, values untouched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub caption: Option<Value>,
    pub username: Option<Value>,
    #[serde(flatten)]
    pub engagement: Option<Engagement>,
    pub is_video: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Engagement {
    pub likes: Option<Value>,
    pub comments: Option<Value>,
}

impl DataSummary {
    /// Summary without engagement counts, used when nothing was uploaded.
    pub fn brief(data: &ExtractionData) -> Self {
        Self {
            caption: data.caption.clone(),
            username: data.username.clone(),
            engagement: None,
            is_video: data.is_video.clone(),
        }
    }

    pub fn full(data: &ExtractionData) -> Self {
        Self {
            engagement: Some(Engagement {
                likes: data.like.clone(),
                comments: data.comment.clone(),
            }),
            ..Self::brief(data)
        }
    }
}

/// Result of uploading one media item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaUploadOutcome {
    pub source_url: String,
    #[serde(flatten)]
    pub status: UploadStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UploadStatus {
    Uploaded(UploadedAsset),
    Failed { error: String },
}

impl MediaUploadOutcome {
    pub fn uploaded(source_url: impl Into<String>, asset: UploadedAsset) -> Self {
        Self {
            source_url: source_url.into(),
            status: UploadStatus::Uploaded(asset),
        }
    }

    pub fn failed(source_url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            status: UploadStatus::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_uploaded(&self) -> bool {
        matches!(self.status, UploadStatus::Uploaded(_))
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub storage: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
}
