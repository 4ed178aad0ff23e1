// Asset storage layer (Cloudinary)

pub mod cloudinary;

pub use cloudinary::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Per-item upload failure. Never aborts a relay request.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The asset host answered and rejected the upload
    #[error("Cloudinary upload failed: {0}")]
    Provider(String),

    /// Transport failures, timeouts and undecodable responses
    #[error("An unexpected error occurred during Cloudinary upload: {0}")]
    Unexpected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceType {
    /// Let the asset host detect image, video or raw
    #[default]
    Auto,
    Image,
    Video,
    Raw,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Auto => "auto",
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Raw => "raw",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub source_url: String,
    pub resource_type: ResourceType,
    pub folder: String,
}

/// A hosted copy of one media item.
///
/// Decoded from the upload response (`secure_url`) and serialized for callers
/// as `cloudinary_url`. Dimensions are passed through as the host sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedAsset {
    #[serde(rename(serialize = "cloudinary_url", deserialize = "secure_url"))]
    pub secure_url: Option<String>,
    pub public_id: Option<String>,
    pub resource_type: Option<String>,
    pub format: Option<String>,
    pub width: Option<Value>,
    pub height: Option<Value>,
}

/// A media host that ingests a remote URL and keeps a durable copy.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadedAsset, UploadError>;
}
