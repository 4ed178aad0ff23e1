//! Relay pipeline
//!
//! One request runs four stages, strictly in order:
//!
//! 1. **Extraction**: ask the extraction provider about the post and
//!    classify its answer (timeouts, transport failures, malformed or
//!    negative answers abort the request)
//! 2. **Media URL extraction**: pick the `http` URLs out of the payload
//! 3. **Upload**: hand each URL to the asset store, one at a time; a failed
//!    item is recorded and the loop moves on
//! 4. **Aggregation**: assemble the [`RelayResult`]

use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use crate::extraction::{self, ExtractionProvider};
use crate::models::{DataSummary, MediaUploadOutcome, RelayQuery, RelayResult};
use crate::storage::{AssetStore, ResourceType, UploadRequest};
use crate::types::{AppError, AppResult};

pub const PROCESSING_COMPLETE: &str = "Processing complete.";
pub const NO_MEDIA_FOUND: &str =
    "No media items found or extractable for the given Instagram URL via the external API.";

pub struct RelayService {
    extractor: Arc<dyn ExtractionProvider>,
    store: Option<Arc<dyn AssetStore>>,
    folder: String,
}

impl RelayService {
    /// `store` is `None` when asset-store credentials are incomplete; every
    /// request is then refused with a configuration error.
    pub fn new(
        extractor: Arc<dyn ExtractionProvider>,
        store: Option<Arc<dyn AssetStore>>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            extractor,
            store,
            folder: folder.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub async fn handle(&self, source_url: &str) -> AppResult<RelayResult> {
        let store = self.store.as_ref().ok_or(AppError::Configuration)?;

        let query = RelayQuery {
            instagram_url: source_url.to_string(),
        };
        query
            .validate()
            .map_err(|_| AppError::InvalidInput("Instagram URL cannot be empty.".to_string()))?;

        let raw = self.extractor.fetch(source_url).await?;
        let data = extraction::classify(raw)?;
        info!("Extraction provider reported success");

        let media_urls = extraction::extract_media_urls(&data);
        if media_urls.is_empty() {
            info!("No media URLs found in the extraction response");
            return Ok(RelayResult {
                message: NO_MEDIA_FOUND.to_string(),
                instagram_url: source_url.to_string(),
                summary: DataSummary::brief(&data),
                uploads: Vec::new(),
            });
        }

        info!(count = media_urls.len(), "Uploading media items");
        let uploads = self.upload_all(&**store, &media_urls).await;

        let uploaded = uploads.iter().filter(|o| o.is_uploaded()).count();
        info!(uploaded, failed = uploads.len() - uploaded, "Finished processing all media items");

        Ok(RelayResult {
            message: PROCESSING_COMPLETE.to_string(),
            instagram_url: source_url.to_string(),
            summary: DataSummary::full(&data),
            uploads,
        })
    }

    /// One outcome per URL, in input order. Never fails as a whole.
    async fn upload_all(&self, store: &dyn AssetStore, media_urls: &[String]) -> Vec<MediaUploadOutcome> {
        let total = media_urls.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, media_url) in media_urls.iter().enumerate() {
            info!(item = index + 1, total, source = %media_url, "Uploading media item");

            let request = UploadRequest {
                source_url: media_url.clone(),
                resource_type: ResourceType::Auto,
                folder: self.folder.clone(),
            };

            let outcome = match store.upload(&request).await {
                Ok(asset) => {
                    info!(url = ?asset.secure_url, "Uploaded media item");
                    MediaUploadOutcome::uploaded(media_url.as_str(), asset)
                }
                Err(e) => {
                    warn!(error = %e, source = %media_url, "Media item upload failed");
                    MediaUploadOutcome::failed(media_url.as_str(), e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::extraction::{ExtractionError, ExtractionProvider};
    use crate::storage::{AssetStore, UploadError, UploadRequest, UploadedAsset};

    /// Extraction provider returning a canned answer
    pub struct StaticExtractor {
        pub answer: Mutex<Option<Result<Value, ExtractionError>>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl StaticExtractor {
        pub fn new(answer: Result<Value, ExtractionError>) -> Self {
            Self {
                answer: Mutex::new(Some(answer)),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ExtractionProvider for StaticExtractor {
        async fn fetch(&self, source_url: &str) -> Result<Value, ExtractionError> {
            self.calls.lock().unwrap().push(source_url.to_string());
            self.answer
                .lock()
                .unwrap()
                .take()
                .expect("extractor called more than once")
        }
    }

    /// Asset store that fails the listed source URLs with a provider error
    /// (or an unexpected one for URLs containing "boom") and uploads the rest.
    #[derive(Default)]
    pub struct RecordingStore {
        pub failing: Vec<String>,
        pub requests: Mutex<Vec<UploadRequest>>,
    }

    impl RecordingStore {
        pub fn failing(urls: &[&str]) -> Self {
            Self {
                failing: urls.iter().map(|u| u.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn uploaded_sources(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.source_url.clone())
                .collect()
        }
    }

    pub fn asset_for(source_url: &str) -> UploadedAsset {
        let name = source_url.rsplit('/').next().unwrap_or("asset");
        UploadedAsset {
            secure_url: Some(format!("https://res.cloudinary.com/demo/image/upload/{name}")),
            public_id: Some(format!("instagram_imports/{name}")),
            resource_type: Some("image".to_string()),
            format: Some("jpg".to_string()),
            width: Some(Value::from(1080)),
            height: Some(Value::from(1080)),
        }
    }

    #[async_trait]
    impl AssetStore for RecordingStore {
        async fn upload(&self, request: &UploadRequest) -> Result<UploadedAsset, UploadError> {
            self.requests.lock().unwrap().push(request.clone());
            if request.source_url.contains("boom") {
                return Err(UploadError::Unexpected("connection reset".to_string()));
            }
            if self.failing.contains(&request.source_url) {
                return Err(UploadError::Provider("Resource not found".to_string()));
            }
            Ok(asset_for(&request.source_url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{asset_for, RecordingStore, StaticExtractor};
    use super::*;
    use crate::extraction::ExtractionError;
    use crate::models::UploadStatus;
    use serde_json::{json, Value};

    const POST: &str = "https://instagram.com/p/ABC";

    fn service(
        answer: Result<Value, ExtractionError>,
        store: Option<Arc<RecordingStore>>,
    ) -> (RelayService, Arc<StaticExtractor>) {
        let extractor = Arc::new(StaticExtractor::new(answer));
        let store = store.map(|s| s as Arc<dyn AssetStore>);
        (
            RelayService::new(extractor.clone(), store, "instagram_imports"),
            extractor,
        )
    }

    #[tokio::test]
    async fn test_example_post_is_relayed() {
        let store = Arc::new(RecordingStore::default());
        let (relay, _) = service(
            Ok(json!({
                "success": true,
                "data": {
                    "url": ["http://x/img.jpg"],
                    "caption": "hi",
                    "username": "bob",
                    "like": 5,
                    "comment": 2,
                    "isVideo": false
                }
            })),
            Some(store.clone()),
        );

        let result = relay.handle(POST).await.unwrap();

        assert_eq!(result.message, PROCESSING_COMPLETE);
        assert_eq!(result.instagram_url, POST);
        assert_eq!(
            serde_json::to_value(&result.summary).unwrap(),
            json!({"caption": "hi", "username": "bob", "likes": 5, "comments": 2, "is_video": false})
        );
        assert_eq!(
            result.uploads,
            vec![MediaUploadOutcome::uploaded("http://x/img.jpg", asset_for("http://x/img.jpg"))]
        );

        let requests = store.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].resource_type, ResourceType::Auto);
        assert_eq!(requests[0].folder, "instagram_imports");
    }

    #[tokio::test]
    async fn test_failed_item_is_recorded_and_loop_continues() {
        let urls = [
            "https://cdn.example/1.jpg",
            "https://cdn.example/2.jpg",
            "https://cdn.example/3.jpg",
            "https://cdn.example/boom.mp4",
            "https://cdn.example/5.jpg",
        ];
        let store = Arc::new(RecordingStore::failing(&["https://cdn.example/2.jpg"]));
        let (relay, _) = service(
            Ok(json!({"success": true, "data": {"url": urls}})),
            Some(store.clone()),
        );

        let result = relay.handle(POST).await.unwrap();

        assert_eq!(result.message, PROCESSING_COMPLETE);
        assert_eq!(result.uploads.len(), urls.len());
        for (outcome, url) in result.uploads.iter().zip(urls) {
            assert_eq!(outcome.source_url, url);
        }
        assert_eq!(
            result.uploads[1].status,
            UploadStatus::Failed {
                error: "Cloudinary upload failed: Resource not found".to_string()
            }
        );
        assert_eq!(
            result.uploads[3].status,
            UploadStatus::Failed {
                error: "An unexpected error occurred during Cloudinary upload: connection reset"
                    .to_string()
            }
        );
        for index in [0, 2, 4] {
            assert!(result.uploads[index].is_uploaded());
        }
        assert_eq!(store.uploaded_sources(), urls.to_vec());
    }

    #[tokio::test]
    async fn test_duplicates_are_uploaded_again() {
        let store = Arc::new(RecordingStore::default());
        let (relay, _) = service(
            Ok(json!({"success": true, "data": {"url": ["http://x/a.jpg", "http://x/a.jpg"]}})),
            Some(store.clone()),
        );

        let result = relay.handle(POST).await.unwrap();
        assert_eq!(result.uploads.len(), 2);
        assert_eq!(store.uploaded_sources().len(), 2);
    }

    #[tokio::test]
    async fn test_no_media_short_circuits() {
        for url_field in [Value::Null, json!(12), json!(["ftp://x", 3]), json!("data:abc")] {
            let store = Arc::new(RecordingStore::default());
            let (relay, _) = service(
                Ok(json!({
                    "success": true,
                    "data": {"url": url_field, "caption": "hi", "username": "bob", "like": 9, "isVideo": true}
                })),
                Some(store.clone()),
            );

            let result = relay.handle(POST).await.unwrap();

            assert_eq!(result.message, NO_MEDIA_FOUND);
            assert!(result.uploads.is_empty());
            assert_eq!(
                serde_json::to_value(&result.summary).unwrap(),
                json!({"caption": "hi", "username": "bob", "is_video": true})
            );
            assert!(store.uploaded_sources().is_empty());
        }
    }

    #[tokio::test]
    async fn test_unconfigured_store_refuses_any_input() {
        for input in ["", POST] {
            let (relay, extractor) = service(Ok(json!({"success": true})), None);
            assert!(!relay.is_configured());
            assert!(matches!(relay.handle(input).await, Err(AppError::Configuration)));
            assert_eq!(extractor.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_before_extraction() {
        let (relay, extractor) = service(
            Ok(json!({"success": true})),
            Some(Arc::new(RecordingStore::default())),
        );
        assert!(matches!(relay.handle("").await, Err(AppError::InvalidInput(_))));
        assert_eq!(extractor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_forwarded() {
        let store = Arc::new(RecordingStore::default());
        let (relay, _) = service(
            Ok(json!({"success": false, "message": "This post is private"})),
            Some(store.clone()),
        );

        match relay.handle(POST).await {
            Err(err @ AppError::UpstreamReportedFailure(_)) => {
                assert!(err.to_string().contains("This post is private"));
            }
            other => panic!("expected reported failure, got {:?}", other),
        }
        assert!(store.uploaded_sources().is_empty());
    }

    #[tokio::test]
    async fn test_transport_errors_map_to_gateway_errors() {
        let cases = [
            (ExtractionError::Timeout, "upstream_timeout"),
            (ExtractionError::Transport("refused".into()), "upstream_unavailable"),
            (
                ExtractionError::Status { status: 500, body: "oops".into() },
                "upstream_unavailable",
            ),
            (ExtractionError::InvalidJson("eof".into()), "upstream_protocol_error"),
        ];

        for (error, code) in cases {
            let (relay, _) = service(Err(error), Some(Arc::new(RecordingStore::default())));
            let err = relay.handle(POST).await.unwrap_err();
            assert_eq!(err.code(), code);
        }
    }
}
