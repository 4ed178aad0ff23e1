use axum::{extract::State, routing::get, Json, Router};
use crate::models::{AppState, HealthResponse, ServiceInfo};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/api/health", get(health_check))
        .with_state(state)
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "Instagram Media Uploader to Cloudinary",
        description: "Fetches media from an Instagram URL, uploads it to Cloudinary, and returns Cloudinary links.",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = if state.relay.is_configured() {
        "configured"
    } else {
        "unconfigured"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage: storage.to_string(),
    })
}
