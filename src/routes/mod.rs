//! API Routes
//!
//! - `/process_instagram_and_upload/` - Relay a post's media into Cloudinary
//! - `/api/health` - Health check (reports whether uploads are configured)
//! - `/` - Service information

pub mod health;
pub mod relay;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
///
/// Every response carries the permissive CORS headers and is traced.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let router = Router::new()
        .merge(relay::router(state.clone()))
        .merge(health::router(state));

    apply_cors(router).layer(TraceLayer::new_for_http())
}
