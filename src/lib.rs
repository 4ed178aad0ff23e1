// Media Relay - fetches Instagram post media through an extraction API and re-hosts it on Cloudinary

pub mod config;
pub mod extraction; // Extraction provider client and response records
pub mod middleware;
pub mod models;
pub mod relay;      // The fetch -> validate -> upload -> aggregate pipeline
pub mod routes;
pub mod storage;    // Cloudinary asset store
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use relay::RelayService;
pub use types::{AppError, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
