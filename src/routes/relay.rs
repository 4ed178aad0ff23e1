use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, warn};

use crate::models::{AppState, RelayQuery, RelayResult};
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/process_instagram_and_upload/", get(process_instagram_and_upload))
        .route("/process_instagram_and_upload", get(process_instagram_and_upload))
        .with_state(state)
}

/// GET /process_instagram_and_upload/?instagram_url=...
///
/// A missing or unreadable query is treated as an empty URL so the
/// configuration check still runs first.
pub async fn process_instagram_and_upload(
    State(state): State<AppState>,
    query: Result<Query<RelayQuery>, QueryRejection>,
) -> AppResult<Json<RelayResult>> {
    let instagram_url = match query {
        Ok(Query(query)) => query.instagram_url,
        Err(rejection) => {
            warn!(error = %rejection, "Unreadable relay query");
            String::new()
        }
    };

    info!(instagram_url = %instagram_url, "Relay request received");

    let result = state.relay.handle(&instagram_url).await?;

    info!(uploads = result.uploads.len(), "Relay response sent");

    Ok(Json(result))
}
