// CORS configuration
// Any origin, method and header. Origins are mirrored rather than `*` so
// credentialed requests stay allowed.

use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn apply_cors(router: Router) -> Router {
    router.layer(cors_layer())
}
