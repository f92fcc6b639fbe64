//! Master router: setup, services, the API gateway, and the ambient layers.

use crate::handlers::{gateway, services, setup};
use crate::routes::common_routes;
use crate::state::HarnessState;
use axum::routing::{any, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Cross-origin access is wide open: the suites consuming the script run on
/// a different origin than the harness.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn harness_routes(state: HarnessState, body_limit: usize) -> Router {
    Router::new()
        .route("/setup", post(setup))
        .route("/services", get(services))
        .route("/api", any(gateway))
        .route("/api/", any(gateway))
        .route("/api/*path", any(gateway))
        .with_state(state)
        .merge(common_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(RequestBodyLimitLayer::new(body_limit))
}
