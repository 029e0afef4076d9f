//! Router setup and configuration.

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{health, kv};
use crate::api::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let observability = &state.config.observability;

    // Banner and probes
    let mut router = Router::new()
        .route("/", get(health::index).fallback(kv::method_not_allowed))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready));

    if observability.metrics_enabled {
        router = router.route(&observability.metrics_path, get(health::metrics));
    }

    // CRUD routes; reads carry a body too, so every operation is a POST
    let router = router
        .route("/create", post(kv::create).fallback(kv::method_not_allowed))
        .route("/read", post(kv::read).fallback(kv::method_not_allowed))
        .route("/update", post(kv::update).fallback(kv::method_not_allowed))
        .route("/delete", post(kv::delete).fallback(kv::method_not_allowed));

    // Backend calls are bounded by the pool's own timeouts only
    router
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
