//! Axum router — maps all URL paths to handlers.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::handlers::{
    baseline::baseline,
    predict::predict,
    preprocess::preprocess,
    statistics::statistics,
    system::{health, list_models},
};
use crate::state::{AppState, SharedState};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.server.max_upload_bytes;
    let cors = cors_layer(&state.config.server.cors_origins);
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/api/health",                 get(health))
        .route("/api/models",                 get(list_models))
        .route("/api/baseline",               get(baseline))
        .route("/api/preprocess",             post(preprocess))
        .route("/api/predict",                post(predict))
        .route("/api/statistics/{cache_key}", get(statistics))

        // Middleware
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
