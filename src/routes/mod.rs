//! HTTP route handlers.
//!
//! Every response carries `Cache-Control: no-store`: predictions are computed
//! per request and the liveness endpoints must always be answered fresh.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod health;
pub mod home;
pub mod prediction;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CACHE_CONTROL_NO_STORE;
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Creates the Axum router with all routes and response headers.
pub fn create_router(state: AppState) -> Router {
    // Liveness probes
    let liveness_routes = Router::new()
        .route("/", get(home::index))
        .route("/health", get(health::health));

    let prediction_routes =
        Router::new().route("/cvd/risks/prediction", get(prediction::predict));

    Router::new()
        .merge(liveness_routes)
        .merge(prediction_routes)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_STORE),
        ))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
