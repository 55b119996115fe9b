//! Health check endpoint for container orchestration.
//!
//! Used by Kubernetes, ECS, systemd, and load balancers to verify the service
//! is alive. The model is loaded before the listener starts, so a process that
//! answers here already holds a usable classifier.

use axum::Json;

use crate::config::HEALTH_MESSAGE;

/// Health check handler.
///
/// Returns a static readiness token as a JSON string. It does not run the
/// model.
pub async fn health() -> Json<&'static str> {
    Json(HEALTH_MESSAGE)
}
