//! Root greeting endpoint.

use axum::Json;
use serde_json::{json, Value};

/// Returns a fixed `{"Hello": "World"}` mapping.
pub async fn index() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}
