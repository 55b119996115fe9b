use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Inference failed: {0}")]
    Inference(#[from] ModelError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Inference(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::InvalidRequest(detail) => {
                tracing::debug!(detail = %detail, "Rejected request");
                detail.clone()
            }
            AppError::Inference(err) => {
                tracing::error!(error = %err, "Model inference failed");
                "Internal Server Error".to_string()
            }
            AppError::Internal(_) => {
                tracing::error!("Internal error: {:?}", self);
                "Internal Server Error".to_string()
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
