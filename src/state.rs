//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::model::Classifier;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// The model is loaded once at startup and never mutated afterwards, so
/// concurrent predictions share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub model: Arc<dyn Classifier>,
}

impl AppState {
    /// Creates a new application state from the configuration and a loaded model.
    pub fn new(config: AppConfig, model: Arc<dyn Classifier>) -> Self {
        Self {
            config: Arc::new(config),
            model,
        }
    }
}
