//! cardiorisk: an HTTP service for a cardiovascular disease risk classifier.
//!
//! Loads an exported SGD classification pipeline once at startup and serves it
//! through a root greeting, a health check and a prediction endpoint that maps
//! nineteen demographic and health fields to a risk label.

pub mod config;
pub mod error;
pub mod features;
pub mod http;
pub mod middleware;
pub mod model;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use features::{Observation, PatientFeatures};
pub use model::{Classifier, ModelError, SgdPipeline};
pub use routes::create_router;
pub use state::AppState;
