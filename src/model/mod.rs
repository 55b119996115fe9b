//! Model artifact loading and inference.
//!
//! The service talks to the trained model only through the [`Classifier`]
//! trait: given an [`Observation`], return one predicted label per row. The
//! shipped implementation is [`SgdPipeline`], a linear SGD classifier with a
//! column-transformer preprocessing step, loaded from a JSON export.
//!
//! The model is loaded once at startup and shared read-only between requests,
//! so implementations must be `Send + Sync` and must not mutate themselves
//! during prediction.

mod pipeline;

pub use pipeline::{ArtifactInfo, SgdPipeline};

use std::io;

use crate::features::{ColumnKind, Observation};

/// A trained classifier that maps observations to class labels.
pub trait Classifier: Send + Sync {
    /// Estimator name, used in logs and readiness messages.
    fn name(&self) -> &str;

    /// Predict one label per row of the observation.
    fn predict(&self, observation: &Observation) -> Result<Vec<String>, ModelError>;
}

/// Errors raised while loading a model artifact or running inference.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Column '{0}' is missing from the observation")]
    MissingColumn(String),

    #[error("Column '{column}' has type {found:?}, expected {expected:?}")]
    ColumnType {
        column: String,
        expected: ColumnKind,
        found: ColumnKind,
    },

    #[error("Column '{column}' has {found} rows, expected {expected}")]
    RowCount {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Found unknown category '{value}' in column '{column}' during transform")]
    UnknownCategory { column: String, value: String },

    #[error("Column '{column}' contains a non-finite value ({value})")]
    NonFinite { column: String, value: f64 },
}
