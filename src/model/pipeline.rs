//! Linear SGD classification pipeline loaded from a JSON export.
//!
//! The artifact describes a column transformer (one-hot encoding, standard
//! scaling, passthrough) followed by a linear classifier. Transformers emit
//! features in the order they are listed, and their outputs are concatenated
//! before the decision function is applied.

use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{Classifier, ModelError};
use crate::features::{column_kind, Column, ColumnKind, Observation};

/// What to do with a categorical value that was not seen during training.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum HandleUnknown {
    /// Fail the prediction
    #[default]
    Error,
    /// Encode the value as all-zero indicators
    Ignore,
}

/// A preprocessing step applied to a group of columns.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Transformer {
    OneHot {
        columns: Vec<String>,
        categories: Vec<Vec<String>>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    StandardScaler {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    Passthrough {
        columns: Vec<String>,
    },
}

impl Transformer {
    fn columns(&self) -> &[String] {
        match self {
            Transformer::OneHot { columns, .. }
            | Transformer::StandardScaler { columns, .. }
            | Transformer::Passthrough { columns } => columns,
        }
    }

    fn input_kind(&self) -> ColumnKind {
        match self {
            Transformer::OneHot { .. } => ColumnKind::Text,
            _ => ColumnKind::Number,
        }
    }

    /// Number of features this step contributes to the model input.
    pub fn n_features_out(&self) -> usize {
        match self {
            Transformer::OneHot { categories, .. } => categories.iter().map(Vec::len).sum(),
            Transformer::StandardScaler { columns, .. } | Transformer::Passthrough { columns } => {
                columns.len()
            }
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        let columns = self.columns();
        if columns.is_empty() {
            return Err(invalid("transformer has no columns"));
        }

        let expected = self.input_kind();
        for column in columns {
            match column_kind(column) {
                None => {
                    return Err(invalid(format!("unknown feature column '{}'", column)));
                }
                Some(kind) if kind != expected => {
                    return Err(invalid(format!(
                        "column '{}' has type {:?}, transformer expects {:?}",
                        column, kind, expected
                    )));
                }
                Some(_) => {}
            }
        }

        match self {
            Transformer::OneHot { categories, .. } => {
                if categories.len() != columns.len() {
                    return Err(invalid(format!(
                        "one_hot has {} category lists for {} columns",
                        categories.len(),
                        columns.len()
                    )));
                }
                if let Some(i) = categories.iter().position(Vec::is_empty) {
                    return Err(invalid(format!("no categories for column '{}'", columns[i])));
                }
            }
            Transformer::StandardScaler { mean, scale, .. } => {
                if mean.len() != columns.len() || scale.len() != columns.len() {
                    return Err(invalid(format!(
                        "standard_scaler has {} means and {} scales for {} columns",
                        mean.len(),
                        scale.len(),
                        columns.len()
                    )));
                }
            }
            Transformer::Passthrough { .. } => {}
        }

        Ok(())
    }

    /// Append the encoded features of one row to `out`.
    fn transform_row(
        &self,
        observation: &Observation,
        row: usize,
        out: &mut Vec<f64>,
    ) -> Result<(), ModelError> {
        match self {
            Transformer::OneHot {
                columns,
                categories,
                handle_unknown,
            } => {
                for (column, known) in columns.iter().zip(categories) {
                    let value = text_value(observation, column, row)?;
                    let position = known.iter().position(|category| category == value);
                    if position.is_none() && *handle_unknown == HandleUnknown::Error {
                        return Err(ModelError::UnknownCategory {
                            column: column.clone(),
                            value: value.to_string(),
                        });
                    }
                    out.extend((0..known.len()).map(|i| if Some(i) == position { 1.0 } else { 0.0 }));
                }
            }
            Transformer::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                for ((column, mean), scale) in columns.iter().zip(mean).zip(scale) {
                    let value = number_value(observation, column, row)?;
                    // Zero-variance columns are only centred
                    let scale = if *scale == 0.0 { 1.0 } else { *scale };
                    out.push((value - mean) / scale);
                }
            }
            Transformer::Passthrough { columns } => {
                for column in columns {
                    out.push(number_value(observation, column, row)?);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Artifact {
    estimator: String,
    transformers: Vec<Transformer>,
    classes: Vec<String>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

/// Summary of a loaded artifact, for startup logging.
#[derive(Debug, Clone)]
pub struct ArtifactInfo {
    pub estimator: String,
    /// Hex-encoded SHA-256 of the artifact file
    pub sha256: String,
    pub n_features: usize,
    pub classes: Vec<String>,
}

/// Column transformer + linear SGD classifier.
#[derive(Debug, Clone)]
pub struct SgdPipeline {
    transformers: Vec<Transformer>,
    classes: Vec<String>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    info: ArtifactInfo,
}

impl SgdPipeline {
    /// Load and validate a pipeline export from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    /// Parse and validate a pipeline export from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let sha256 = format!("{:x}", Sha256::digest(bytes));
        let artifact: Artifact = serde_json::from_slice(bytes)?;

        for transformer in &artifact.transformers {
            transformer.validate()?;
        }
        let n_features: usize = artifact
            .transformers
            .iter()
            .map(Transformer::n_features_out)
            .sum();
        if n_features == 0 {
            return Err(invalid("pipeline produces no features"));
        }

        let n_classes = artifact.classes.len();
        if n_classes < 2 {
            return Err(invalid(format!("expected at least 2 classes, found {}", n_classes)));
        }
        let expected_rows = if n_classes == 2 { 1 } else { n_classes };
        if artifact.coef.len() != expected_rows {
            return Err(invalid(format!(
                "coef has {} rows, expected {} for {} classes",
                artifact.coef.len(),
                expected_rows,
                n_classes
            )));
        }
        if artifact.intercept.len() != expected_rows {
            return Err(invalid(format!(
                "intercept has {} values, expected {}",
                artifact.intercept.len(),
                expected_rows
            )));
        }
        if let Some(row) = artifact.coef.iter().find(|row| row.len() != n_features) {
            return Err(invalid(format!(
                "coef row has {} weights, transformers produce {} features",
                row.len(),
                n_features
            )));
        }

        let info = ArtifactInfo {
            estimator: artifact.estimator,
            sha256,
            n_features,
            classes: artifact.classes.clone(),
        };

        Ok(Self {
            transformers: artifact.transformers,
            classes: artifact.classes,
            coef: artifact.coef,
            intercept: artifact.intercept,
            info,
        })
    }

    pub fn info(&self) -> &ArtifactInfo {
        &self.info
    }

    /// Check every transformer column against the observation before encoding.
    fn check_columns(&self, observation: &Observation) -> Result<usize, ModelError> {
        let n_rows = observation.n_rows();
        for transformer in &self.transformers {
            let expected = transformer.input_kind();
            for name in transformer.columns() {
                let column = observation
                    .column(name)
                    .ok_or_else(|| ModelError::MissingColumn(name.clone()))?;
                if column.kind() != expected {
                    return Err(ModelError::ColumnType {
                        column: name.clone(),
                        expected,
                        found: column.kind(),
                    });
                }
                if column.len() != n_rows {
                    return Err(ModelError::RowCount {
                        column: name.clone(),
                        expected: n_rows,
                        found: column.len(),
                    });
                }
            }
        }
        Ok(n_rows)
    }

    fn decision(&self, features: &[f64]) -> &str {
        let scores: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(weights, bias)| {
                weights
                    .iter()
                    .zip(features)
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + bias
            })
            .collect();

        if let [score] = scores.as_slice() {
            let class = if *score > 0.0 { 1 } else { 0 };
            return self.classes[class].as_str();
        }

        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = i;
            }
        }
        self.classes[best].as_str()
    }
}

impl Classifier for SgdPipeline {
    fn name(&self) -> &str {
        &self.info.estimator
    }

    fn predict(&self, observation: &Observation) -> Result<Vec<String>, ModelError> {
        let n_rows = self.check_columns(observation)?;
        let mut labels = Vec::with_capacity(n_rows);
        let mut features = Vec::with_capacity(self.info.n_features);

        for row in 0..n_rows {
            features.clear();
            for transformer in &self.transformers {
                transformer.transform_row(observation, row, &mut features)?;
            }
            labels.push(self.decision(&features).to_string());
        }

        tracing::trace!(rows = n_rows, labels = ?labels, "Pipeline prediction");
        Ok(labels)
    }
}

fn invalid(message: impl Into<String>) -> ModelError {
    ModelError::InvalidArtifact(message.into())
}

fn text_value<'a>(
    observation: &'a Observation,
    column: &str,
    row: usize,
) -> Result<&'a str, ModelError> {
    match observation.column(column) {
        Some(Column::Text(values)) => values
            .get(row)
            .map(String::as_str)
            .ok_or_else(|| ModelError::MissingColumn(column.to_string())),
        Some(other) => Err(ModelError::ColumnType {
            column: column.to_string(),
            expected: ColumnKind::Text,
            found: other.kind(),
        }),
        None => Err(ModelError::MissingColumn(column.to_string())),
    }
}

fn number_value(observation: &Observation, column: &str, row: usize) -> Result<f64, ModelError> {
    let value = match observation.column(column) {
        Some(Column::Number(values)) => values
            .get(row)
            .copied()
            .ok_or_else(|| ModelError::MissingColumn(column.to_string()))?,
        Some(other) => {
            return Err(ModelError::ColumnType {
                column: column.to_string(),
                expected: ColumnKind::Number,
                found: other.kind(),
            })
        }
        None => return Err(ModelError::MissingColumn(column.to_string())),
    };

    if !value.is_finite() {
        return Err(ModelError::NonFinite {
            column: column.to_string(),
            value,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::sample_features;
    use serde_json::json;
    use std::io::Write;

    /// Pipeline over Sex and BMI only: score = 2*[Male] - 1*[Female] + 0.5*scaled_bmi - 0.25
    fn small_artifact(handle_unknown: &str) -> serde_json::Value {
        json!({
            "estimator": "SGDClassifier",
            "transformers": [
                {
                    "kind": "one_hot",
                    "columns": ["Sex"],
                    "categories": [["Female", "Male"]],
                    "handle_unknown": handle_unknown
                },
                {
                    "kind": "standard_scaler",
                    "columns": ["BMI"],
                    "mean": [25.0],
                    "scale": [5.0]
                }
            ],
            "classes": ["Low Risk", "High Risk"],
            "coef": [[-1.0, 2.0, 0.5]],
            "intercept": [-0.25]
        })
    }

    fn pipeline(value: serde_json::Value) -> Result<SgdPipeline, ModelError> {
        SgdPipeline::from_slice(value.to_string().as_bytes())
    }

    #[test]
    fn test_binary_prediction_negative_score() {
        let model = pipeline(small_artifact("error")).unwrap();
        // Female, BMI 25.7: -1 + 0.5 * 0.14 - 0.25 < 0
        let labels = model.predict(&sample_features().shape()).unwrap();
        assert_eq!(labels, vec!["Low Risk".to_string()]);
    }

    #[test]
    fn test_binary_prediction_positive_score() {
        let model = pipeline(small_artifact("error")).unwrap();
        let mut features = sample_features();
        features.sex = "Male".to_string();
        let labels = model.predict(&features.shape()).unwrap();
        assert_eq!(labels, vec!["High Risk".to_string()]);
    }

    #[test]
    fn test_zero_score_picks_first_class() {
        let mut artifact = small_artifact("error");
        artifact["coef"] = json!([[0.0, 0.0, 0.0]]);
        artifact["intercept"] = json!([0.0]);
        let model = pipeline(artifact).unwrap();
        let labels = model.predict(&sample_features().shape()).unwrap();
        assert_eq!(labels, vec!["Low Risk".to_string()]);
    }

    #[test]
    fn test_unknown_category_errors() {
        let model = pipeline(small_artifact("error")).unwrap();
        let mut features = sample_features();
        features.sex = "Unknown".to_string();
        let err = model.predict(&features.shape()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnknownCategory { ref column, ref value } if column == "Sex" && value == "Unknown"
        ));
    }

    #[test]
    fn test_unknown_category_ignored() {
        let model = pipeline(small_artifact("ignore")).unwrap();
        let mut features = sample_features();
        features.sex = "Unknown".to_string();
        features.bmi = 40.0;
        // 0.5 * 3.0 - 0.25 > 0
        let labels = model.predict(&features.shape()).unwrap();
        assert_eq!(labels, vec!["High Risk".to_string()]);
    }

    #[test]
    fn test_handle_unknown_defaults_to_error() {
        let mut artifact = small_artifact("error");
        artifact["transformers"][0]
            .as_object_mut()
            .unwrap()
            .remove("handle_unknown");
        let model = pipeline(artifact).unwrap();
        let mut features = sample_features();
        features.sex = "Other".to_string();
        assert!(model.predict(&features.shape()).is_err());
    }

    #[test]
    fn test_non_finite_value_errors() {
        let model = pipeline(small_artifact("error")).unwrap();
        let mut features = sample_features();
        features.bmi = f64::NAN;
        let err = model.predict(&features.shape()).unwrap_err();
        assert!(matches!(err, ModelError::NonFinite { ref column, .. } if column == "BMI"));
    }

    #[test]
    fn test_zero_scale_only_centres() {
        let mut artifact = small_artifact("error");
        artifact["transformers"][1]["scale"] = json!([0.0]);
        artifact["coef"] = json!([[0.0, 0.0, 1.0]]);
        artifact["intercept"] = json!([0.0]);
        let model = pipeline(artifact).unwrap();
        let mut features = sample_features();
        features.bmi = 25.5;
        let labels = model.predict(&features.shape()).unwrap();
        assert_eq!(labels, vec!["High Risk".to_string()]);
    }

    #[test]
    fn test_multiclass_picks_highest_score() {
        let artifact = json!({
            "estimator": "SGDClassifier",
            "transformers": [
                {"kind": "passthrough", "columns": ["Fruit_Consumption"]}
            ],
            "classes": ["Low Risk", "Medium Risk", "High Risk"],
            "coef": [[0.1], [-0.1], [0.0]],
            "intercept": [0.0, 0.0, 1.0]
        });
        let model = pipeline(artifact).unwrap();
        // scores: 3.0, -3.0, 1.0
        let labels = model.predict(&sample_features().shape()).unwrap();
        assert_eq!(labels, vec!["Low Risk".to_string()]);
    }

    #[test]
    fn test_multiclass_tie_goes_to_first() {
        let artifact = json!({
            "estimator": "SGDClassifier",
            "transformers": [
                {"kind": "passthrough", "columns": ["Alcohol_Consumption"]}
            ],
            "classes": ["a", "b", "c"],
            "coef": [[0.0], [1.0], [1.0]],
            "intercept": [0.0, 2.0, 2.0]
        });
        let model = pipeline(artifact).unwrap();
        let labels = model.predict(&sample_features().shape()).unwrap();
        assert_eq!(labels, vec!["b".to_string()]);
    }

    #[test]
    fn test_rejects_coef_width_mismatch() {
        let mut artifact = small_artifact("error");
        artifact["coef"] = json!([[1.0, 2.0]]);
        let err = pipeline(artifact).unwrap_err();
        assert!(matches!(err, ModelError::InvalidArtifact(_)));
    }

    #[test]
    fn test_rejects_intercept_mismatch() {
        let mut artifact = small_artifact("error");
        artifact["intercept"] = json!([0.0, 1.0]);
        assert!(matches!(
            pipeline(artifact).unwrap_err(),
            ModelError::InvalidArtifact(_)
        ));
    }

    #[test]
    fn test_rejects_single_class() {
        let mut artifact = small_artifact("error");
        artifact["classes"] = json!(["Low Risk"]);
        assert!(matches!(
            pipeline(artifact).unwrap_err(),
            ModelError::InvalidArtifact(_)
        ));
    }

    #[test]
    fn test_rejects_unknown_column() {
        let mut artifact = small_artifact("error");
        artifact["transformers"][1]["columns"] = json!(["Cholesterol"]);
        let err = pipeline(artifact).unwrap_err();
        assert!(err.to_string().contains("Cholesterol"));
    }

    #[test]
    fn test_rejects_kind_mismatch() {
        let mut artifact = small_artifact("error");
        artifact["transformers"][1]["columns"] = json!(["Sex"]);
        assert!(matches!(
            pipeline(artifact).unwrap_err(),
            ModelError::InvalidArtifact(_)
        ));
    }

    #[test]
    fn test_rejects_category_list_mismatch() {
        let mut artifact = small_artifact("error");
        artifact["transformers"][0]["categories"] = json!([["Female", "Male"], ["Yes"]]);
        assert!(matches!(
            pipeline(artifact).unwrap_err(),
            ModelError::InvalidArtifact(_)
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = SgdPipeline::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SgdPipeline::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }

    #[test]
    fn test_load_records_digest_and_info() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = small_artifact("error").to_string();
        file.write_all(body.as_bytes()).unwrap();

        let model = SgdPipeline::load(file.path()).unwrap();
        let info = model.info();
        assert_eq!(model.name(), "SGDClassifier");
        assert_eq!(info.n_features, 3);
        assert_eq!(info.classes, vec!["Low Risk", "High Risk"]);
        assert_eq!(info.sha256.len(), 64);
        assert_eq!(info.sha256, format!("{:x}", Sha256::digest(body.as_bytes())));
    }

    #[test]
    fn test_shipped_artifact_predicts_scenario() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/sgd_pipeline.json");
        let model = SgdPipeline::load(path).unwrap();
        assert_eq!(model.info().n_features, 50);
        let labels = model.predict(&sample_features().shape()).unwrap();
        assert_eq!(labels, vec!["Low Risk".to_string()]);
    }
}
