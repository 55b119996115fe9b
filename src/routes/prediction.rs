//! Cardiovascular disease risk prediction endpoint.
//!
//! Reads the nineteen patient fields from the query string, shapes them into a
//! one-row observation and asks the shared classifier for a label. Missing or
//! non-numeric parameters are rejected before the model is touched. A repeated
//! parameter takes its last value.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use tracing::instrument;

use crate::error::AppError;
use crate::features::PatientFeatures;
use crate::state::AppState;

/// Predicts the risk class for one individual.
///
/// Responds with a one-element JSON array holding the predicted label.
#[instrument(name = "predict", skip_all)]
pub async fn predict(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<String>>, AppError> {
    let Query(pairs) = query.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    let features = parse_features(pairs)?;

    let observation = features.shape();
    let model = state.model.clone();

    // Inference is CPU-bound; keep it off the async workers
    let labels = tokio::task::spawn_blocking(move || model.predict(&observation))
        .await
        .map_err(|e| AppError::Internal(format!("Inference task failed: {}", e)))??;

    tracing::debug!(
        model = state.model.name(),
        prediction = ?labels,
        "Prediction served"
    );
    Ok(Json(labels))
}

/// Deserialize the patient fields, keeping the last value of a repeated key.
fn parse_features(pairs: Vec<(String, String)>) -> Result<PatientFeatures, AppError> {
    let mut deduped: Vec<(String, String)> = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        match deduped.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => deduped.push((key, value)),
        }
    }

    let encoded = serde_urlencoded::to_string(&deduped)
        .map_err(|e| AppError::InvalidRequest(format!("Failed to encode query string: {}", e)))?;
    serde_urlencoded::from_str(&encoded).map_err(|e| {
        AppError::InvalidRequest(format!("Failed to deserialize query string: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(query: &[(&str, &str)]) -> Vec<(String, String)> {
        query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn scenario() -> Vec<(&'static str, &'static str)> {
        vec![
            ("general_health", "Good"),
            ("checkup", "Within the past year"),
            ("exercise", "Yes"),
            ("heart_disease", "No"),
            ("skin_cancer", "No"),
            ("other_cancer", "No"),
            ("depression", "No"),
            ("diabetes", "No"),
            ("arthritis", "No"),
            ("sex", "Female"),
            ("age_category", "40-44"),
            ("height", "165.0"),
            ("weight", "70.0"),
            ("bmi", "25.7"),
            ("smoking_history", "No"),
            ("alcohol_consumption", "0.0"),
            ("fruit_consumption", "30.0"),
            ("green_vegetables_consumption", "20.0"),
            ("friedpotato_consumption", "4.0"),
        ]
    }

    #[test]
    fn test_parse_features_scenario() {
        let features = parse_features(pairs(&scenario())).unwrap();
        assert_eq!(features.sex, "Female");
        assert_eq!(features.checkup, "Within the past year");
        assert_eq!(features.height, 165.0);
    }

    #[test]
    fn test_parse_features_repeated_key_takes_last_value() {
        let mut query = scenario();
        query.push(("sex", "Male"));
        query.push(("height", "170.5"));
        let features = parse_features(pairs(&query)).unwrap();
        assert_eq!(features.sex, "Male");
        assert_eq!(features.height, 170.5);
    }

    #[test]
    fn test_parse_features_ignores_unknown_keys() {
        let mut query = scenario();
        query.push(("extra", "1"));
        assert!(parse_features(pairs(&query)).is_ok());
    }

    #[test]
    fn test_parse_features_missing_field() {
        let query: Vec<_> = scenario().into_iter().filter(|(k, _)| *k != "bmi").collect();
        let err = parse_features(pairs(&query)).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(ref detail) if detail.contains("bmi")));
    }

    #[test]
    fn test_parse_features_non_numeric_value() {
        let mut query = scenario();
        query.push(("weight", "heavy"));
        let err = parse_features(pairs(&query)).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }
}
