//! Feature shaping for the risk classifier.
//!
//! Converts the nineteen typed patient fields received over HTTP into a
//! single-row [`Observation`] whose column names and order match what the
//! trained pipeline was fitted on. The column names are a naming contract:
//! the model matches columns by exact name, so case, underscores and
//! parentheses all matter.

use serde::Deserialize;

/// Storage type of an observation column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Categorical code, encoded by the model's preprocessing step
    Text,
    /// Raw numeric measurement
    Number,
}

/// Canonical column table, in the order the model expects.
pub const FEATURE_COLUMNS: [(&str, ColumnKind); 19] = [
    ("General_Health", ColumnKind::Text),
    ("Checkup", ColumnKind::Text),
    ("Exercise", ColumnKind::Text),
    ("Heart_Disease", ColumnKind::Text),
    ("Skin_Cancer", ColumnKind::Text),
    ("Other_Cancer", ColumnKind::Text),
    ("Depression", ColumnKind::Text),
    ("Diabetes", ColumnKind::Text),
    ("Arthritis", ColumnKind::Text),
    ("Sex", ColumnKind::Text),
    ("Age_Category", ColumnKind::Text),
    ("Height_(cm)", ColumnKind::Number),
    ("Weight_(kg)", ColumnKind::Number),
    ("BMI", ColumnKind::Number),
    ("Smoking_History", ColumnKind::Text),
    ("Alcohol_Consumption", ColumnKind::Number),
    ("Fruit_Consumption", ColumnKind::Number),
    ("Green_Vegetables_Consumption", ColumnKind::Number),
    ("FriedPotato_Consumption", ColumnKind::Number),
];

/// Look up the kind of a canonical column by name.
pub fn column_kind(name: &str) -> Option<ColumnKind> {
    FEATURE_COLUMNS
        .iter()
        .find(|(column, _)| *column == name)
        .map(|(_, kind)| *kind)
}

/// Demographic and health data for a single individual.
///
/// Field names double as the query parameter names of the prediction
/// endpoint. Categorical values are not checked against the model's known
/// categories here; that happens (or not) inside the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PatientFeatures {
    pub general_health: String,
    pub checkup: String,
    pub exercise: String,
    pub heart_disease: String,
    pub skin_cancer: String,
    pub other_cancer: String,
    pub depression: String,
    pub diabetes: String,
    pub arthritis: String,
    pub sex: String,
    pub age_category: String,
    pub height: f64,
    pub weight: f64,
    pub bmi: f64,
    pub smoking_history: String,
    pub alcohol_consumption: f64,
    pub fruit_consumption: f64,
    pub green_vegetables_consumption: f64,
    pub friedpotato_consumption: f64,
}

impl PatientFeatures {
    /// Shape the fields into a one-row observation with the model's column names.
    pub fn shape(&self) -> Observation {
        let text = |value: &String| Column::Text(vec![value.clone()]);
        let number = |value: f64| Column::Number(vec![value]);

        Observation {
            columns: vec![
                ("General_Health", text(&self.general_health)),
                ("Checkup", text(&self.checkup)),
                ("Exercise", text(&self.exercise)),
                ("Heart_Disease", text(&self.heart_disease)),
                ("Skin_Cancer", text(&self.skin_cancer)),
                ("Other_Cancer", text(&self.other_cancer)),
                ("Depression", text(&self.depression)),
                ("Diabetes", text(&self.diabetes)),
                ("Arthritis", text(&self.arthritis)),
                ("Sex", text(&self.sex)),
                ("Age_Category", text(&self.age_category)),
                ("Height_(cm)", number(self.height)),
                ("Weight_(kg)", number(self.weight)),
                ("BMI", number(self.bmi)),
                ("Smoking_History", text(&self.smoking_history)),
                ("Alcohol_Consumption", number(self.alcohol_consumption)),
                ("Fruit_Consumption", number(self.fruit_consumption)),
                (
                    "Green_Vegetables_Consumption",
                    number(self.green_vegetables_consumption),
                ),
                ("FriedPotato_Consumption", number(self.friedpotato_consumption)),
            ],
        }
    }
}

impl From<PatientFeatures> for Observation {
    fn from(features: PatientFeatures) -> Self {
        features.shape()
    }
}

/// A single column of an observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<String>),
    Number(Vec<f64>),
}

impl Column {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Text(_) => ColumnKind::Text,
            Column::Number(_) => ColumnKind::Number,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Text(values) => values.len(),
            Column::Number(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A tabular record with named, ordered columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    columns: Vec<(&'static str, Column)>,
}

impl Observation {
    /// Iterate over `(name, column)` pairs in table order.
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &Column)> + '_ {
        self.columns.iter().map(|(name, column)| (*name, column))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(column, _)| *column == name)
            .map(|(_, column)| column)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(name, _)| *name).collect()
    }

    /// Number of rows (zero for a table without columns).
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }
}
