use crate::{decision::Label, features::FeatureVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Label,
    pub confidence: f64,
    pub probability_of_legitimate: f64,
    pub features: FeatureVector,
}

impl Prediction {
    /// Confidence as shown to users, e.g. `87.50%`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.confidence * 100.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub prediction_id: Uuid,
    pub url: String,
    pub label: Label,
    pub confidence: f64,
    pub probability_of_legitimate: f64,
    pub threshold: f64,
    pub model_version: String,
    pub features: FeatureVector,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model_kind: &'static str,
    pub model_version: String,
    pub model_sha256: String,
    pub threshold: f64,
    pub feature_set: &'static str,
    pub timestamp: DateTime<Utc>,
}
