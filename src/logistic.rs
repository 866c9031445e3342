use crate::{
    error::{model_load_error, AppError},
    model::{Classifier, ModelOutput},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticSpec {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// Linear model over the feature vector; the sigmoid output is the
/// probability of the artifact's second class.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LogisticModel {
    pub fn from_spec(spec: &LogisticSpec, n_features: usize, n_classes: usize) -> Result<Self, AppError> {
        if n_classes != 2 {
            return Err(model_load_error(format!(
                "logistic model is binary, artifact lists {} classes",
                n_classes
            )));
        }
        if spec.coefficients.len() != n_features {
            return Err(model_load_error(format!(
                "expected {} coefficients, got {}",
                n_features,
                spec.coefficients.len()
            )));
        }
        if !spec.intercept.is_finite() || spec.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(model_load_error("logistic weights must be finite"));
        }
        Ok(Self {
            intercept: spec.intercept,
            coefficients: spec.coefficients.clone(),
        })
    }

    pub fn predict_probability(&self, features: &[f64]) -> f64 {
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        sigmoid(z)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Classifier for LogisticModel {
    fn kind(&self) -> &'static str {
        "logistic"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn infer(&self, features: &[f64]) -> Result<ModelOutput, AppError> {
        if features.len() != self.coefficients.len() {
            return Err(AppError::ModelInference(format!(
                "expected {} inputs, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }
        let p = self.predict_probability(features);
        Ok(ModelOutput::Probabilities(vec![1.0 - p, p]))
    }
}
