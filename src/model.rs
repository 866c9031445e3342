use crate::{
    decision::{Label, Threshold},
    error::{model_load_error, AppError},
    features::FeatureVector,
    forest::{ForestSpec, RandomForest},
    logistic::{LogisticModel, LogisticSpec},
    schema::FeatureSchema,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{fmt, path::Path};
use tracing::info;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// What a classifier hands back for one feature row.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// A hard class value, e.g. `-1` or `1`.
    Label(i64),
    /// One probability per class, in the artifact's `classes` order.
    Probabilities(Vec<f64>),
}

pub trait Classifier: Send + Sync {
    fn kind(&self) -> &'static str;
    fn n_features(&self) -> usize;
    fn infer(&self, features: &[f64]) -> Result<ModelOutput, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLabels {
    pub phishing: i64,
    pub legitimate: i64,
}

/// Which probability index belongs to which label. Resolved once when the
/// artifact is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassMapping {
    phishing_class: i64,
    legitimate_class: i64,
    phishing_index: usize,
    legitimate_index: usize,
}

impl ClassMapping {
    pub fn resolve(classes: &[i64], labels: &ClassLabels) -> Result<Self, AppError> {
        if classes.len() != 2 {
            return Err(AppError::ClassMapping(format!(
                "binary model expected, artifact lists {} classes",
                classes.len()
            )));
        }
        if labels.phishing == labels.legitimate {
            return Err(AppError::ClassMapping(format!(
                "phishing and legitimate share class value {}",
                labels.phishing
            )));
        }

        let index_of = |class: i64, name: &str| -> Result<usize, AppError> {
            let mut hits = classes.iter().enumerate().filter(|(_, c)| **c == class);
            match (hits.next(), hits.next()) {
                (Some((i, _)), None) => Ok(i),
                (None, _) => Err(AppError::ClassMapping(format!(
                    "{} class {} not present in {:?}",
                    name, class, classes
                ))),
                (Some(_), Some(_)) => Err(AppError::ClassMapping(format!(
                    "{} class {} listed more than once in {:?}",
                    name, class, classes
                ))),
            }
        };

        Ok(Self {
            phishing_class: labels.phishing,
            legitimate_class: labels.legitimate,
            phishing_index: index_of(labels.phishing, "phishing")?,
            legitimate_index: index_of(labels.legitimate, "legitimate")?,
        })
    }

    pub fn legitimate_index(&self) -> usize {
        self.legitimate_index
    }

    pub fn phishing_index(&self) -> usize {
        self.phishing_index
    }

    pub fn label_of(&self, class: i64) -> Option<Label> {
        if class == self.legitimate_class {
            Some(Label::Legitimate)
        } else if class == self.phishing_class {
            Some(Label::Phishing)
        } else {
            None
        }
    }

    pub fn class_of(&self, label: Label) -> i64 {
        match label {
            Label::Legitimate => self.legitimate_class,
            Label::Phishing => self.phishing_class,
        }
    }

    pub fn probability_of_legitimate(&self, output: &ModelOutput) -> Result<f64, AppError> {
        match output {
            ModelOutput::Label(class) => match self.label_of(*class) {
                Some(Label::Legitimate) => Ok(1.0),
                Some(Label::Phishing) => Ok(0.0),
                None => Err(AppError::ModelInference(format!(
                    "model returned unknown class {}",
                    class
                ))),
            },
            ModelOutput::Probabilities(probs) => {
                if probs.len() != 2 {
                    return Err(AppError::ModelInference(format!(
                        "expected 2 class probabilities, got {}",
                        probs.len()
                    )));
                }
                let p = probs[self.legitimate_index];
                if !p.is_finite() {
                    return Err(AppError::ModelInference(format!(
                        "non-finite probability {}",
                        p
                    )));
                }
                Ok(p.clamp(0.0, 1.0))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    RandomForest(ForestSpec),
    Logistic(LogisticSpec),
}

/// On-disk model description exported by the offline training job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_version: String,
    pub features: Vec<String>,
    pub classes: Vec<i64>,
    pub class_labels: ClassLabels,
    #[serde(default)]
    pub threshold: Option<f64>,
    pub estimator: EstimatorSpec,
}

pub struct LoadedModel {
    classifier: Box<dyn Classifier>,
    mapping: ClassMapping,
    schema: FeatureSchema,
    version: String,
    digest: String,
    threshold: Option<Threshold>,
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("kind", &self.classifier.kind())
            .field("schema", &self.schema)
            .field("version", &self.version)
            .field("digest", &self.digest)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl LoadedModel {
    pub fn load(path: &Path, schema: FeatureSchema) -> Result<Self, AppError> {
        let bytes = std::fs::read(path).map_err(|e| {
            model_load_error(format!("cannot read {}: {}", path.display(), e))
        })?;
        let model = Self::from_bytes(&bytes, schema)?;
        info!(
            "Loaded {} model {} from {} (sha256 {})",
            model.kind(),
            model.version,
            path.display(),
            model.digest
        );
        Ok(model)
    }

    pub fn from_bytes(bytes: &[u8], schema: FeatureSchema) -> Result<Self, AppError> {
        let digest = hex::encode(Sha256::digest(bytes));
        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        Self::from_artifact(artifact, schema, digest)
    }

    pub fn from_artifact(
        artifact: ModelArtifact,
        schema: FeatureSchema,
        digest: String,
    ) -> Result<Self, AppError> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(model_load_error(format!(
                "unsupported artifact format {}, expected {}",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        let expected = schema.names();
        if artifact.features != expected {
            return Err(AppError::SchemaMismatch {
                expected: expected.join(", "),
                found: artifact.features.join(", "),
            });
        }

        let mapping = ClassMapping::resolve(&artifact.classes, &artifact.class_labels)?;
        let threshold = artifact.threshold.map(Threshold::new).transpose()?;

        let n_features = schema.len();
        let n_classes = artifact.classes.len();
        let classifier: Box<dyn Classifier> = match &artifact.estimator {
            EstimatorSpec::RandomForest(spec) => {
                Box::new(RandomForest::from_spec(spec, n_features, n_classes)?)
            }
            EstimatorSpec::Logistic(spec) => {
                Box::new(LogisticModel::from_spec(spec, n_features, n_classes)?)
            }
        };

        Ok(Self {
            classifier,
            mapping,
            schema,
            version: artifact.model_version,
            digest,
            threshold,
        })
    }

    /// Wraps an in-process classifier, e.g. one built in tests.
    pub fn from_classifier(
        classifier: Box<dyn Classifier>,
        mapping: ClassMapping,
        schema: FeatureSchema,
        version: impl Into<String>,
    ) -> Result<Self, AppError> {
        if classifier.n_features() != schema.len() {
            return Err(AppError::SchemaMismatch {
                expected: schema.names().join(", "),
                found: format!("{} inputs", classifier.n_features()),
            });
        }
        Ok(Self {
            classifier,
            mapping,
            schema,
            version: version.into(),
            digest: String::new(),
            threshold: None,
        })
    }

    pub fn kind(&self) -> &'static str {
        self.classifier.kind()
    }

    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn mapping(&self) -> &ClassMapping {
        &self.mapping
    }

    /// Threshold recommended by the artifact, if it carries one.
    pub fn threshold(&self) -> Option<Threshold> {
        self.threshold
    }

    pub fn probability_of_legitimate(&self, features: &FeatureVector) -> Result<f64, AppError> {
        if features.schema() != self.schema {
            return Err(AppError::SchemaMismatch {
                expected: self.schema.names().join(", "),
                found: features.schema().names().join(", "),
            });
        }
        let output = self.classifier.infer(&features.to_model_input())?;
        self.mapping.probability_of_legitimate(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LABELS: ClassLabels = ClassLabels {
        phishing: -1,
        legitimate: 1,
    };

    fn stump_artifact(classes: [i64; 2], leaf_left: [f64; 2], leaf_right: [f64; 2]) -> serde_json::Value {
        json!({
            "format_version": 1,
            "model_version": "stump",
            "features": FeatureSchema::Base.names(),
            "classes": classes,
            "class_labels": {"phishing": -1, "legitimate": 1},
            "threshold": 0.4,
            "estimator": {
                "kind": "random_forest",
                "trees": [{
                    "children_left": [1, -1, -1],
                    "children_right": [2, -1, -1],
                    "feature": [7, -2, -2],
                    "threshold": [0.0, -2.0, -2.0],
                    "value": [[5.0, 5.0], leaf_left, leaf_right]
                }]
            }
        })
    }

    fn load(value: serde_json::Value) -> Result<LoadedModel, AppError> {
        LoadedModel::from_bytes(value.to_string().as_bytes(), FeatureSchema::Base)
    }

    fn row(ssl: i8) -> FeatureVector {
        let mut values = vec![1; 9];
        values[7] = ssl;
        FeatureVector::from_values(FeatureSchema::Base, values).unwrap()
    }

    #[test]
    fn mapping_follows_declared_classes() {
        let m = ClassMapping::resolve(&[-1, 1], &LABELS).unwrap();
        assert_eq!((m.phishing_index(), m.legitimate_index()), (0, 1));
        let m = ClassMapping::resolve(&[1, -1], &LABELS).unwrap();
        assert_eq!((m.phishing_index(), m.legitimate_index()), (1, 0));
    }

    #[test]
    fn mapping_rejects_bad_class_lists() {
        assert!(ClassMapping::resolve(&[-1, 1, 0], &LABELS).is_err());
        assert!(ClassMapping::resolve(&[1, 1], &LABELS).is_err());
        assert!(ClassMapping::resolve(&[0, 1], &LABELS).is_err());
        let same = ClassLabels {
            phishing: 1,
            legitimate: 1,
        };
        assert!(ClassMapping::resolve(&[-1, 1], &same).is_err());
    }

    #[test]
    fn hard_label_output_maps_to_certainty() {
        let m = ClassMapping::resolve(&[-1, 1], &LABELS).unwrap();
        assert_eq!(m.probability_of_legitimate(&ModelOutput::Label(1)).unwrap(), 1.0);
        assert_eq!(m.probability_of_legitimate(&ModelOutput::Label(-1)).unwrap(), 0.0);
        assert!(m.probability_of_legitimate(&ModelOutput::Label(7)).is_err());
    }

    #[test]
    fn probability_output_is_validated() {
        let m = ClassMapping::resolve(&[-1, 1], &LABELS).unwrap();
        let p = m
            .probability_of_legitimate(&ModelOutput::Probabilities(vec![0.3, 0.7]))
            .unwrap();
        assert!((p - 0.7).abs() < 1e-12);
        assert!(m
            .probability_of_legitimate(&ModelOutput::Probabilities(vec![1.0]))
            .is_err());
        assert!(m
            .probability_of_legitimate(&ModelOutput::Probabilities(vec![0.5, f64::NAN]))
            .is_err());
    }

    #[test]
    fn swapped_class_order_gives_same_answer() {
        let a = load(stump_artifact([-1, 1], [9.0, 1.0], [2.0, 8.0])).unwrap();
        let b = load(stump_artifact([1, -1], [1.0, 9.0], [8.0, 2.0])).unwrap();
        for ssl in [-1, 1] {
            let pa = a.probability_of_legitimate(&row(ssl)).unwrap();
            let pb = b.probability_of_legitimate(&row(ssl)).unwrap();
            assert!((pa - pb).abs() < 1e-12);
        }
        assert!((a.probability_of_legitimate(&row(1)).unwrap() - 0.8).abs() < 1e-12);
        assert!((a.probability_of_legitimate(&row(-1)).unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn artifact_threshold_and_digest_are_kept() {
        let model = load(stump_artifact([-1, 1], [9.0, 1.0], [2.0, 8.0])).unwrap();
        assert_eq!(model.threshold().map(|t| t.value()), Some(0.4));
        assert_eq!(model.digest().len(), 64);
        assert_eq!(model.kind(), "random_forest");
    }

    #[test]
    fn feature_order_mismatch_is_rejected() {
        let mut artifact = stump_artifact([-1, 1], [9.0, 1.0], [2.0, 8.0]);
        artifact["features"] = json!(FeatureSchema::Extended.names());
        assert!(matches!(load(artifact), Err(AppError::SchemaMismatch { .. })));

        let mut artifact = stump_artifact([-1, 1], [9.0, 1.0], [2.0, 8.0]);
        let mut names = FeatureSchema::Base.names();
        names.swap(0, 1);
        artifact["features"] = json!(names);
        assert!(matches!(load(artifact), Err(AppError::SchemaMismatch { .. })));
    }

    #[test]
    fn vector_from_other_schema_is_rejected() {
        let model = load(stump_artifact([-1, 1], [9.0, 1.0], [2.0, 8.0])).unwrap();
        let extended = FeatureVector::from_values(FeatureSchema::Extended, vec![1; 10]).unwrap();
        assert!(model.probability_of_legitimate(&extended).is_err());
    }

    #[test]
    fn unknown_format_and_bad_threshold_are_rejected() {
        let mut artifact = stump_artifact([-1, 1], [9.0, 1.0], [2.0, 8.0]);
        artifact["format_version"] = json!(2);
        assert!(matches!(load(artifact), Err(AppError::ModelLoad(_))));

        let mut artifact = stump_artifact([-1, 1], [9.0, 1.0], [2.0, 8.0]);
        artifact["threshold"] = json!(1.5);
        assert!(load(artifact).is_err());
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = LoadedModel::load(Path::new("/nonexistent/model.json"), FeatureSchema::Base)
            .unwrap_err();
        assert!(matches!(err, AppError::ModelLoad(_)));
    }
}
