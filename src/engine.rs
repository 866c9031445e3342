use crate::{
    config::Config,
    decision::{DecisionRule, Threshold},
    error::AppError,
    features::{FeatureExtractor, FeatureVector},
    model::LoadedModel,
    schema::FeatureSchema,
    types::Prediction,
};
use tracing::{debug, info};

/// Extractor, model and decision rule, built once at startup and shared
/// read-only afterwards.
#[derive(Debug)]
pub struct PhishingEngine {
    extractor: FeatureExtractor,
    model: LoadedModel,
    rule: DecisionRule,
}

impl PhishingEngine {
    /// Loads the model named by the config. Any failure here is fatal for the
    /// caller: there is no way to serve predictions without a model.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        info!("Initializing phishing engine...");

        let schema = config.feature_set;
        let model = LoadedModel::load(&config.model_path, schema)?;
        let threshold = resolve_threshold(config.threshold, model.threshold())?;
        let extractor = FeatureExtractor::new(schema, &config.reference_data());

        info!(
            "Engine ready: {} features ({}), threshold {:.3}",
            schema.len(),
            schema.as_str(),
            threshold.value()
        );

        Self::new(extractor, model, DecisionRule::new(threshold))
    }

    pub fn new(
        extractor: FeatureExtractor,
        model: LoadedModel,
        rule: DecisionRule,
    ) -> Result<Self, AppError> {
        if extractor.schema() != model.schema() {
            return Err(AppError::SchemaMismatch {
                expected: model.schema().names().join(", "),
                found: extractor.schema().names().join(", "),
            });
        }
        Ok(Self {
            extractor,
            model,
            rule,
        })
    }

    pub fn schema(&self) -> FeatureSchema {
        self.extractor.schema()
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    pub fn threshold(&self) -> Threshold {
        self.rule.threshold()
    }

    pub fn extract(&self, url: &str) -> FeatureVector {
        self.extractor.extract(url)
    }

    pub fn predict(&self, url: &str) -> Result<Prediction, AppError> {
        let features = self.extractor.extract(url);
        let probability_of_legitimate = self.model.probability_of_legitimate(&features)?;
        let (label, confidence) = self.rule.decide(probability_of_legitimate);

        debug!(
            "{} -> {} (p_legit {:.3}, confidence {:.3})",
            url, label, probability_of_legitimate, confidence
        );

        Ok(Prediction {
            label,
            confidence,
            probability_of_legitimate,
            features,
        })
    }
}

/// Configured threshold wins, then the artifact's, then the default.
pub fn resolve_threshold(
    configured: Option<f64>,
    from_artifact: Option<Threshold>,
) -> Result<Threshold, AppError> {
    match (configured, from_artifact) {
        (Some(value), _) => Threshold::new(value),
        (None, Some(threshold)) => Ok(threshold),
        (None, None) => Ok(Threshold::default()),
    }
}
