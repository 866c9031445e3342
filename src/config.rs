use crate::{
    decision::Threshold,
    detectors::{
        default_legitimate_domains, default_shortening_services, default_suspicious_keywords,
        ReferenceData,
    },
    error::AppError,
    schema::FeatureSchema,
};
use serde::Deserialize;
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

pub const ENV_PREFIX: &str = "PHISHGUARD";
pub const DEFAULT_CONFIG_FILE: &str = "phishguard.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Overrides the threshold stored in the model artifact.
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub feature_set: FeatureSchema,
    #[serde(default = "default_legitimate_domains")]
    pub legitimate_domains: Vec<String>,
    #[serde(default = "default_suspicious_keywords")]
    pub suspicious_keywords: Vec<String>,
    #[serde(default = "default_shortening_services")]
    pub shortening_services: Vec<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/random_forest.json")
}

impl Default for Config {
    fn default() -> Self {
        let reference = ReferenceData::default();
        Self {
            bind_addr: default_bind_addr(),
            model_path: default_model_path(),
            threshold: None,
            feature_set: FeatureSchema::default(),
            legitimate_domains: reference.legitimate_domains,
            suspicious_keywords: reference.suspicious_keywords,
            shortening_services: reference.shortening_services,
        }
    }
}

impl Config {
    /// Defaults, then `phishguard.toml` if present, then `PHISHGUARD_*` env vars.
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(None)
    }

    /// Like [`Config::load`], but an explicit file must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, AppError> {
        let builder = config::Config::builder();
        let builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.socket_addr()?;
        if self.model_path.as_os_str().is_empty() {
            return Err(AppError::InvalidConfig("model_path must not be empty".to_string()));
        }
        if let Some(threshold) = self.threshold {
            Threshold::new(threshold)?;
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        self.bind_addr.parse().map_err(|e| {
            AppError::InvalidConfig(format!("bind_addr {:?}: {}", self.bind_addr, e))
        })
    }

    pub fn reference_data(&self) -> ReferenceData {
        ReferenceData {
            legitimate_domains: self.legitimate_domains.clone(),
            suspicious_keywords: self.suspicious_keywords.clone(),
            shortening_services: self.shortening_services.clone(),
        }
    }
}
