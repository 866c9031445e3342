pub mod config;
pub mod decision;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod forest;
pub mod logistic;
pub mod metrics;
pub mod model;
pub mod render;
pub mod report;
pub mod routes;
pub mod schema;
pub mod types;

pub use config::Config;
pub use decision::{decide, Label, Threshold};
pub use engine::PhishingEngine;
pub use error::AppError;
pub use features::{FeatureExtractor, FeatureVector};
pub use model::LoadedModel;
pub use schema::{Feature, FeatureSchema};
