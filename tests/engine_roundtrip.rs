mod common;

use common::{sample_config, sample_engine, sample_model_path, LEGITIMATE_URLS, PHISHING_URLS};
use phishguard::{Label, PhishingEngine};
use std::io::Write;

#[test]
fn sample_model_separates_known_urls() {
    let engine = sample_engine();

    let labelled = LEGITIMATE_URLS
        .iter()
        .map(|u| (*u, Label::Legitimate))
        .chain(PHISHING_URLS.iter().map(|u| (*u, Label::Phishing)));

    let mut correct = 0;
    let mut total = 0;
    for (url, expected) in labelled {
        let prediction = engine.predict(url).unwrap();
        if prediction.label == expected {
            correct += 1;
        }
        total += 1;
    }

    let accuracy = correct as f64 / total as f64;
    assert!(accuracy >= 0.9, "accuracy {} below 0.9", accuracy);
}

#[test]
fn artifact_threshold_applies_without_override() {
    let engine = sample_engine();
    assert_eq!(engine.threshold().value(), 0.4);
    assert_eq!(engine.model().kind(), "random_forest");
    assert_eq!(engine.model().digest().len(), 64);
}

#[test]
fn configured_threshold_overrides_artifact() {
    let config = phishguard::Config {
        threshold: Some(0.9),
        ..sample_config()
    };
    let engine = PhishingEngine::from_config(&config).unwrap();
    assert_eq!(engine.threshold().value(), 0.9);

    // google scores about 0.88 against the sample model
    let prediction = engine.predict("https://www.google.com").unwrap();
    assert_eq!(prediction.label, Label::Phishing);
}

#[test]
fn prediction_is_deterministic() {
    let engine = sample_engine();
    for url in LEGITIMATE_URLS.iter().chain(PHISHING_URLS) {
        assert_eq!(engine.predict(url).unwrap(), engine.predict(url).unwrap());
    }
}

#[test]
fn swapped_class_order_gives_same_predictions() {
    let raw = std::fs::read_to_string(sample_model_path()).unwrap();
    let mut artifact: serde_json::Value = serde_json::from_str(&raw).unwrap();

    artifact["classes"] = serde_json::json!([1, -1]);
    for tree in artifact["estimator"]["trees"].as_array_mut().unwrap() {
        for node in tree["value"].as_array_mut().unwrap() {
            node.as_array_mut().unwrap().swap(0, 1);
        }
    }

    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(artifact.to_string().as_bytes()).unwrap();

    let swapped = PhishingEngine::from_config(&phishguard::Config {
        model_path: file.path().to_path_buf(),
        ..sample_config()
    })
    .unwrap();
    let original = sample_engine();

    for url in LEGITIMATE_URLS.iter().chain(PHISHING_URLS) {
        let a = original.predict(url).unwrap();
        let b = swapped.predict(url).unwrap();
        assert_eq!(a.label, b.label, "{}", url);
        assert!((a.probability_of_legitimate - b.probability_of_legitimate).abs() < 1e-12);
    }
}

#[test]
fn extended_schema_is_rejected_by_base_model() {
    let config = phishguard::Config {
        feature_set: phishguard::FeatureSchema::Extended,
        ..sample_config()
    };
    assert!(matches!(
        PhishingEngine::from_config(&config),
        Err(phishguard::AppError::SchemaMismatch { .. })
    ));
}

#[test]
fn missing_model_is_fatal() {
    let config = phishguard::Config {
        model_path: "does/not/exist.json".into(),
        ..sample_config()
    };
    assert!(PhishingEngine::from_config(&config).is_err());
}
