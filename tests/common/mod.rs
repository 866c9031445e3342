#![allow(dead_code)]

use phishguard::{Config, PhishingEngine};
use std::path::PathBuf;

pub const LEGITIMATE_URLS: &[&str] = &[
    "https://www.google.com",
    "https://github.com/rust-lang/rust",
    "https://en.wikipedia.org/wiki/Phishing",
    "https://www.amazon.com/gp/cart",
    "https://docs.rs/tokio/latest/tokio/",
    "https://stackoverflow.com/questions",
    "https://www.linkedin.com/feed/",
    "https://crates.io/crates/axum",
    "https://www.bbc.co.uk/news",
    "https://mail.yahoo.com/",
];

pub const PHISHING_URLS: &[&str] = &[
    "http://paypa1.com/login",
    "http://192.168.1.1/login",
    "http://secure-paypal.com.verify-account.info/signin",
    "http://bit.ly/3xYzAbc",
    "http://login.micr0soft.com/update",
    "https://paypal-secure-login.com/verify",
    "https://192.168.10.5/admin",
    "http://faceb00k.com/recover",
    "https://www.g00gle.com/signin",
    "http://amaz0n-billing.com/update",
];

pub fn sample_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models/random_forest.json")
}

pub fn sample_config() -> Config {
    Config {
        model_path: sample_model_path(),
        ..Config::default()
    }
}

pub fn sample_engine() -> PhishingEngine {
    PhishingEngine::from_config(&sample_config()).unwrap()
}
