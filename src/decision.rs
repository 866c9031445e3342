use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Phishing,
    Legitimate,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Phishing => "Phishing",
            Label::Legitimate => "Legitimate",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability cutoff for the legitimate class, validated to lie in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> Result<Self, AppError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(AppError::InvalidConfig(format!(
                "decision threshold must be within [0, 1], got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

/// Legitimate when `probability_of_legitimate >= threshold`; confidence is the
/// probability of whichever label was chosen.
///
/// The probability is clamped to [0, 1] and NaN counts as 0, so a broken
/// model output lands on Phishing.
pub fn decide(probability_of_legitimate: f64, threshold: f64) -> (Label, f64) {
    let p = if probability_of_legitimate.is_nan() {
        0.0
    } else {
        probability_of_legitimate.clamp(0.0, 1.0)
    };

    if p >= threshold {
        (Label::Legitimate, p)
    } else {
        (Label::Phishing, 1.0 - p)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionRule {
    threshold: Threshold,
}

impl DecisionRule {
    pub fn new(threshold: Threshold) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn decide(&self, probability_of_legitimate: f64) -> (Label, f64) {
        decide(probability_of_legitimate, self.threshold.value())
    }
}
