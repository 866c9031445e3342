//! The one ordered definition of the feature vector.
//!
//! Everything that builds or consumes a `FeatureVector` (extractor, model
//! loader, report writer, dataset reader) takes its column order from here.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    HavingIpAddress,
    UrlLength,
    ShorteningService,
    HavingAtSymbol,
    DoubleSlashRedirecting,
    PrefixSuffix,
    HavingSubDomain,
    SslFinalState,
    HttpsToken,
    SuspiciousKeywords,
}

impl Feature {
    /// Column name used by the training dataset and the model artifact.
    pub fn name(&self) -> &'static str {
        match self {
            Feature::HavingIpAddress => "having_IP_Address",
            Feature::UrlLength => "URL_Length",
            // misspelling is part of the dataset's column name
            Feature::ShorteningService => "Shortining_Service",
            Feature::HavingAtSymbol => "having_At_Symbol",
            Feature::DoubleSlashRedirecting => "double_slash_redirecting",
            Feature::PrefixSuffix => "Prefix_Suffix",
            Feature::HavingSubDomain => "having_Sub_Domain",
            Feature::SslFinalState => "SSLfinal_State",
            Feature::HttpsToken => "HTTPS_token",
            Feature::SuspiciousKeywords => "Suspicious_Keywords",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const BASE_FEATURES: [Feature; 9] = [
    Feature::HavingIpAddress,
    Feature::UrlLength,
    Feature::ShorteningService,
    Feature::HavingAtSymbol,
    Feature::DoubleSlashRedirecting,
    Feature::PrefixSuffix,
    Feature::HavingSubDomain,
    Feature::SslFinalState,
    Feature::HttpsToken,
];

const EXTENDED_FEATURES: [Feature; 10] = [
    Feature::HavingIpAddress,
    Feature::UrlLength,
    Feature::ShorteningService,
    Feature::HavingAtSymbol,
    Feature::DoubleSlashRedirecting,
    Feature::PrefixSuffix,
    Feature::HavingSubDomain,
    Feature::SslFinalState,
    Feature::HttpsToken,
    Feature::SuspiciousKeywords,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSchema {
    /// The nine UCI phishing-dataset columns.
    #[default]
    Base,
    /// Base plus `Suspicious_Keywords`.
    Extended,
}

impl FeatureSchema {
    pub fn features(&self) -> &'static [Feature] {
        match self {
            FeatureSchema::Base => &BASE_FEATURES,
            FeatureSchema::Extended => &EXTENDED_FEATURES,
        }
    }

    pub fn len(&self) -> usize {
        self.features().len()
    }

    pub fn is_empty(&self) -> bool {
        self.features().is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.features().iter().map(Feature::name).collect()
    }

    pub fn index_of(&self, feature: Feature) -> Option<usize> {
        self.features().iter().position(|f| *f == feature)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureSchema::Base => "base",
            FeatureSchema::Extended => "extended",
        }
    }
}
