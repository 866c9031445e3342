use crate::{
    detectors::{KeywordDetector, ReferenceData, ShortenerList, TyposquatDetector, TyposquatMatch},
    error::AppError,
    schema::{Feature, FeatureSchema},
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{ser::SerializeMap, Serialize, Serializer};
use url::Url;

const SHORT_URL_MAX: usize = 54;
const LONG_URL_MIN: usize = 76;
// "//" found at or after this character offset counts as a redirect.
const DOUBLE_SLASH_OFFSET: usize = 8;

// Four leading labels, each 0-255.
static LEADING_IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])(\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])){3}(\.|$)",
    )
    .expect("static IPv4 pattern")
});

/// A URL split into the parts the features look at. Every part is empty when
/// the input does not parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: String,
    pub hostname: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

impl ParsedUrl {
    pub fn parse(url: &str) -> Self {
        match Url::parse(url) {
            Ok(parsed) => Self {
                scheme: parsed.scheme().to_string(),
                hostname: parsed.host_str().unwrap_or_default().to_string(),
                path: parsed.path().to_string(),
                query: parsed.query().unwrap_or_default().to_string(),
                fragment: parsed.fragment().unwrap_or_default().to_string(),
            },
            Err(_) => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector {
    schema: FeatureSchema,
    values: Vec<i8>,
}

impl FeatureVector {
    /// Builds a vector from raw values, e.g. a dataset row.
    pub fn from_values(schema: FeatureSchema, values: Vec<i8>) -> Result<Self, AppError> {
        if values.len() != schema.len() {
            return Err(AppError::InvalidInput(format!(
                "expected {} feature values, got {}",
                schema.len(),
                values.len()
            )));
        }
        if let Some(bad) = values.iter().find(|v| !(-1..=1).contains(*v)) {
            return Err(AppError::InvalidInput(format!(
                "feature value {} outside {{-1, 0, 1}}",
                bad
            )));
        }
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    pub fn values(&self) -> &[i8] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, feature: Feature) -> Option<i8> {
        self.schema.index_of(feature).map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, i8)> + '_ {
        self.schema
            .features()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    pub fn to_model_input(&self) -> Vec<f64> {
        self.values.iter().map(|v| f64::from(*v)).collect()
    }
}

// Serialized as a name -> value map in schema order.
impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (feature, value) in self.iter() {
            map.serialize_entry(feature.name(), &value)?;
        }
        map.end()
    }
}

#[derive(Debug)]
pub struct FeatureExtractor {
    schema: FeatureSchema,
    shorteners: ShortenerList,
    typosquat: TyposquatDetector,
    keywords: KeywordDetector,
}

impl FeatureExtractor {
    pub fn new(schema: FeatureSchema, reference: &ReferenceData) -> Self {
        Self {
            schema,
            shorteners: ShortenerList::new(&reference.shortening_services),
            typosquat: TyposquatDetector::new(&reference.legitimate_domains),
            keywords: KeywordDetector::new(&reference.suspicious_keywords),
        }
    }

    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    /// Legitimate domain the URL's host imitates, seen through the same
    /// normalization as [`extract`](Self::extract).
    pub fn typosquat_match(&self, url: &str) -> Option<TyposquatMatch> {
        let parsed = ParsedUrl::parse(&url.trim().to_lowercase());
        self.typosquat.check(&parsed.hostname)
    }

    /// Total over all strings: malformed input falls back to each feature's
    /// suspicious or neutral value.
    pub fn extract(&self, url: &str) -> FeatureVector {
        let normalized = url.trim().to_lowercase();
        let parsed = ParsedUrl::parse(&normalized);

        let values = self
            .schema
            .features()
            .iter()
            .map(|feature| self.compute(*feature, &normalized, &parsed))
            .collect();

        FeatureVector {
            schema: self.schema,
            values,
        }
    }

    fn compute(&self, feature: Feature, url: &str, parsed: &ParsedUrl) -> i8 {
        let host = parsed.hostname.as_str();
        match feature {
            Feature::HavingIpAddress => flag(LEADING_IPV4.is_match(host)),
            Feature::UrlLength => url_length(url),
            Feature::ShorteningService => flag(self.shorteners.matches(host)),
            Feature::HavingAtSymbol => flag(url.contains('@')),
            Feature::DoubleSlashRedirecting => flag(has_late_double_slash(url)),
            Feature::PrefixSuffix => {
                flag(host.contains('-') || self.typosquat.is_typosquat(host))
            }
            Feature::HavingSubDomain => sub_domain(host),
            Feature::SslFinalState => {
                if parsed.scheme == "https" {
                    1
                } else {
                    -1
                }
            }
            Feature::HttpsToken => flag(host.contains("https")),
            Feature::SuspiciousKeywords => flag(self.keywords.matches(url, host)),
        }
    }
}

fn flag(suspicious: bool) -> i8 {
    if suspicious {
        -1
    } else {
        1
    }
}

fn url_length(url: &str) -> i8 {
    let len = url.chars().count();
    if len < SHORT_URL_MAX {
        1
    } else if len < LONG_URL_MIN {
        0
    } else {
        -1
    }
}

fn has_late_double_slash(url: &str) -> bool {
    url.char_indices()
        .nth(DOUBLE_SLASH_OFFSET)
        .map(|(start, _)| url[start..].contains("//"))
        .unwrap_or(false)
}

fn sub_domain(host: &str) -> i8 {
    if host.is_empty() {
        return -1;
    }
    match host.matches('.').count() {
        0 | 1 => 1,
        2 => 0,
        _ => -1,
    }
}
