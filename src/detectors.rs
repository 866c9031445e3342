use serde::{Deserialize, Serialize};
use strsim::{hamming, normalized_levenshtein};

/// Normalized Levenshtein similarity above which a host is a near-match.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;
/// Hamming-style mismatch count at or below which a host is a near-match.
pub const MAX_MISMATCHES: usize = 2;
// Shorter hosts are too ambiguous to compare.
const MIN_HOST_LEN: usize = 4;

const LEGITIMATE_DOMAINS: &[&str] = &[
    "google.com",
    "youtube.com",
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "linkedin.com",
    "wikipedia.org",
    "amazon.com",
    "apple.com",
    "microsoft.com",
    "netflix.com",
    "paypal.com",
    "ebay.com",
    "yahoo.com",
    "github.com",
    "bankofamerica.com",
];

const SUSPICIOUS_KEYWORDS: &[&str] = &[
    "login", "signin", "sign-in", "secure", "verify", "account", "update", "confirm",
    "password", "banking", "billing", "suspended", "unlock", "webscr",
];

const SHORTENING_SERVICES: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "goo.gl",
    "t.co",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "adf.ly",
    "bit.do",
    "mcaf.ee",
    "su.pr",
];

/// Static lists the extractor compares hosts and URLs against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub legitimate_domains: Vec<String>,
    pub suspicious_keywords: Vec<String>,
    pub shortening_services: Vec<String>,
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            legitimate_domains: default_legitimate_domains(),
            suspicious_keywords: default_suspicious_keywords(),
            shortening_services: default_shortening_services(),
        }
    }
}

pub fn default_legitimate_domains() -> Vec<String> {
    LEGITIMATE_DOMAINS.iter().map(|s| s.to_string()).collect()
}

pub fn default_suspicious_keywords() -> Vec<String> {
    SUSPICIOUS_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

pub fn default_shortening_services() -> Vec<String> {
    SHORTENING_SERVICES.iter().map(|s| s.to_string()).collect()
}

fn normalize_list(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = items
        .iter()
        .map(|s| s.trim().trim_end_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// True when `host` is `domain` itself or any subdomain of it.
pub fn is_same_or_subdomain(host: &str, domain: &str) -> bool {
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

#[derive(Debug, Clone, PartialEq)]
pub struct TyposquatMatch {
    pub target: String,
    pub similarity: f64,
    /// Prefix Hamming distance, when the host is long enough to compare.
    pub mismatches: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct TyposquatDetector {
    legitimate: Vec<String>,
}

impl TyposquatDetector {
    pub fn new(domains: &[String]) -> Self {
        let legitimate = normalize_list(domains)
            .into_iter()
            .map(|d| strip_www(&d).to_string())
            .collect();
        Self { legitimate }
    }

    pub fn is_typosquat(&self, hostname: &str) -> bool {
        self.check(hostname).is_some()
    }

    /// Closest legitimate domain the host imitates, if any.
    pub fn check(&self, hostname: &str) -> Option<TyposquatMatch> {
        let host = strip_www(hostname.trim_end_matches('.'));
        if host.chars().count() < MIN_HOST_LEN {
            return None;
        }

        // The real site (or one of its subdomains) is never its own typosquat.
        if self
            .legitimate
            .iter()
            .any(|domain| is_same_or_subdomain(host, domain))
        {
            return None;
        }

        let mut best: Option<TyposquatMatch> = None;
        for domain in &self.legitimate {
            let similarity = normalized_levenshtein(host, domain);
            let mismatches = prefix_mismatches(host, domain);
            let close_prefix = mismatches.is_some_and(|m| m <= MAX_MISMATCHES);
            if similarity <= SIMILARITY_THRESHOLD && !close_prefix {
                continue;
            }
            match &best {
                Some(current) if current.similarity >= similarity => {}
                _ => {
                    best = Some(TyposquatMatch {
                        target: domain.clone(),
                        similarity,
                        mismatches,
                    })
                }
            }
        }
        best
    }
}

/// Hamming distance over the equal-length prefixes. `None` when the host is
/// too short to cover the domain within [`MAX_MISMATCHES`] characters.
fn prefix_mismatches(host: &str, domain: &str) -> Option<usize> {
    let host_len = host.chars().count();
    let domain_len = domain.chars().count();
    let common = host_len.min(domain_len);
    if common + MAX_MISMATCHES < domain_len {
        return None;
    }
    let host_prefix: String = host.chars().take(common).collect();
    let domain_prefix: String = domain.chars().take(common).collect();
    hamming(&host_prefix, &domain_prefix).ok()
}

#[derive(Debug, Clone)]
pub struct KeywordDetector {
    keywords: Vec<String>,
}

impl KeywordDetector {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: normalize_list(keywords),
        }
    }

    pub fn find<'a>(&'a self, text: &str) -> Option<&'a str> {
        self.keywords
            .iter()
            .find(|keyword| text.contains(keyword.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, url: &str, hostname: &str) -> bool {
        self.find(url).is_some() || self.find(hostname).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ShortenerList {
    services: Vec<String>,
}

impl ShortenerList {
    pub fn new(services: &[String]) -> Self {
        Self {
            services: normalize_list(services),
        }
    }

    pub fn matches(&self, hostname: &str) -> bool {
        let host = strip_www(hostname.trim_end_matches('.'));
        !host.is_empty()
            && self
                .services
                .iter()
                .any(|service| is_same_or_subdomain(host, service))
    }
}
