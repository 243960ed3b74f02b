//! Lexical feature extraction for receiver VPAs

use crate::{FeatureVector, TransactionRequest};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static NUMERIC_HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+@").expect("numeric handle pattern is valid"));

/// Social-engineering terms matched inside a VPA
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordDenylist {
    keywords: Vec<String>,
}

impl KeywordDenylist {
    /// Terms used when no list is configured
    pub const DEFAULT_KEYWORDS: [&'static str; 9] = [
        "winner", "lottery", "offer", "refund", "lucky", "kyc", "pmcare", "funds", "cash",
    ];

    /// Build a denylist; entries are lower-cased, blanks dropped
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// First keyword contained in `vpa`, case-insensitively
    pub fn find_match(&self, vpa: &str) -> Option<&str> {
        let lowered = vpa.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lowered.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Configured terms
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for KeywordDenylist {
    fn default() -> Self {
        Self::new(Self::DEFAULT_KEYWORDS)
    }
}

impl From<Vec<String>> for KeywordDenylist {
    fn from(keywords: Vec<String>) -> Self {
        Self::new(keywords)
    }
}

impl From<KeywordDenylist> for Vec<String> {
    fn from(list: KeywordDenylist) -> Self {
        list.keywords
    }
}

/// Deterministic signals derived from one VPA string
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalSignals {
    /// Character count
    pub length: usize,
    /// Shannon entropy, base 2
    pub entropy: f64,
    /// Denylisted keyword found in the VPA, if any
    pub matched_keyword: Option<String>,
    /// Digits immediately followed by `@`
    pub is_numeric_handle: bool,
}

impl LexicalSignals {
    /// Whether a denylisted keyword matched
    pub fn keyword_match(&self) -> bool {
        self.matched_keyword.is_some()
    }
}

/// Shannon entropy (base 2) of the character distribution; 0 for an empty string
pub fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut n = 0usize;
    for c in s.chars() {
        *counts.entry(c).or_insert(0) += 1;
        n += 1;
    }

    if n == 0 {
        return 0.0;
    }

    let n = n as f64;
    let entropy: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum();

    // A single repeated character sums to -0.0
    entropy.max(0.0)
}

/// True when the VPA starts with one or more digits followed by `@`
pub fn is_numeric_handle(vpa: &str) -> bool {
    NUMERIC_HANDLE.is_match(vpa)
}

/// Lexical feature extractor
#[derive(Debug, Clone, Default)]
pub struct LexicalFeatureExtractor {
    denylist: KeywordDenylist,
}

impl LexicalFeatureExtractor {
    /// Create an extractor with the given denylist
    pub fn new(denylist: KeywordDenylist) -> Self {
        Self { denylist }
    }

    /// Signals for a VPA; total over all strings
    pub fn extract(&self, vpa: &str) -> LexicalSignals {
        LexicalSignals {
            length: vpa.chars().count(),
            entropy: shannon_entropy(vpa),
            matched_keyword: self.denylist.find_match(vpa).map(str::to_string),
            is_numeric_handle: is_numeric_handle(vpa),
        }
    }

    /// Classifier input for a request, built from already extracted signals
    pub fn feature_vector(&self, req: &TransactionRequest, signals: &LexicalSignals) -> FeatureVector {
        FeatureVector {
            amount: req.amount,
            vpa_length: signals.length as f64,
            vpa_entropy: signals.entropy,
            keyword_match: if signals.keyword_match() { 1.0 } else { 0.0 },
            is_numeric_handle: if signals.is_numeric_handle { 1.0 } else { 0.0 },
        }
    }

    /// Denylist in use
    pub fn denylist(&self) -> &KeywordDenylist {
        &self.denylist
    }
}
