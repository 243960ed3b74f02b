//! Core types for the risk engine

use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inbound request to assess a payment receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Paying VPA
    pub sender_vpa: String,

    /// Receiving VPA, the identifier being scored
    pub receiver_vpa: String,

    /// Transaction amount
    pub amount: f64,

    /// Optional ISO-8601 timestamp, reserved for velocity features
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl TransactionRequest {
    /// Create a request without a timestamp
    pub fn new(sender_vpa: impl Into<String>, receiver_vpa: impl Into<String>, amount: f64) -> Self {
        Self {
            sender_vpa: sender_vpa.into(),
            receiver_vpa: receiver_vpa.into(),
            amount,
            timestamp: None,
        }
    }

    /// Basic schema validation, run before any tier
    pub fn validate(&self) -> Result<()> {
        if self.receiver_vpa.trim().is_empty() {
            return Err(Error::InvalidRequest("receiver_vpa must not be empty".to_string()));
        }

        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(Error::InvalidRequest(format!(
                "amount must be a non-negative number, got {}",
                self.amount
            )));
        }

        if let Some(ts) = &self.timestamp {
            let parsed = DateTime::parse_from_rfc3339(ts).is_ok()
                || NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok();
            if !parsed {
                return Err(Error::InvalidRequest(format!(
                    "timestamp is not ISO-8601: {}",
                    ts
                )));
            }
        }

        Ok(())
    }
}

/// Numeric model input, in training-schema order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Transaction amount
    pub amount: f64,
    /// Character count of the receiver VPA
    pub vpa_length: f64,
    /// Shannon entropy of the receiver VPA
    pub vpa_entropy: f64,
    /// 1.0 when a denylisted keyword matched
    pub keyword_match: f64,
    /// 1.0 when the handle is digits followed by `@`
    pub is_numeric_handle: f64,
}

impl FeatureVector {
    /// Feature names as the training collaborator emits them
    pub const FEATURE_NAMES: [&'static str; 5] = [
        "amount",
        "vpa_length",
        "vpa_entropy",
        "keyword_match",
        "is_numeric_handle",
    ];

    /// Values in `FEATURE_NAMES` order
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.amount,
            self.vpa_length,
            self.vpa_entropy,
            self.keyword_match,
            self.is_numeric_handle,
        ]
    }
}

/// Risk score (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    /// Create new risk score (0-100)
    pub fn new(score: u8) -> Self {
        Self(score.min(100))
    }

    /// Round an accumulated point total into the 0-100 range
    pub fn from_points(points: f64) -> Self {
        if !points.is_finite() || points <= 0.0 {
            return Self(0);
        }
        Self(points.min(100.0).round() as u8)
    }

    /// Get raw score
    pub fn score(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final verdict for a receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Score below 40
    Safe,
    /// Score 40-79
    Suspicious,
    /// Score 80 and above
    Malicious,
}

impl Verdict {
    /// Lower bound of the MALICIOUS band
    pub const MALICIOUS_AT: u8 = 80;
    /// Lower bound of the SUSPICIOUS band
    pub const SUSPICIOUS_AT: u8 = 40;

    /// Verdict for a final score
    pub fn from_score(score: RiskScore) -> Self {
        match score.score() {
            s if s >= Self::MALICIOUS_AT => Verdict::Malicious,
            s if s >= Self::SUSPICIOUS_AT => Verdict::Suspicious,
            _ => Verdict::Safe,
        }
    }

    /// Upper-case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Safe => "SAFE",
            Verdict::Suspicious => "SUSPICIOUS",
            Verdict::Malicious => "MALICIOUS",
        }
    }
}

impl From<RiskScore> for Verdict {
    fn from(score: RiskScore) -> Self {
        Verdict::from_score(score)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage that produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Prior scam reports
    Blacklist,
    /// Lexical heuristics
    Heuristic,
    /// Trained classifier
    Classifier,
    /// Language-model fallback
    Semantic,
}

impl Tier {
    /// Lower-case name used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Blacklist => "blacklist",
            Tier::Heuristic => "heuristic",
            Tier::Classifier => "classifier",
            Tier::Semantic => "semantic",
        }
    }
}

/// One human-readable line of the breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierFinding {
    /// Producing tier
    pub tier: Tier,
    /// Points contributed (0 when the tier only reports a signal)
    pub points: f64,
    /// Description shown to the caller
    pub label: String,
}

impl TierFinding {
    /// Create a finding
    pub fn new(tier: Tier, points: f64, label: impl Into<String>) -> Self {
        Self {
            tier,
            points,
            label: label.into(),
        }
    }
}

/// Ordered, append-only list of findings with unique labels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breakdown(Vec<TierFinding>);

impl Breakdown {
    /// Empty breakdown
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a finding; a label already present is dropped and `false` returned
    pub fn push(&mut self, finding: TierFinding) -> bool {
        if self.0.iter().any(|f| f.label == finding.label) {
            tracing::warn!(
                tier = finding.tier.as_str(),
                label = %finding.label,
                "Duplicate breakdown label dropped"
            );
            return false;
        }
        self.0.push(finding);
        true
    }

    /// Findings in tier execution order
    pub fn findings(&self) -> &[TierFinding] {
        &self.0
    }

    /// Labels in order
    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(|f| f.label.clone()).collect()
    }

    /// Whether any finding came from `tier`
    pub fn contains_tier(&self, tier: Tier) -> bool {
        self.0.iter().any(|f| f.tier == tier)
    }

    /// Number of findings
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing fired
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Breakdown {
    type Item = TierFinding;
    type IntoIter = std::vec::IntoIter<TierFinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Output of one aggregation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Clamped final score
    pub risk_score: RiskScore,
    /// Verdict derived from `risk_score`
    pub verdict: Verdict,
    /// Findings in tier order
    pub breakdown: Breakdown,
}

impl AggregationResult {
    /// Finalize a running total into a result
    pub fn finalize(running_total: f64, breakdown: Breakdown) -> Self {
        let risk_score = RiskScore::from_points(running_total);
        Self {
            risk_score,
            verdict: Verdict::from_score(risk_score),
            breakdown,
        }
    }
}
