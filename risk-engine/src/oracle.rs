//! Contracts for the external signal sources queried by the aggregator
//!
//! Every oracle reports a tagged outcome instead of an error. Failures are
//! absorbed by the owning tier and never abort a request.

use crate::FeatureVector;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of a blacklist query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlacklistLookup {
    /// Number of prior reports for the exact identifier
    Matches(u64),
    /// Store not configured or not reachable
    Unavailable,
}

/// Reputation store keyed by exact receiver VPA
#[async_trait]
pub trait BlacklistOracle: Send + Sync {
    /// Count prior reports for `receiver_vpa`
    async fn lookup(&self, receiver_vpa: &str) -> BlacklistLookup;
}

/// Result of classifier inference
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassifierOutcome {
    /// Fraud probability in `[0, 1]`
    Probability(f64),
    /// Model missing or inference failed
    Unavailable,
}

/// Pretrained binary fraud classifier
pub trait ClassifierOracle: Send + Sync {
    /// Whether a model was loaded at startup
    fn is_available(&self) -> bool;

    /// Fraud probability for a feature vector; the amount travels inside it
    fn predict(&self, features: &FeatureVector) -> ClassifierOutcome;
}

/// Structured judgment parsed from the language model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticJudgment {
    /// Reported risk, 0-100
    pub risk_score: u8,
    /// Free-text justification
    pub reason: String,
}

/// Result of the semantic fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticOutcome {
    /// Parsed judgment
    Assessed(SemanticJudgment),
    /// Not configured, not reachable or timed out
    Unavailable,
    /// Responded but the payload could not be parsed
    Malformed,
}

/// General-purpose language-understanding service
#[async_trait]
pub trait SemanticOracle: Send + Sync {
    /// Whether a credential is configured; unconfigured oracles are skipped silently
    fn is_configured(&self) -> bool;

    /// Ask for a risk judgment on `receiver_vpa`
    async fn assess(&self, receiver_vpa: &str) -> SemanticOutcome;
}

/// Stand-in for a collaborator that is not configured
#[derive(Debug, Clone, Copy, Default)]
pub struct Disabled;

#[async_trait]
impl BlacklistOracle for Disabled {
    async fn lookup(&self, _receiver_vpa: &str) -> BlacklistLookup {
        BlacklistLookup::Unavailable
    }
}

impl ClassifierOracle for Disabled {
    fn is_available(&self) -> bool {
        false
    }

    fn predict(&self, _features: &FeatureVector) -> ClassifierOutcome {
        ClassifierOutcome::Unavailable
    }
}

#[async_trait]
impl SemanticOracle for Disabled {
    fn is_configured(&self) -> bool {
        false
    }

    async fn assess(&self, _receiver_vpa: &str) -> SemanticOutcome {
        SemanticOutcome::Unavailable
    }
}
