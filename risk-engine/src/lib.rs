//! Risk engine for VPA Guard
//!
//! Tiered fraud-risk scoring for payment receiver identifiers (VPAs):
//! blacklist lookup, lexical heuristics, a gradient-boosted classifier and
//! a semantic fallback, combined into one score and verdict.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregator;
pub mod classifier;
pub mod error;
pub mod features;
pub mod heuristics;
pub mod oracle;
pub mod semantic;
pub mod types;

pub use aggregator::{AggregationPolicy, RiskAggregator};
pub use classifier::{BoostedTreesModel, TreeEnsembleClassifier};
pub use error::{Error, Result};
pub use features::{KeywordDenylist, LexicalFeatureExtractor, LexicalSignals};
pub use heuristics::{HeuristicOutcome, HeuristicScorer, HeuristicWeights};
pub use oracle::{
    BlacklistLookup, BlacklistOracle, ClassifierOracle, ClassifierOutcome, Disabled,
    SemanticJudgment, SemanticOracle, SemanticOutcome,
};
pub use types::*;
