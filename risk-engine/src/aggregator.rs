//! Tiered risk aggregation
//!
//! Tiers run strictly in order, each fault-isolated:
//!
//! 1. Blacklist: any prior report is terminal (score 100, MALICIOUS).
//! 2. Heuristics: always run, fixed points per fired signal.
//! 3. Classifier: blended in only when a model is loaded.
//! 4. Semantic fallback: only when configured and the running total is below
//!    the skip threshold; it can raise the total but never lower it.

use crate::features::LexicalFeatureExtractor;
use crate::heuristics::HeuristicScorer;
use crate::oracle::{
    BlacklistLookup, BlacklistOracle, ClassifierOracle, ClassifierOutcome, SemanticOracle,
    SemanticOutcome,
};
use crate::{AggregationResult, Breakdown, Result, Tier, TierFinding, TransactionRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Score assigned when the blacklist reports the receiver
pub const BLACKLIST_POINTS: f64 = 100.0;

/// Thresholds and weights for blending tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationPolicy {
    /// Classifier scores above this are half-weighted into the total
    pub ml_high_threshold: i64,
    /// Weight applied to high classifier scores
    pub ml_high_weight: f64,
    /// Classifier scores above this (and not high) add a flat amount
    pub ml_moderate_threshold: i64,
    /// Flat points for moderate classifier scores
    pub ml_moderate_points: f64,
    /// Running total at or above which the semantic tier is skipped
    pub semantic_skip_at: f64,
    /// Semantic scores above this are merged into the total
    pub semantic_activation: u8,
    /// Upper bound on one semantic call
    pub semantic_timeout_ms: u64,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            ml_high_threshold: 50,
            ml_high_weight: 0.5,
            ml_moderate_threshold: 20,
            ml_moderate_points: 10.0,
            semantic_skip_at: 80.0,
            semantic_activation: 40,
            semantic_timeout_ms: 3000,
        }
    }
}

/// Risk aggregator
pub struct RiskAggregator {
    blacklist: Arc<dyn BlacklistOracle>,
    classifier: Arc<dyn ClassifierOracle>,
    semantic: Arc<dyn SemanticOracle>,
    extractor: LexicalFeatureExtractor,
    heuristics: HeuristicScorer,
    policy: AggregationPolicy,
}

impl RiskAggregator {
    /// Create an aggregator with default features, weights and policy
    pub fn new(
        blacklist: Arc<dyn BlacklistOracle>,
        classifier: Arc<dyn ClassifierOracle>,
        semantic: Arc<dyn SemanticOracle>,
    ) -> Self {
        Self {
            blacklist,
            classifier,
            semantic,
            extractor: LexicalFeatureExtractor::default(),
            heuristics: HeuristicScorer::default(),
            policy: AggregationPolicy::default(),
        }
    }

    /// Use a custom feature extractor
    pub fn with_extractor(mut self, extractor: LexicalFeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Use custom heuristic weights
    pub fn with_heuristics(mut self, heuristics: HeuristicScorer) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Use a custom blending policy
    pub fn with_policy(mut self, policy: AggregationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active policy
    pub fn policy(&self) -> &AggregationPolicy {
        &self.policy
    }

    /// Score a receiver. Only an invalid request is an error; degraded tiers
    /// simply contribute nothing.
    pub async fn assess_receiver(&self, req: &TransactionRequest) -> Result<AggregationResult> {
        req.validate()?;

        let vpa = req.receiver_vpa.as_str();
        let mut breakdown = Breakdown::new();
        let mut total = 0.0_f64;

        // ===== 1. BLACKLIST =====
        match self.blacklist.lookup(vpa).await {
            BlacklistLookup::Matches(count) if count > 0 => {
                breakdown.push(TierFinding::new(
                    Tier::Blacklist,
                    BLACKLIST_POINTS,
                    format!("Flagged as scam by {} user report(s)", count),
                ));
                let result = AggregationResult::finalize(BLACKLIST_POINTS, breakdown);
                info!(
                    receiver = %vpa,
                    reports = count,
                    risk_score = result.risk_score.score(),
                    verdict = %result.verdict,
                    "Receiver blacklisted, remaining tiers skipped"
                );
                return Ok(result);
            }
            BlacklistLookup::Matches(_) => debug!(receiver = %vpa, "No prior scam reports"),
            BlacklistLookup::Unavailable => {
                warn!(receiver = %vpa, "Blacklist unavailable, tier skipped")
            }
        }

        // ===== 2. HEURISTICS =====
        let signals = self.extractor.extract(vpa);
        let heuristic = self.heuristics.score(&signals);
        total += heuristic.points;
        for finding in heuristic.findings {
            breakdown.push(finding);
        }
        debug!(
            receiver = %vpa,
            entropy = signals.entropy,
            points = heuristic.points,
            "Heuristic tier scored"
        );

        // ===== 3. CLASSIFIER =====
        if self.classifier.is_available() {
            let features = self.extractor.feature_vector(req, &signals);
            match self.classifier.predict(&features) {
                ClassifierOutcome::Probability(probability) => {
                    debug!(receiver = %vpa, probability, "Classifier tier scored");
                    if let Some(finding) = self.blend_classifier(probability) {
                        total += finding.points;
                        breakdown.push(finding);
                    }
                }
                ClassifierOutcome::Unavailable => {
                    warn!(receiver = %vpa, "Classifier inference unavailable, tier skipped")
                }
            }
        } else {
            debug!("Classifier not loaded, tier skipped");
        }

        // ===== 4. SEMANTIC FALLBACK =====
        if !self.semantic.is_configured() {
            debug!("Semantic oracle not configured, tier skipped");
        } else if total >= self.policy.semantic_skip_at {
            debug!(running_total = total, "Risk already high, semantic tier skipped");
        } else {
            let limit = Duration::from_millis(self.policy.semantic_timeout_ms);
            let outcome = match tokio::time::timeout(limit, self.semantic.assess(vpa)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(timeout_ms = self.policy.semantic_timeout_ms, "Semantic oracle timed out");
                    SemanticOutcome::Unavailable
                }
            };

            match outcome {
                SemanticOutcome::Assessed(judgment)
                    if judgment.risk_score > self.policy.semantic_activation =>
                {
                    let before = total;
                    total = total.max(f64::from(judgment.risk_score));
                    let label = if judgment.reason.is_empty() {
                        format!("AI analysis flagged VPA (score {})", judgment.risk_score)
                    } else {
                        format!("AI analysis: {}", judgment.reason)
                    };
                    breakdown.push(TierFinding::new(Tier::Semantic, total - before, label));
                }
                SemanticOutcome::Assessed(judgment) => {
                    debug!(reported = judgment.risk_score, "Semantic risk below activation")
                }
                SemanticOutcome::Unavailable => {
                    warn!(receiver = %vpa, "Semantic oracle unavailable, tier skipped")
                }
                SemanticOutcome::Malformed => {
                    warn!(receiver = %vpa, "Semantic oracle returned malformed output, tier skipped")
                }
            }
        }

        // ===== FINALIZE =====
        let result = AggregationResult::finalize(total, breakdown);
        info!(
            receiver = %vpa,
            running_total = total,
            risk_score = result.risk_score.score(),
            verdict = %result.verdict,
            findings = result.breakdown.len(),
            "Receiver risk assessed"
        );

        Ok(result)
    }

    /// Contribution of a classifier probability, or `None` when it is too low to count
    pub fn blend_classifier(&self, probability: f64) -> Option<TierFinding> {
        let ml_score = (probability * 100.0).round() as i64;

        if ml_score > self.policy.ml_high_threshold {
            Some(TierFinding::new(
                Tier::Classifier,
                ml_score as f64 * self.policy.ml_high_weight,
                format!("ML model: high fraud probability ({}%)", ml_score),
            ))
        } else if ml_score > self.policy.ml_moderate_threshold {
            Some(TierFinding::new(
                Tier::Classifier,
                self.policy.ml_moderate_points,
                format!("ML model: moderate fraud probability ({}%)", ml_score),
            ))
        } else {
            None
        }
    }
}
