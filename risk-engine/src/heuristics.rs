//! Fixed-weight heuristic scoring over lexical signals

use crate::features::LexicalSignals;
use crate::{Tier, TierFinding};
use serde::{Deserialize, Serialize};

/// Points awarded per fired signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    /// Denylisted keyword present
    pub keyword_points: f64,
    /// Numeric handle before `@`
    pub numeric_handle_points: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            keyword_points: 30.0,
            numeric_handle_points: 10.0,
        }
    }
}

/// Points and findings from the heuristic tier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeuristicOutcome {
    /// Sum of fired weights
    pub points: f64,
    /// One finding per fired signal
    pub findings: Vec<TierFinding>,
}

/// Heuristic scorer
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    weights: HeuristicWeights,
}

impl HeuristicScorer {
    /// Create a scorer with the given weights
    pub fn new(weights: HeuristicWeights) -> Self {
        Self { weights }
    }

    /// Score the signals; silent signals add nothing to the breakdown
    pub fn score(&self, signals: &LexicalSignals) -> HeuristicOutcome {
        let mut outcome = HeuristicOutcome::default();

        if let Some(keyword) = &signals.matched_keyword {
            outcome.points += self.weights.keyword_points;
            outcome.findings.push(TierFinding::new(
                Tier::Heuristic,
                self.weights.keyword_points,
                format!("Suspicious keyword in VPA: '{}'", keyword),
            ));
        }

        if signals.is_numeric_handle {
            outcome.points += self.weights.numeric_handle_points;
            outcome.findings.push(TierFinding::new(
                Tier::Heuristic,
                self.weights.numeric_handle_points,
                "Numeric-only VPA handle",
            ));
        }

        outcome
    }

    /// Configured weights
    pub fn weights(&self) -> &HeuristicWeights {
        &self.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::LexicalFeatureExtractor;

    fn score(vpa: &str) -> HeuristicOutcome {
        let signals = LexicalFeatureExtractor::default().extract(vpa);
        HeuristicScorer::default().score(&signals)
    }

    #[test]
    fn test_clean_vpa_scores_zero() {
        let outcome = score("merchant@okicici");
        assert_eq!(outcome.points, 0.0);
        assert!(outcome.findings.is_empty());
    }

    #[test]
    fn test_keyword_and_numeric_handle() {
        let outcome = score("12345@ybl");
        assert_eq!(outcome.points, 10.0);
        assert_eq!(outcome.findings.len(), 1);

        let outcome = score("refund_support@axis");
        assert_eq!(outcome.points, 30.0);
        assert_eq!(outcome.findings[0].tier, Tier::Heuristic);

        let outcome = score("777@cash");
        assert_eq!(outcome.points, 40.0);
        assert_eq!(outcome.findings.len(), 2);
    }

    #[test]
    fn test_custom_weights() {
        let signals = LexicalFeatureExtractor::default().extract("lucky@upi");
        let scorer = HeuristicScorer::new(HeuristicWeights {
            keyword_points: 45.0,
            numeric_handle_points: 5.0,
        });
        assert_eq!(scorer.score(&signals).points, 45.0);
    }
}
