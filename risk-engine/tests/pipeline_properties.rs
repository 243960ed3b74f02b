//! Property-based tests for aggregation invariants
//!
//! - Score bounds: 0 <= risk_score <= 100 for every tier combination
//! - Verdict is a pure function of the final score
//! - Blacklist hits are terminal
//! - Identical inputs and oracle responses give identical results
//! - Entropy is never negative

use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::Arc;
use vpa_risk_engine::features::shannon_entropy;
use vpa_risk_engine::{
    BlacklistLookup, BlacklistOracle, ClassifierOracle, ClassifierOutcome, Disabled,
    FeatureVector, RiskAggregator, RiskScore, SemanticJudgment, SemanticOracle, SemanticOutcome,
    Tier, TransactionRequest, Verdict,
};

struct StubBlacklist(BlacklistLookup);

#[async_trait]
impl BlacklistOracle for StubBlacklist {
    async fn lookup(&self, _receiver_vpa: &str) -> BlacklistLookup {
        self.0
    }
}

struct StubClassifier(ClassifierOutcome);

impl ClassifierOracle for StubClassifier {
    fn is_available(&self) -> bool {
        true
    }

    fn predict(&self, _features: &FeatureVector) -> ClassifierOutcome {
        self.0
    }
}

struct StubSemantic(SemanticOutcome);

#[async_trait]
impl SemanticOracle for StubSemantic {
    fn is_configured(&self) -> bool {
        true
    }

    async fn assess(&self, _receiver_vpa: &str) -> SemanticOutcome {
        self.0.clone()
    }
}

/// Strategy for receiver VPAs, biased towards the interesting lexical shapes
fn vpa_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,12}@[a-z]{2,8}",
        "[0-9]{1,12}@[a-z]{2,8}",
        "(winner|lottery|refund|kyc|cash)_[a-z0-9]{0,6}@[a-z]{2,6}",
        "[0-9]{1,4}(lucky|offer|funds)@[a-z]{2,6}",
        ".{1,24}",
    ]
    .prop_filter("receiver must not be blank", |s| !s.trim().is_empty())
}

fn blacklist_strategy() -> impl Strategy<Value = BlacklistLookup> {
    prop_oneof![
        Just(BlacklistLookup::Unavailable),
        Just(BlacklistLookup::Matches(0)),
        (1u64..50).prop_map(BlacklistLookup::Matches),
    ]
}

fn classifier_strategy() -> impl Strategy<Value = ClassifierOutcome> {
    prop_oneof![
        Just(ClassifierOutcome::Unavailable),
        (0.0f64..=1.0).prop_map(ClassifierOutcome::Probability),
    ]
}

fn semantic_strategy() -> impl Strategy<Value = SemanticOutcome> {
    prop_oneof![
        Just(SemanticOutcome::Unavailable),
        Just(SemanticOutcome::Malformed),
        (0u8..=100).prop_map(|risk_score| SemanticOutcome::Assessed(SemanticJudgment {
            risk_score,
            reason: "model judgment".to_string(),
        })),
    ]
}

fn aggregator(
    blacklist: BlacklistLookup,
    classifier: ClassifierOutcome,
    semantic: SemanticOutcome,
) -> RiskAggregator {
    RiskAggregator::new(
        Arc::new(StubBlacklist(blacklist)),
        Arc::new(StubClassifier(classifier)),
        Arc::new(StubSemantic(semantic)),
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("test runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_entropy_non_negative(s in ".{0,64}") {
        prop_assert!(shannon_entropy(&s) >= 0.0);
    }

    #[test]
    fn prop_score_bounded_and_verdict_pure(
        vpa in vpa_strategy(),
        amount in 0.0f64..1_000_000.0,
        blacklist in blacklist_strategy(),
        classifier in classifier_strategy(),
        semantic in semantic_strategy(),
    ) {
        let rt = runtime();
        let result = rt
            .block_on(aggregator(blacklist, classifier, semantic)
                .assess_receiver(&TransactionRequest::new("payer@upi", vpa, amount)))
            .unwrap();

        prop_assert!(result.risk_score.score() <= 100);
        prop_assert_eq!(result.verdict, Verdict::from_score(result.risk_score));

        let mut labels = result.breakdown.labels();
        let total = labels.len();
        labels.sort();
        labels.dedup();
        prop_assert_eq!(labels.len(), total);
    }

    #[test]
    fn prop_blacklist_hit_is_terminal(
        vpa in vpa_strategy(),
        reports in 1u64..1000,
        classifier in classifier_strategy(),
        semantic in semantic_strategy(),
    ) {
        let rt = runtime();
        let result = rt
            .block_on(aggregator(BlacklistLookup::Matches(reports), classifier, semantic)
                .assess_receiver(&TransactionRequest::new("payer@upi", vpa, 10.0)))
            .unwrap();

        prop_assert_eq!(result.risk_score, RiskScore::new(100));
        prop_assert_eq!(result.verdict, Verdict::Malicious);
        prop_assert!(!result.breakdown.contains_tier(Tier::Classifier));
        prop_assert!(!result.breakdown.contains_tier(Tier::Semantic));
    }

    #[test]
    fn prop_idempotent(
        vpa in vpa_strategy(),
        amount in 0.0f64..100_000.0,
        blacklist in blacklist_strategy(),
        classifier in classifier_strategy(),
        semantic in semantic_strategy(),
    ) {
        let rt = runtime();
        let engine = aggregator(blacklist, classifier, semantic);
        let req = TransactionRequest::new("payer@upi", vpa, amount);

        let first = rt.block_on(engine.assess_receiver(&req)).unwrap();
        let second = rt.block_on(engine.assess_receiver(&req)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_degraded_tiers_leave_heuristics_only(vpa in vpa_strategy()) {
        let rt = runtime();
        let engine = RiskAggregator::new(
            Arc::new(Disabled),
            Arc::new(Disabled),
            Arc::new(Disabled),
        );
        let result = rt
            .block_on(engine.assess_receiver(&TransactionRequest::new("payer@upi", vpa, 10.0)))
            .unwrap();

        let heuristic_points: f64 = result
            .breakdown
            .findings()
            .iter()
            .map(|f| {
                assert_eq!(f.tier, Tier::Heuristic);
                f.points
            })
            .sum();
        prop_assert_eq!(result.risk_score, RiskScore::from_points(heuristic_points));
    }
}
