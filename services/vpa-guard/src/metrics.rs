use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

lazy_static! {
    // HTTP metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"]
    ).expect("metric can be created");

    // Risk checks
    pub static ref RISK_CHECKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("risk_checks_total", "Risk checks by verdict"),
        &["verdict"]
    ).expect("metric can be created");

    pub static ref RISK_SCORE: Histogram = Histogram::with_opts(
        HistogramOpts::new("risk_score_distribution", "Distribution of final risk scores")
            .buckets(vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0])
    ).expect("metric can be created");

    pub static ref RISK_CHECK_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("risk_check_duration_seconds", "Risk check latency in seconds")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 3.0, 5.0]),
        &["verdict"]
    ).expect("metric can be created");

    // Oracle outcomes: oracle = blacklist|semantic, outcome = hit|miss|unavailable|malformed|...
    pub static ref ORACLE_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("oracle_outcomes_total", "Oracle call outcomes"),
        &["oracle", "outcome"]
    ).expect("metric can be created");

    pub static ref SCAM_REPORTS_TOTAL: IntCounter = IntCounter::new(
        "scam_reports_total",
        "Total scam reports submitted"
    ).expect("metric can be created");

    // Redis cache metrics
    pub static ref CACHE_HITS: IntCounter = IntCounter::new(
        "cache_hits_total",
        "Total cache hits"
    ).expect("metric can be created");

    pub static ref CACHE_MISSES: IntCounter = IntCounter::new(
        "cache_misses_total",
        "Total cache misses"
    ).expect("metric can be created");
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), Box<dyn std::error::Error>> {
    registry.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    registry.register(Box::new(RISK_CHECKS_TOTAL.clone()))?;
    registry.register(Box::new(RISK_SCORE.clone()))?;
    registry.register(Box::new(RISK_CHECK_DURATION.clone()))?;
    registry.register(Box::new(ORACLE_OUTCOMES.clone()))?;
    registry.register(Box::new(SCAM_REPORTS_TOTAL.clone()))?;
    registry.register(Box::new(CACHE_HITS.clone()))?;
    registry.register(Box::new(CACHE_MISSES.clone()))?;
    Ok(())
}

pub fn record_oracle(oracle: &str, outcome: &str) {
    ORACLE_OUTCOMES.with_label_values(&[oracle, outcome]).inc();
}

/// Generate metrics output in Prometheus text format
pub fn render(registry: &Registry) -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let registry = Registry::new();
        assert!(register_metrics(&registry).is_ok());
    }

    #[test]
    fn test_render_includes_counters() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();
        SCAM_REPORTS_TOTAL.inc();
        record_oracle("blacklist", "unavailable");

        let output = render(&registry).unwrap();
        assert!(output.contains("scam_reports_total"));
        assert!(output.contains("oracle_outcomes_total"));
    }
}
