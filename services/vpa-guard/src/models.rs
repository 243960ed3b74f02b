use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use vpa_risk_engine::{AggregationResult, TierFinding, TransactionRequest, Verdict};

// ===== Risk Check Request =====
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct CheckRiskRequest {
    #[serde(default, alias = "sender_upi_id")]
    #[validate(length(max = 256))]
    pub sender_vpa: String,
    #[serde(alias = "receiver_upi_id")]
    #[validate(length(min = 1, max = 256))]
    pub receiver_vpa: String,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl From<CheckRiskRequest> for TransactionRequest {
    fn from(req: CheckRiskRequest) -> Self {
        TransactionRequest {
            sender_vpa: req.sender_vpa,
            receiver_vpa: req.receiver_vpa,
            amount: req.amount,
            timestamp: req.timestamp,
        }
    }
}

// ===== Risk Check Response =====
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckRiskResponse {
    pub risk_score: u8,
    pub verdict: Verdict,
    pub breakdown: Vec<TierFinding>,
    pub reasons: Vec<String>,
}

impl From<AggregationResult> for CheckRiskResponse {
    fn from(result: AggregationResult) -> Self {
        let reasons = result.breakdown.labels();
        CheckRiskResponse {
            risk_score: result.risk_score.score(),
            verdict: result.verdict,
            breakdown: result.breakdown.into_iter().collect(),
            reasons,
        }
    }
}

// ===== Transaction Log =====
#[derive(Debug, Clone)]
pub struct TransactionLog {
    pub sender_vpa: String,
    pub receiver_vpa: String,
    pub amount: f64,
    pub risk_score: i32,
    pub verdict: Verdict,
    pub risk_factors: Vec<String>,
}

// ===== Scam Reports =====
#[derive(Debug, Deserialize, Validate)]
pub struct ScamReportRequest {
    #[serde(default)]
    #[validate(length(max = 128))]
    pub reporter_id: Option<String>,
    #[serde(alias = "scammer_upi_id")]
    #[validate(length(min = 1, max = 256))]
    pub scammer_vpa: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub evidence_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ScamReport {
    pub id: Uuid,
    pub reporter_id: Option<String>,
    pub scammer_vpa: String,
    pub description: Option<String>,
    pub evidence_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ScamReportResponse {
    pub message: String,
    pub report: ScamReport,
}

// ===== Merchant Dashboard =====
#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct MerchantStats {
    pub total_transactions: i64,
    pub fraud_blocked: i64,
    pub total_reports: i64,
}

// ===== Circuit Breaker =====
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum CircuitState {
    Closed,     // Normal operation
    Open,       // Calls short-circuited to Unavailable
    HalfOpen,   // Testing recovery
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CircuitBreakerState {
    pub id: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub success_count: u32,
    pub recovery_threshold: u32,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub timeout_duration: i64, // seconds
}

// ===== Health Check =====
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: String,
    pub classifier_loaded: bool,
    pub semantic_configured: bool,
}
