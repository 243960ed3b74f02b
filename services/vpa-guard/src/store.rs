//! Postgres access for scam reports and the transaction log
//!
//! Expected tables:
//! - `scam_reports (id uuid, reporter_id text, scammer_vpa text, description text,
//!   evidence_url text, created_at timestamptz)`
//! - `transactions (id uuid, sender_vpa text, receiver_vpa text, amount double precision,
//!   risk_score integer, verdict text, risk_factors jsonb, created_at timestamptz)`

use crate::errors::ServiceResult;
use crate::models::{MerchantStats, ScamReport, ScamReportRequest, TransactionLog};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ReportStore {
    pool: PgPool,
}

impl ReportStore {
    pub fn new(pool: PgPool) -> Self {
        ReportStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Exact-match report count for a VPA
    pub async fn count_reports(&self, vpa: &str) -> ServiceResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM scam_reports WHERE scammer_vpa = $1")
                .bind(vpa)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as u64)
    }

    pub async fn insert_report(&self, req: &ScamReportRequest) -> ServiceResult<ScamReport> {
        let report = sqlx::query_as::<_, ScamReport>(
            "INSERT INTO scam_reports (id, reporter_id, scammer_vpa, description, evidence_url, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, reporter_id, scammer_vpa, description, evidence_url, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&req.reporter_id)
        .bind(req.scammer_vpa.trim())
        .bind(&req.description)
        .bind(&req.evidence_url)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(report)
    }

    pub async fn log_transaction(&self, log: &TransactionLog) -> ServiceResult<Uuid> {
        let id = Uuid::new_v4();
        let factors = serde_json::to_value(&log.risk_factors)
            .map_err(|e| crate::errors::ServiceError::InternalError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO transactions (id, sender_vpa, receiver_vpa, amount, risk_score, verdict, risk_factors, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(&log.sender_vpa)
        .bind(&log.receiver_vpa)
        .bind(log.amount)
        .bind(log.risk_score)
        .bind(log.verdict.as_str())
        .bind(factors)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn merchant_stats(&self) -> ServiceResult<MerchantStats> {
        let total_transactions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        let fraud_blocked: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE verdict IN ('MALICIOUS', 'SUSPICIOUS')",
        )
        .fetch_one(&self.pool)
        .await?;

        let total_reports: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scam_reports")
            .fetch_one(&self.pool)
            .await?;

        Ok(MerchantStats {
            total_transactions,
            fraud_blocked,
            total_reports,
        })
    }
}
