use crate::errors::ServiceResult;
use crate::metrics::{self, CACHE_HITS, CACHE_MISSES};
use crate::store::ReportStore;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};
use vpa_risk_engine::{BlacklistLookup, BlacklistOracle};

const KEY_PREFIX: &str = "vpa-guard:reports:";

/// Read-through cache of report counts
#[derive(Clone)]
pub struct ReportCache {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl ReportCache {
    pub async fn connect(url: &str, ttl_seconds: u64) -> ServiceResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(ReportCache { conn, ttl_seconds })
    }

    fn key(vpa: &str) -> String {
        format!("{}{}", KEY_PREFIX, vpa)
    }

    pub async fn get(&self, vpa: &str) -> ServiceResult<Option<u64>> {
        let mut conn = self.conn.clone();
        let value = redis::cmd("GET")
            .arg(Self::key(vpa))
            .query_async::<_, Option<u64>>(&mut conn)
            .await?;
        Ok(value)
    }

    pub async fn put(&self, vpa: &str, count: u64) -> ServiceResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(Self::key(vpa))
            .arg(count)
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn invalidate(&self, vpa: &str) -> ServiceResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(Self::key(vpa))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

/// Blacklist oracle over the scam-report store
pub struct PgBlacklist {
    store: ReportStore,
    cache: Option<ReportCache>,
}

impl PgBlacklist {
    pub fn new(store: ReportStore, cache: Option<ReportCache>) -> Self {
        PgBlacklist { store, cache }
    }

    async fn cached_count(&self, vpa: &str) -> Option<u64> {
        let cache = self.cache.as_ref()?;
        match cache.get(vpa).await {
            Ok(Some(count)) => {
                CACHE_HITS.inc();
                Some(count)
            }
            Ok(None) => {
                CACHE_MISSES.inc();
                None
            }
            Err(e) => {
                debug!(error = %e, "Report cache read failed");
                None
            }
        }
    }
}

#[async_trait]
impl BlacklistOracle for PgBlacklist {
    async fn lookup(&self, receiver_vpa: &str) -> BlacklistLookup {
        if let Some(count) = self.cached_count(receiver_vpa).await {
            metrics::record_oracle("blacklist", if count > 0 { "hit" } else { "miss" });
            return BlacklistLookup::Matches(count);
        }

        match self.store.count_reports(receiver_vpa).await {
            Ok(count) => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.put(receiver_vpa, count).await {
                        debug!(error = %e, "Report cache write failed");
                    }
                }
                metrics::record_oracle("blacklist", if count > 0 { "hit" } else { "miss" });
                BlacklistLookup::Matches(count)
            }
            Err(e) => {
                warn!(error = %e, "Scam report lookup failed");
                metrics::record_oracle("blacklist", "unavailable");
                BlacklistLookup::Unavailable
            }
        }
    }
}
