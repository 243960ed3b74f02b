use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use vpa_risk_engine::{AggregationPolicy, HeuristicWeights, KeywordDenylist};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub classifier: ClassifierConfig,
    pub semantic: SemanticConfig,
    pub scoring: ScoringConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub rate_limit_per_minute: u32,
}

/// Scam-report store. No URL means the blacklist tier is disabled.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClassifierConfig {
    pub model_path: String,
}

/// Language-model fallback. No API key means the tier is skipped.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SemanticConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout_ms: u64,
    pub failure_threshold: u32,
    pub recovery_threshold: u32,
    pub circuit_timeout_seconds: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScoringConfig {
    #[serde(default)]
    pub keywords: KeywordDenylist,
    #[serde(default)]
    pub heuristics: HeuristicWeights,
    #[serde(default)]
    pub policy: AggregationPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_keywords: Vec<String> = KeywordDenylist::DEFAULT_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .collect();

        let mut builder = config::Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8090)?
            .set_default("server.workers", 4)?
            .set_default("server.rate_limit_per_minute", 600)?
            // Database defaults
            .set_default("database.max_connections", 20)?
            .set_default("database.acquire_timeout_seconds", 5)?
            // Redis defaults
            .set_default("redis.ttl_seconds", 300)?
            // Classifier defaults
            .set_default("classifier.model_path", "models/fraud_xgb_model.json")?
            // Semantic fallback defaults
            .set_default("semantic.endpoint", "https://api.openai.com/v1/chat/completions")?
            .set_default("semantic.model", "gpt-4o-mini")?
            .set_default("semantic.timeout_ms", 3000)?
            .set_default("semantic.failure_threshold", 5)?
            .set_default("semantic.recovery_threshold", 2)?
            .set_default("semantic.circuit_timeout_seconds", 30)?
            // Scoring defaults
            .set_default("scoring.keywords", default_keywords)?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?;

        builder = builder
            .add_source(File::with_name("config/vpa-guard").required(false))
            .add_source(Environment::with_prefix("VPA_GUARD").separator("__"));

        // Override from conventional environment variables
        if let Ok(port) = env::var("SERVICE_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Some(db_url) = non_empty_var("DATABASE_URL") {
            builder = builder.set_override("database.url", db_url)?;
        }

        if let Some(redis_url) = non_empty_var("REDIS_URL") {
            builder = builder.set_override("redis.url", redis_url)?;
        }

        if let Some(model_path) = non_empty_var("MODEL_PATH") {
            builder = builder.set_override("classifier.model_path", model_path)?;
        }

        if let Some(api_key) = non_empty_var("SEMANTIC_API_KEY") {
            builder = builder.set_override("semantic.api_key", api_key)?;
        }

        let mut config: Config = builder.build()?.try_deserialize()?;
        config.normalize();
        Ok(config)
    }

    // Blank strings from env files mean "not configured"
    fn normalize(&mut self) {
        for value in [
            &mut self.database.url,
            &mut self.redis.url,
            &mut self.semantic.api_key,
        ] {
            if value.as_deref().map_or(false, |v| v.trim().is_empty()) {
                *value = None;
            }
        }

        self.semantic.timeout_ms =
            client_timeout_ms(self.scoring.policy.semantic_timeout_ms, self.semantic.timeout_ms);
    }
}

/// Headroom between the HTTP client timeout and the aggregator's bound
pub const CLIENT_TIMEOUT_MARGIN_MS: u64 = 250;

/// HTTP client timeout for the semantic endpoint. It always expires before the
/// aggregator's bound, so a slow endpoint is recorded as a breaker failure
/// instead of being dropped mid-call.
pub fn client_timeout_ms(policy_timeout_ms: u64, configured_ms: u64) -> u64 {
    let ceiling = if policy_timeout_ms > CLIENT_TIMEOUT_MARGIN_MS {
        policy_timeout_ms - CLIENT_TIMEOUT_MARGIN_MS
    } else {
        policy_timeout_ms / 2
    };
    configured_ms.min(ceiling).max(1)
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
