use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vpa_guard::{
    circuit::CircuitBreaker,
    config::{Config, LoggingConfig},
    database, handlers,
    handlers::AppState,
    metrics,
    middleware::{RateLimiter, RequestMetrics},
    store::ReportStore,
    LlmSemanticOracle, PgBlacklist, ReportCache,
};
use vpa_risk_engine::{
    BlacklistOracle, ClassifierOracle, Disabled, HeuristicScorer, LexicalFeatureExtractor,
    RiskAggregator, SemanticOracle, TreeEnsembleClassifier,
};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    if logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).pretty().init();
    }
}

#[cfg(target_os = "linux")]
fn register_process_metrics(registry: &Registry) {
    let collector = prometheus::process_collector::ProcessCollector::for_self();
    if let Err(e) = registry.register(Box::new(collector)) {
        warn!("Process metrics unavailable: {}", e);
    }
}

#[cfg(not(target_os = "linux"))]
fn register_process_metrics(_registry: &Registry) {}

fn io_error(msg: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, msg)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env().map_err(|e| io_error(format!("Failed to load configuration: {}", e)))?;
    init_tracing(&config.logging);

    info!("Starting VPA Guard...");

    // Metrics registry
    let registry = Registry::new();
    metrics::register_metrics(&registry).map_err(|e| io_error(format!("Metrics registration failed: {}", e)))?;
    register_process_metrics(&registry);

    // Scam report store
    let store = match &config.database.url {
        Some(url) => match database::create_pool(&config.database, url) {
            Ok(pool) => {
                if let Err(e) = database::health_check(&pool).await {
                    warn!("Database not reachable at startup, blacklist lookups will degrade: {}", e);
                }
                Some(ReportStore::new(pool))
            }
            Err(e) => {
                error!("Failed to create database pool: {}", e);
                None
            }
        },
        None => {
            warn!("DATABASE_URL not set, blacklist tier disabled");
            None
        }
    };

    // Report count cache
    let cache = match &config.redis.url {
        Some(url) => match ReportCache::connect(url, config.redis.ttl_seconds).await {
            Ok(cache) => {
                info!("Redis report cache connected");
                Some(cache)
            }
            Err(e) => {
                warn!("Redis unavailable, report counts will not be cached: {}", e);
                None
            }
        },
        None => None,
    };

    // Oracles
    let blacklist: Arc<dyn BlacklistOracle> = match &store {
        Some(store) => Arc::new(PgBlacklist::new(store.clone(), cache.clone())),
        None => Arc::new(Disabled),
    };

    let classifier = TreeEnsembleClassifier::load(&config.classifier.model_path);
    let classifier_loaded = classifier.is_available();
    let classifier: Arc<dyn ClassifierOracle> = Arc::new(classifier);

    let circuit_breaker = Arc::new(CircuitBreaker::with_config(
        "semantic".to_string(),
        config.semantic.failure_threshold,
        config.semantic.recovery_threshold,
        config.semantic.circuit_timeout_seconds,
    ));

    let semantic: Arc<dyn SemanticOracle> = if config.semantic.api_key.is_some() {
        match LlmSemanticOracle::new(&config.semantic, circuit_breaker.clone()) {
            Ok(oracle) => Arc::new(oracle),
            Err(e) => {
                error!("Semantic oracle disabled: {}", e);
                Arc::new(Disabled)
            }
        }
    } else {
        info!("SEMANTIC_API_KEY not set, semantic tier disabled");
        Arc::new(Disabled)
    };
    let semantic_configured = semantic.is_configured();

    let aggregator = Arc::new(
        RiskAggregator::new(blacklist, classifier, semantic)
            .with_extractor(LexicalFeatureExtractor::new(config.scoring.keywords.clone()))
            .with_heuristics(HeuristicScorer::new(config.scoring.heuristics))
            .with_policy(config.scoring.policy.clone()),
    );

    let state = web::Data::new(AppState {
        store,
        cache,
        started_at: Instant::now(),
        classifier_loaded,
        semantic_configured,
    });

    info!(
        classifier_loaded,
        semantic_configured,
        blacklist_enabled = state.store.is_some(),
        "Risk components initialized"
    );

    let server_config = config.server.clone();
    let rate_limiter = RateLimiter::new(server_config.rate_limit_per_minute);

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::Data::new(aggregator.clone()))
            .app_data(web::Data::new(circuit_breaker.clone()))
            .app_data(web::Data::new(registry.clone()))
            .wrap(rate_limiter.clone())
            .wrap(RequestMetrics)
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(handlers::configure_routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
