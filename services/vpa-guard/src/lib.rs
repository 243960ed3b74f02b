pub mod blacklist;
pub mod circuit;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod semantic_client;
pub mod store;

// Re-exports for convenience
pub use blacklist::{PgBlacklist, ReportCache};
pub use semantic_client::LlmSemanticOracle;
