//! Error types for the VPA risk engine

use thiserror::Error;

/// Risk engine error
///
/// Oracle failures never surface here; they are reported as tagged outcomes
/// and absorbed by the aggregator.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input failed schema validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Classifier artifact could not be loaded or evaluated
    #[error("Model error: {0}")]
    Model(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
