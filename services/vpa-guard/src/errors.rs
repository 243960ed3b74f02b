use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    fn code(&self) -> &'static str {
        match self {
            ServiceError::DatabaseError(_) => "DATABASE_ERROR",
            ServiceError::RedisError(_) => "CACHE_ERROR",
            ServiceError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            ServiceError::ValidationError(_) => "VALIDATION_ERROR",
            ServiceError::Unavailable(_) => "SERVICE_UNAVAILABLE",
            ServiceError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        let body = serde_json::json!({
            "error": self.code(),
            "message": self.to_string()
        });

        match self {
            ServiceError::ValidationError(_) => HttpResponse::BadRequest().json(body),
            ServiceError::Unavailable(_) => HttpResponse::ServiceUnavailable().json(body),
            _ => HttpResponse::InternalServerError().json(body),
        }
    }
}

impl From<vpa_risk_engine::Error> for ServiceError {
    fn from(err: vpa_risk_engine::Error) -> Self {
        match err {
            vpa_risk_engine::Error::InvalidRequest(msg) => ServiceError::ValidationError(msg),
            vpa_risk_engine::Error::InvalidConfig(msg) => ServiceError::ConfigurationError(msg),
            vpa_risk_engine::Error::Model(msg) => ServiceError::InternalError(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
