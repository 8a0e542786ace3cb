use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis pool error: {0}")]
    RedisPool(#[from] deadpool_redis::PoolError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL not found: {0}")]
    LinkNotFound(String),

    #[error("URL is no longer active: {0}")]
    LinkGone(String),

    #[error("URL has expired: {0}")]
    LinkExpired(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Short code already exists: {0}")]
    DuplicateCode(String),

    #[error("Custom alias already exists: {0}")]
    AliasConflict(String),

    #[error("Short code generation exhausted all attempts")]
    GenerationExhausted,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Environment variable missing: {0}")]
    MissingEnvVar(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the underlying database error is a foreign key violation.
    /// Used by the click worker to drop events for links deleted mid-flight.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(sqlx::Error::Database(db)) if db.is_foreign_key_violation()
        )
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail, error_code) = match &self {
            AppError::LinkNotFound(_) => (StatusCode::NOT_FOUND, self.to_string(), "NOT_FOUND"),
            AppError::LinkGone(_) => (StatusCode::GONE, self.to_string(), "GONE"),
            AppError::LinkExpired(_) => (StatusCode::GONE, self.to_string(), "EXPIRED"),
            AppError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, self.to_string(), "INVALID_URL"),
            AppError::AliasConflict(_) | AppError::DuplicateCode(_) => {
                (StatusCode::CONFLICT, self.to_string(), "ALIAS_CONFLICT")
            }
            AppError::GenerationExhausted => {
                tracing::error!("Short code generation exhausted all attempts");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not allocate a short code".to_string(),
                    "GENERATION_EXHAUSTED",
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    "DATABASE_ERROR",
                )
            }
            AppError::Migration(e) => {
                tracing::error!("Migration error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Migration error occurred".to_string(),
                    "MIGRATION_ERROR",
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Cache error occurred".to_string(),
                    "CACHE_ERROR",
                )
            }
            AppError::RedisPool(e) => {
                tracing::error!("Redis pool error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Cache error occurred".to_string(),
                    "CACHE_ERROR",
                )
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Data serialization error".to_string(),
                    "SERIALIZATION_ERROR",
                )
            }
            _ => {
                tracing::error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = json!({
            "error": error_code,
            "detail": detail,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for AppResult
pub type AppResult<T> = Result<T, AppError>;
