use serde::Serialize;

/// Confirmation body for delete operations
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub database: HealthStatus,
    pub cache: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Individual health status
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub latency_ms: Option<u64>,
}
