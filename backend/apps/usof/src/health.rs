//! Liveness probe

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const SERVICE_NAME: &str = "usof";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub service: &'static str,
}

/// GET /ping
pub async fn ping() -> Json<HealthResponse> {
    tracing::debug!("Ping endpoint called");
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        service: SERVICE_NAME,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ping_body() {
        let before = Utc::now();
        let Json(response) = ping().await;
        assert!(response.timestamp >= before);

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "usof");
        assert!(body["timestamp"].is_string());
    }
}
