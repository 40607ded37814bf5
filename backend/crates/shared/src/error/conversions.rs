//! HTTP rendering of [`AppError`].

#[cfg(feature = "axum")]
use super::app_error::AppError;

// ============================================================================
// Axum (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 Problem Details
        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "action": self.action(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(all(test, feature = "axum"))]
mod tests {
    use super::*;
    use crate::error::kind::ErrorKind;
    use axum::response::IntoResponse;

    #[test]
    fn test_client_closed_request_renders_499() {
        let response =
            AppError::new(ErrorKind::ClientClosedRequest, "Request cancelled").into_response();
        assert_eq!(response.status().as_u16(), 499);
    }

    #[tokio::test]
    async fn test_problem_body_carries_action() {
        let response = AppError::new(ErrorKind::Unauthorized, "Email not verified")
            .with_action("Check your inbox")
            .into_response();
        assert_eq!(response.status().as_u16(), 401);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["title"], "Unauthorized");
        assert_eq!(body["detail"], "Email not verified");
        assert_eq!(body["action"], "Check your inbox");
    }
}
