//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Response bodies only ever carry the
//! fixed public message of a variant. Anything inside a variant's payload
//! (SQL errors, provider responses, store failures) goes to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::deadline::DeadlineElapsed;
use thiserror::Error;

use crate::domain::token::TokenError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Request validation failed. The message is safe to show.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Email already taken")]
    EmailTaken,

    #[error("Login already taken")]
    DuplicateLogin,

    #[error("External identity already linked")]
    DuplicateExternalId,

    /// Unknown email and wrong password share this variant.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not verified")]
    EmailNotVerified,

    /// Missing or malformed `Authorization` header
    #[error("Authorization required")]
    Unauthorized,

    #[error("Token rejected: {0}")]
    Token(#[from] TokenError),

    /// Refresh session absent from the store (rotated, revoked or reaped)
    #[error("Refresh session revoked")]
    SessionRevoked,

    /// Refresh session past its sliding expiry or absolute ceiling
    #[error("Refresh session expired")]
    SessionExpired,

    /// Verification token unknown, consumed or expired
    #[error("Invalid or expired verification token")]
    InvalidOrExpired,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("No refresh token found")]
    MissingRefreshCookie,

    #[error("Authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Identity provider error: {0}")]
    ProviderError(String),

    #[error("Email delivery failed: {0}")]
    EmailDelivery(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    Store(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(#[from] DeadlineElapsed),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Wrap a value-object validation failure. Its message is user-facing.
    pub fn invalid_input(err: AppError) -> Self {
        AuthError::InvalidInput(err.message().to_string())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidInput(_)
            | AuthError::EmailTaken
            | AuthError::DuplicateLogin
            | AuthError::StateMismatch
            | AuthError::MissingRefreshCookie => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::EmailNotVerified
            | AuthError::Unauthorized
            | AuthError::Token(_)
            | AuthError::SessionRevoked
            | AuthError::SessionExpired
            | AuthError::InvalidOrExpired => ErrorKind::Unauthorized,
            AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::DuplicateExternalId => ErrorKind::Conflict,
            AuthError::ExchangeFailed(_)
            | AuthError::ProviderError(_)
            | AuthError::EmailDelivery(_) => ErrorKind::BadGateway,
            AuthError::Cancelled(_) => ErrorKind::ClientClosedRequest,
            AuthError::Database(_) | AuthError::Store(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Message rendered to the client.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::InvalidInput(msg) => msg.clone(),
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::Unauthorized | AuthError::Token(_) => "Invalid or missing token".to_string(),
            AuthError::SessionRevoked | AuthError::SessionExpired => {
                "Invalid or expired refresh token".to_string()
            }
            AuthError::StateMismatch => "Invalid OAuth state".to_string(),
            AuthError::ExchangeFailed(_) => "Failed to exchange authorization code".to_string(),
            AuthError::ProviderError(_) => "Failed to fetch user info".to_string(),
            AuthError::EmailDelivery(_) => "Failed to send verification email".to_string(),
            AuthError::Cancelled(_) => "Request cancelled".to_string(),
            AuthError::Database(_) | AuthError::Store(_) | AuthError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.public_message());
        match self {
            AuthError::EmailNotVerified => {
                err.with_action("Follow the link in the verification email")
            }
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Store(msg) => {
                tracing::error!(error = %msg, "Session store error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::ExchangeFailed(msg)
            | AuthError::ProviderError(msg)
            | AuthError::EmailDelivery(msg) => {
                tracing::error!(error = %msg, kind = %self.kind(), "Upstream failure");
            }
            AuthError::Cancelled(e) => {
                tracing::warn!(error = %e, "Auth operation cancelled");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::StateMismatch => {
                tracing::warn!("OAuth callback with mismatched state");
            }
            AuthError::Token(e) => {
                tracing::debug!(reason = %e, "Token rejected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(err: redis::RedisError) -> Self {
        AuthError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Internal(format!("serialization: {err}"))
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::EmailTaken.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::DuplicateLogin.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::EmailNotVerified.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::StateMismatch.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::ExchangeFailed("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AuthError::Cancelled(DeadlineElapsed(std::time::Duration::from_secs(1)))
                .status_code()
                .as_u16(),
            499
        );
    }

    #[test]
    fn test_internal_details_are_not_rendered() {
        let err = AuthError::Store("READONLY You can't write against a read only replica".into());
        assert_eq!(err.to_app_error().message(), "Internal server error");

        let err = AuthError::ProviderError("401 from https://www.googleapis.com".into());
        assert!(!err.to_app_error().message().contains("googleapis"));
    }

    #[test]
    fn test_credential_failures_are_opaque() {
        // Same message whether the account exists or not.
        assert_eq!(
            AuthError::InvalidCredentials.public_message(),
            "Invalid email or password"
        );
    }
}
