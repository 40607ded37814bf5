//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::TokenPair;
use crate::domain::entity::user::User;

// ============================================================================
// Register / Verify
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub login: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Login / Refresh
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of every response that hands out an access token. The refresh token
/// travels only in its cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
}

impl From<&TokenPair> for TokenResponse {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            expires_in: pair.expires_in,
        }
    }
}

// ============================================================================
// OAuth
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub role: String,
    pub email_verified: bool,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_i64(),
            login: user.login.as_str().to_string(),
            email: user.email.as_str().to_string(),
            role: user.role.code().to_string(),
            email_verified: user.email_verified,
            full_name: user.full_name,
            avatar: user.avatar,
            rating: user.rating,
            created_at: user.created_at,
        }
    }
}
