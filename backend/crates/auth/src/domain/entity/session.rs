//! Session-store records
//!
//! Both records live only in the key-value store and are serialized as JSON.
//! Presence of the key is what makes them live.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::{email::Email, user_id::UserId};

pub const REFRESH_KEY_PREFIX: &str = "refresh:";
pub const VERIFY_KEY_PREFIX: &str = "verify:";

/// Server-side half of a refresh token, stored at `refresh:<jti>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSession {
    pub user_id: UserId,
    pub jti: String,
    pub created_at: DateTime<Utc>,
    /// Sliding expiry, moved forward on every rotation
    pub expires_at: DateTime<Utc>,
    /// Hard ceiling fixed at first issue and carried through rotations
    pub absolute_expire_at: DateTime<Utc>,
}

impl RefreshSession {
    pub fn key_for(jti: &str) -> String {
        format!("{REFRESH_KEY_PREFIX}{jti}")
    }

    pub fn key(&self) -> String {
        Self::key_for(&self.jti)
    }

    pub fn is_past_ceiling(&self, now: DateTime<Utc>) -> bool {
        now >= self.absolute_expire_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at || self.is_past_ceiling(now)
    }
}

/// Pending email verification, stored at `verify:<token>`. Single use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub email: Email,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationRequest {
    pub fn key_for(token: &str) -> String {
        format!("{VERIFY_KEY_PREFIX}{token}")
    }
}
