//! Sign Out Use Case
//!
//! Revokes the refresh session behind a cookie.

use crate::application::session_manager::SessionManager;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<U, S> {
    sessions: SessionManager<U, S>,
}

impl<U, S> SignOutUseCase<U, S>
where
    U: UserRepository + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(sessions: SessionManager<U, S>) -> Self {
        Self { sessions }
    }

    /// An expired token with a valid signature still signs out. A forged or
    /// malformed one is rejected, and so is a store failure.
    pub async fn execute(&self, refresh_token: &str) -> AuthResult<()> {
        self.sessions.revoke(refresh_token).await?;
        tracing::info!("User signed out");
        Ok(())
    }
}
