//! Verify Email Use Case

use std::sync::Arc;

use crate::application::session_manager::SessionManager;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::error::{AuthError, AuthResult};

pub struct VerifyEmailUseCase<U, S> {
    user_repo: Arc<U>,
    sessions: SessionManager<U, S>,
}

impl<U, S> VerifyEmailUseCase<U, S>
where
    U: UserRepository + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, sessions: SessionManager<U, S>) -> Self {
        Self {
            user_repo,
            sessions,
        }
    }

    /// Consume the token and mark the address verified. Verifying an
    /// already verified account succeeds.
    pub async fn execute(&self, token: &str) -> AuthResult<()> {
        let email = self.sessions.consume_verification(token).await?;

        let Some(mut user) = self
            .sessions
            .bounded(self.user_repo.find_by_email(&email))
            .await?
        else {
            tracing::error!("Verification token consumed for an email with no account");
            return Err(AuthError::InvalidOrExpired);
        };

        if !user.mark_email_verified() {
            return Ok(());
        }
        self.sessions.bounded(self.user_repo.update(&user)).await?;

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(())
    }
}
