//! User account queries for protected routes

use std::sync::Arc;

use crate::application::session_manager::SessionManager;
use crate::domain::entity::user::User;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

pub struct UserAccountUseCase<U, S> {
    user_repo: Arc<U>,
    sessions: SessionManager<U, S>,
}

impl<U, S> UserAccountUseCase<U, S>
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

    pub async fn profile(&self, id: UserId) -> AuthResult<User> {
        self.sessions
            .bounded(self.user_repo.find_by_id(id))
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn delete(&self, id: UserId, acting: UserId) -> AuthResult<()> {
        if !self.sessions.bounded(self.user_repo.delete(id)).await? {
            return Err(AuthError::UserNotFound);
        }
        tracing::info!(user_id = %id, by = %acting, "User deleted");
        Ok(())
    }
}
