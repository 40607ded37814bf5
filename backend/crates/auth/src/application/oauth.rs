//! OAuth2 Federation Use Case
//!
//! Authorization-code login through an external identity provider. The
//! `state` round-trips through a short-lived cookie and is compared in
//! constant time on the callback.

use std::sync::Arc;

use platform::crypto::{constant_time_eq, random_token};

use crate::application::password::PasswordService;
use crate::application::session_manager::{SessionManager, TokenPair};
use crate::domain::entity::user::{NewUser, User};
use crate::domain::gateway::{ExternalProfile, IdentityProvider};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{
    email::Email, login::Login, user_password::RawPassword, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Bytes of entropy in the state value
const STATE_BYTES: usize = 32;
/// Attempts at a free login before giving up
const LOGIN_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Callback parameters. Every field may be missing on a hostile request.
#[derive(Debug, Default)]
pub struct CallbackInput {
    pub query_state: Option<String>,
    pub code: Option<String>,
    pub cookie_state: Option<String>,
}

#[derive(Debug)]
pub struct FederatedSignIn {
    pub tokens: TokenPair,
    pub user: User,
    /// True when this login created the account
    pub created: bool,
}

pub struct OAuthUseCase<U, S, P> {
    user_repo: Arc<U>,
    sessions: SessionManager<U, S>,
    passwords: PasswordService,
    provider: Arc<P>,
}

impl<U, S, P> OAuthUseCase<U, S, P>
where
    U: UserRepository + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
    P: IdentityProvider + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        sessions: SessionManager<U, S>,
        passwords: PasswordService,
        provider: Arc<P>,
    ) -> Self {
        Self {
            user_repo,
            sessions,
            passwords,
            provider,
        }
    }

    pub fn begin(&self) -> AuthorizationRequest {
        let state = random_token(STATE_BYTES);
        AuthorizationRequest {
            url: self.provider.authorization_url(&state),
            state,
        }
    }

    pub async fn complete(&self, input: CallbackInput) -> AuthResult<FederatedSignIn> {
        let (Some(query_state), Some(cookie_state)) = (&input.query_state, &input.cookie_state)
        else {
            return Err(AuthError::StateMismatch);
        };
        if !constant_time_eq(query_state.as_bytes(), cookie_state.as_bytes()) {
            return Err(AuthError::StateMismatch);
        }

        let code = input
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AuthError::InvalidInput("Authorization code is required".to_string()))?;

        let access_token = self
            .sessions
            .bounded(self.provider.exchange_code(code))
            .await?;
        let profile = self
            .sessions
            .bounded(self.provider.fetch_user_info(&access_token))
            .await?;

        let (user, created) = self.reconcile(profile).await?;
        let tokens = self.sessions.issue_token_pair(&user).await?;

        tracing::info!(user_id = %user.id, created, "Federated sign in");
        Ok(FederatedSignIn {
            tokens,
            user,
            created,
        })
    }

    /// Match the profile to a local account by external id, then by email,
    /// and create one when neither matches.
    async fn reconcile(&self, profile: ExternalProfile) -> AuthResult<(User, bool)> {
        if let Some(user) = self
            .sessions
            .bounded(self.user_repo.find_by_external_id(&profile.id))
            .await?
        {
            return Ok((user, false));
        }

        let email = Email::new(profile.email.as_str())
            .map_err(|_| AuthError::ProviderError("provider returned an invalid email".into()))?;

        if let Some(mut user) = self
            .sessions
            .bounded(self.user_repo.find_by_email(&email))
            .await?
        {
            user.link_external_identity(profile.id, profile.verified_email);
            self.sessions.bounded(self.user_repo.update(&user)).await?;
            tracing::info!(user_id = %user.id, "External identity linked");
            return Ok((user, false));
        }

        let password_hash = self.passwords.hash(RawPassword::random_placeholder()).await?;

        let mut suffix = String::new();
        for _ in 0..LOGIN_ATTEMPTS {
            let login =
                Login::derive(email.local_part(), &suffix).map_err(AuthError::invalid_input)?;
            let new_user = NewUser {
                login,
                email: email.clone(),
                password_hash: password_hash.clone(),
                role: UserRole::User,
                email_verified: profile.verified_email,
                external_id: Some(profile.id.clone()),
                full_name: profile.name.clone(),
                avatar: profile.picture.clone(),
            };

            match self.sessions.bounded(self.user_repo.create(new_user)).await {
                Ok(user) => return Ok((user, true)),
                Err(AuthError::DuplicateLogin) => suffix = login_suffix(),
                Err(e) => return Err(e),
            }
        }

        Err(AuthError::Internal(
            "could not find a free login for federated account".to_string(),
        ))
    }
}

/// Four random ASCII alphanumerics.
fn login_suffix() -> String {
    random_token(16)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_suffix_shape() {
        for _ in 0..32 {
            let suffix = login_suffix();
            assert_eq!(suffix.len(), 4);
            assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }
}
