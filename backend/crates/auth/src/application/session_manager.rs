//! Session Manager
//!
//! Owns the refresh-token lifecycle and email verification tokens.
//!
//! A refresh token is live exactly while `refresh:<jti>` exists in the
//! session store. Rotation removes the old key with an atomic take before
//! the new one is written, so two concurrent refreshes of the same token
//! cannot both succeed. Access tokens are stateless and cannot be revoked.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::deadline::with_deadline;

use crate::application::config::AuthConfig;
use crate::domain::entity::session::{RefreshSession, VerificationRequest};
use crate::domain::entity::user::User;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::token::{
    AccessClaims, Claims, RefreshClaims, TokenError, TokenKind, TokenMinter, TokenSubject,
};
use crate::domain::value_object::{email::Email, user_id::UserId, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// Credentials handed to the client after login, refresh or federation.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

pub struct SessionManager<U, S> {
    users: Arc<U>,
    store: Arc<S>,
    minter: Arc<TokenMinter>,
    config: Arc<AuthConfig>,
}

impl<U, S> Clone for SessionManager<U, S> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            store: self.store.clone(),
            minter: self.minter.clone(),
            config: self.config.clone(),
        }
    }
}

impl<U, S> SessionManager<U, S>
where
    U: UserRepository + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(
        users: Arc<U>,
        store: Arc<S>,
        minter: Arc<TokenMinter>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            users,
            store,
            minter,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bound a store call by the operation deadline.
    pub(crate) async fn bounded<T>(&self, fut: impl Future<Output = AuthResult<T>>) -> AuthResult<T> {
        with_deadline(self.config.operation_timeout, fut).await?
    }

    /// Mint an access/refresh pair for a fresh login.
    ///
    /// No tokens are returned unless the refresh session was stored.
    pub async fn issue_token_pair(&self, user: &User) -> AuthResult<TokenPair> {
        let now = self.minter.now();
        let expires_at = now + self.config.refresh_ttl;
        let absolute_expire_at = now + self.config.refresh_max_ttl;

        let pair = self
            .store_pair(user.id, user.role, now, expires_at, absolute_expire_at)
            .await?;
        tracing::debug!(user_id = %user.id, "Token pair issued");
        Ok(pair)
    }

    pub fn validate_access(&self, token: &str) -> AuthResult<AccessClaims> {
        Ok(self.minter.parse_access(token)?)
    }

    /// Check a refresh token against its stored session without consuming it.
    pub async fn validate_refresh(
        &self,
        token: &str,
    ) -> AuthResult<(RefreshClaims, RefreshSession)> {
        let claims = self.minter.parse_refresh(token)?;
        let key = RefreshSession::key_for(&claims.jti);
        let bytes = self
            .bounded(self.store.get(&key))
            .await?
            .ok_or(AuthError::SessionRevoked)?;
        let session: RefreshSession = serde_json::from_slice(&bytes)?;

        if session.user_id != claims.user_id {
            return Err(AuthError::SessionRevoked);
        }
        if session.is_expired(self.minter.now()) {
            return Err(AuthError::SessionExpired);
        }
        Ok((claims, session))
    }

    /// Rotate a refresh token.
    ///
    /// The new session keeps the original absolute ceiling and its sliding
    /// expiry never passes it.
    pub async fn refresh(&self, token: &str) -> AuthResult<TokenPair> {
        let claims = self.minter.parse_refresh(token)?;
        let key = RefreshSession::key_for(&claims.jti);

        let bytes = self
            .bounded(self.store.take(&key))
            .await?
            .ok_or(AuthError::SessionRevoked)?;
        let session: RefreshSession = serde_json::from_slice(&bytes)?;

        if session.user_id != claims.user_id {
            tracing::warn!(user_id = %claims.user_id, "Refresh token and session disagree on user");
            return Err(AuthError::SessionRevoked);
        }

        let now = self.minter.now();
        if session.is_expired(now) {
            return Err(AuthError::SessionExpired);
        }

        // The old session is gone from here on. Any failure logs the client out.
        let user = self
            .bounded(self.users.find_by_id(session.user_id))
            .await
            .map_err(into_store_error)?
            .ok_or(AuthError::SessionRevoked)?;

        let expires_at = (now + self.config.refresh_ttl).min(session.absolute_expire_at);
        let pair = self
            .store_pair(user.id, user.role, now, expires_at, session.absolute_expire_at)
            .await
            .map_err(into_store_error)?;

        tracing::debug!(user_id = %user.id, "Refresh token rotated");
        Ok(pair)
    }

    /// Delete the refresh session behind `token`.
    ///
    /// Expired tokens are accepted so logout works with a stale cookie.
    /// Revoking an already revoked token succeeds.
    pub async fn revoke(&self, token: &str) -> AuthResult<()> {
        let claims = match self.minter.parse_ignoring_expiry(token, TokenKind::Refresh)? {
            Claims::Refresh(claims) => claims,
            other => {
                return Err(TokenError::WrongType {
                    expected: TokenKind::Refresh,
                    found: other.kind(),
                }
                .into());
            }
        };

        self.bounded(self.store.delete(&RefreshSession::key_for(&claims.jti)))
            .await?;
        tracing::debug!(user_id = %claims.user_id, "Refresh session revoked");
        Ok(())
    }

    /// Mint a single-use verification token for `email` and record it.
    pub async fn issue_verification(&self, email: &Email) -> AuthResult<String> {
        let minted = self.minter.mint(
            TokenSubject::Verify {
                email: email.as_str().to_string(),
            },
            self.config.verification_ttl,
        )?;

        let request = VerificationRequest {
            email: email.clone(),
            issued_at: minted.issued_at,
            expires_at: minted.expires_at,
        };
        let ttl = store_ttl(minted.issued_at, minted.expires_at)?;
        self.bounded(self.store.put(
            &VerificationRequest::key_for(&minted.token),
            serde_json::to_vec(&request)?,
            ttl,
        ))
        .await?;

        Ok(minted.token)
    }

    /// Consume a verification token. At most one caller gets the email.
    pub async fn consume_verification(&self, token: &str) -> AuthResult<Email> {
        let claims = self
            .minter
            .parse_verify(token)
            .map_err(|_| AuthError::InvalidOrExpired)?;

        let bytes = self
            .bounded(self.store.take(&VerificationRequest::key_for(token)))
            .await?
            .ok_or(AuthError::InvalidOrExpired)?;
        let request: VerificationRequest = serde_json::from_slice(&bytes)?;

        if request.email.as_str() != claims.email {
            return Err(AuthError::InvalidOrExpired);
        }
        Ok(request.email)
    }

    async fn store_pair(
        &self,
        user_id: UserId,
        role: UserRole,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        absolute_expire_at: DateTime<Utc>,
    ) -> AuthResult<TokenPair> {
        let access = self
            .minter
            .mint(TokenSubject::Access { user_id, role }, self.config.access_ttl)?;
        let refresh = self
            .minter
            .mint_until(TokenSubject::Refresh { user_id }, expires_at)?;

        let session = RefreshSession {
            user_id,
            jti: refresh.claims.jti().to_string(),
            created_at: now,
            expires_at,
            absolute_expire_at,
        };
        let ttl = store_ttl(now, expires_at)?;
        self.bounded(
            self.store
                .put(&session.key(), serde_json::to_vec(&session)?, ttl),
        )
        .await?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: self.config.access_ttl.num_seconds(),
            refresh_expires_in: (expires_at - now).num_seconds(),
        })
    }
}

fn store_ttl(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> AuthResult<std::time::Duration> {
    (expires_at - now)
        .to_std()
        .ok()
        .filter(|ttl| !ttl.is_zero())
        .ok_or_else(|| AuthError::Internal("session already past expiry".to_string()))
}

fn into_store_error(err: AuthError) -> AuthError {
    match err {
        AuthError::Store(_) | AuthError::SessionRevoked => err,
        other => AuthError::Store(other.to_string()),
    }
}
