//! Handler state
//!
//! [`AuthBackend`] names the four pluggable collaborators once so handlers
//! take a single type parameter.

use std::sync::Arc;

use platform::clock::Clock;

use crate::application::{
    AuthConfig, OAuthUseCase, PasswordService, SessionManager, SignInUseCase, SignOutUseCase,
    SignUpUseCase, UserAccountUseCase, VerifyEmailUseCase,
};
use crate::domain::gateway::{EmailSender, IdentityProvider};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::token::TokenMinter;
use crate::error::AuthResult;

pub trait AuthBackend: Send + Sync + 'static {
    type Users: UserRepository + Send + Sync + 'static;
    type Sessions: SessionStore + Send + Sync + 'static;
    type Provider: IdentityProvider + Send + Sync + 'static;
    type Mailer: EmailSender + Send + Sync + 'static;
}

/// Postgres, Redis, Google and SMTP.
#[derive(Debug)]
pub struct ProductionBackend;

impl AuthBackend for ProductionBackend {
    type Users = crate::infra::PgUserRepository;
    type Sessions = crate::infra::RedisSessionStore;
    type Provider = crate::infra::GoogleProvider;
    type Mailer = crate::infra::SmtpEmailSender;
}

/// Shared state for auth handlers
pub struct AuthAppState<B: AuthBackend> {
    pub users: Arc<B::Users>,
    pub sessions: SessionManager<B::Users, B::Sessions>,
    pub passwords: PasswordService,
    pub provider: Arc<B::Provider>,
    pub mailer: Arc<B::Mailer>,
    pub config: Arc<AuthConfig>,
}

impl<B: AuthBackend> Clone for AuthAppState<B> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            sessions: self.sessions.clone(),
            passwords: self.passwords.clone(),
            provider: self.provider.clone(),
            mailer: self.mailer.clone(),
            config: self.config.clone(),
        }
    }
}

impl<B: AuthBackend> AuthAppState<B> {
    pub fn new(
        users: B::Users,
        store: B::Sessions,
        provider: B::Provider,
        mailer: B::Mailer,
        config: AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> AuthResult<Self> {
        let users = Arc::new(users);
        let config = Arc::new(config);
        let minter = Arc::new(TokenMinter::new(
            &config.access_secret,
            &config.refresh_secret,
            clock,
        ));
        let sessions = SessionManager::new(users.clone(), Arc::new(store), minter, config.clone());

        Ok(Self {
            users,
            sessions,
            passwords: PasswordService::new(config.hash_params)?,
            provider: Arc::new(provider),
            mailer: Arc::new(mailer),
            config,
        })
    }

    pub fn sign_up(&self) -> SignUpUseCase<B::Users, B::Sessions, B::Mailer> {
        SignUpUseCase::new(
            self.users.clone(),
            self.sessions.clone(),
            self.passwords.clone(),
            self.mailer.clone(),
        )
    }

    pub fn sign_in(&self) -> SignInUseCase<B::Users, B::Sessions> {
        SignInUseCase::new(
            self.users.clone(),
            self.sessions.clone(),
            self.passwords.clone(),
        )
    }

    pub fn sign_out(&self) -> SignOutUseCase<B::Users, B::Sessions> {
        SignOutUseCase::new(self.sessions.clone())
    }

    pub fn verify_email(&self) -> VerifyEmailUseCase<B::Users, B::Sessions> {
        VerifyEmailUseCase::new(self.users.clone(), self.sessions.clone())
    }

    pub fn oauth(&self) -> OAuthUseCase<B::Users, B::Sessions, B::Provider> {
        OAuthUseCase::new(
            self.users.clone(),
            self.sessions.clone(),
            self.passwords.clone(),
            self.provider.clone(),
        )
    }

    pub fn accounts(&self) -> UserAccountUseCase<B::Users, B::Sessions> {
        UserAccountUseCase::new(self.users.clone(), self.sessions.clone())
    }
}
