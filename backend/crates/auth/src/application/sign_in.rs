//! Sign In Use Case
//!
//! Authenticates email + password and issues a token pair.

use std::sync::Arc;

use crate::application::password::{PasswordCheck, PasswordService};
use crate::application::session_manager::{SessionManager, TokenPair};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in use case
pub struct SignInUseCase<U, S> {
    user_repo: Arc<U>,
    sessions: SessionManager<U, S>,
    passwords: PasswordService,
}

impl<U, S> SignInUseCase<U, S>
where
    U: UserRepository + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        sessions: SessionManager<U, S>,
        passwords: PasswordService,
    ) -> Self {
        Self {
            user_repo,
            sessions,
            passwords,
        }
    }

    /// Unknown email and wrong password fail the same way after the same
    /// amount of hashing work.
    pub async fn execute(&self, input: SignInInput) -> AuthResult<TokenPair> {
        let email = Email::new(input.email).map_err(|_| AuthError::InvalidCredentials)?;
        let password =
            RawPassword::new(input.password).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .sessions
            .bounded(self.user_repo.find_by_email(&email))
            .await?;

        let Some(mut user) = user else {
            self.passwords.burn(password).await?;
            return Err(AuthError::InvalidCredentials);
        };

        let rehashed = match self
            .passwords
            .verify_and_upgrade(password, &user.password_hash)
            .await?
        {
            PasswordCheck::Valid { rehashed } => rehashed,
            PasswordCheck::Invalid => return Err(AuthError::InvalidCredentials),
        };

        if !user.can_sign_in_with_password() {
            return Err(AuthError::EmailNotVerified);
        }

        if let Some(new_hash) = rehashed {
            user.set_password_hash(new_hash);
            self.sessions.bounded(self.user_repo.update(&user)).await?;
            tracing::info!(user_id = %user.id, "Password hash upgraded");
        }

        let pair = self.sessions.issue_token_pair(&user).await?;
        tracing::info!(user_id = %user.id, "User signed in");
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::domain::entity::user::NewUser;
    use crate::domain::token::TokenMinter;
    use crate::domain::value_object::login::Login;
    use crate::infra::memory::{MemorySessionStore, MemoryUserRepository};
    use platform::clock::SystemClock;
    use platform::password::HashParams;

    const STRONGER: HashParams = HashParams {
        memory_kib: 16,
        iterations: 1,
        parallelism: 1,
    };

    async fn use_case(
        params: HashParams,
        verified: bool,
    ) -> (
        SignInUseCase<MemoryUserRepository, MemorySessionStore>,
        Arc<MemoryUserRepository>,
    ) {
        let mut config = AuthConfig::for_tests();
        config.hash_params = params;
        let config = Arc::new(config);

        let users = Arc::new(MemoryUserRepository::new());
        let old_hash = PasswordService::new(HashParams::insecure_fast())
            .unwrap()
            .hash(RawPassword::new("hunter22".to_string()).unwrap())
            .await
            .unwrap();
        let mut new_user = NewUser::registered(
            Login::new("alice").unwrap(),
            Email::new("alice@x.test").unwrap(),
            old_hash,
            None,
        );
        new_user.email_verified = verified;
        users.create(new_user).await.unwrap();

        let minter = Arc::new(TokenMinter::new(
            &config.access_secret,
            &config.refresh_secret,
            Arc::new(SystemClock),
        ));
        let sessions = SessionManager::new(
            users.clone(),
            Arc::new(MemorySessionStore::default()),
            minter,
            config.clone(),
        );
        let passwords = PasswordService::new(config.hash_params).unwrap();
        (SignInUseCase::new(users.clone(), sessions, passwords), users)
    }

    fn input(email: &str, password: &str) -> SignInInput {
        SignInInput {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    async fn stored_hash(users: &MemoryUserRepository) -> String {
        users
            .find_by_email(&Email::new("alice@x.test").unwrap())
            .await
            .unwrap()
            .unwrap()
            .password_hash
            .as_phc_string()
            .to_string()
    }

    #[tokio::test]
    async fn test_outdated_hash_is_upgraded() {
        let (sign_in, users) = use_case(STRONGER, true).await;
        let before = stored_hash(&users).await;

        sign_in.execute(input("alice@x.test", "hunter22")).await.unwrap();
        let after = stored_hash(&users).await;
        assert_ne!(before, after);
        assert!(after.contains("m=16"));

        // Already current: left alone.
        sign_in.execute(input("alice@x.test", "hunter22")).await.unwrap();
        assert_eq!(stored_hash(&users).await, after);
    }

    #[tokio::test]
    async fn test_current_hash_is_kept() {
        let (sign_in, users) = use_case(HashParams::insecure_fast(), true).await;
        let before = stored_hash(&users).await;
        let pair = sign_in.execute(input("alice@x.test", "hunter22")).await.unwrap();
        assert!(!pair.access_token.is_empty());
        assert_eq!(stored_hash(&users).await, before);
    }

    #[tokio::test]
    async fn test_failures() {
        let (sign_in, _) = use_case(HashParams::insecure_fast(), false).await;

        let err = sign_in.execute(input("alice@x.test", "hunter22")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailNotVerified));

        // A wrong password does not reveal the verification state.
        let err = sign_in.execute(input("alice@x.test", "hunter23")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = sign_in.execute(input("bob@x.test", "hunter22")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = sign_in.execute(input("not-an-email", "hunter22")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
