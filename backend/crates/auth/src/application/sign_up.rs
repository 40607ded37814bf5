//! Sign Up Use Case
//!
//! Registers an unverified account and mails a verification link.

use std::sync::Arc;

use crate::application::password::PasswordService;
use crate::application::session_manager::SessionManager;
use crate::domain::entity::user::NewUser;
use crate::domain::gateway::{EmailSender, OutgoingEmail};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{
    email::Email, login::Login, user_id::UserId, user_password::RawPassword,
};
use crate::error::{AuthError, AuthResult};

pub const VERIFICATION_SUBJECT: &str = "Verify your email";

/// Sign up input
pub struct SignUpInput {
    pub login: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Sign up output
#[derive(Debug)]
pub struct SignUpOutput {
    pub user_id: UserId,
}

/// Sign up use case
pub struct SignUpUseCase<U, S, M> {
    user_repo: Arc<U>,
    sessions: SessionManager<U, S>,
    passwords: PasswordService,
    mailer: Arc<M>,
}

impl<U, S, M> SignUpUseCase<U, S, M>
where
    U: UserRepository + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        sessions: SessionManager<U, S>,
        passwords: PasswordService,
        mailer: Arc<M>,
    ) -> Self {
        Self {
            user_repo,
            sessions,
            passwords,
            mailer,
        }
    }

    /// The account and its verification token survive a failed delivery.
    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let login = Login::new(input.login).map_err(AuthError::invalid_input)?;
        let email = Email::new(input.email).map_err(AuthError::invalid_input)?;
        let password = RawPassword::new(input.password).map_err(AuthError::invalid_input)?;
        let full_name = input
            .full_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let existing = self
            .sessions
            .bounded(self.user_repo.find_by_email(&email))
            .await?;
        if existing.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.passwords.hash(password).await?;
        let user = self
            .sessions
            .bounded(
                self.user_repo
                    .create(NewUser::registered(login, email, password_hash, full_name)),
            )
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        let token = self.sessions.issue_verification(&user.email).await?;
        let link = self.sessions.config().verification_link(&token);
        self.deliver(OutgoingEmail {
            to: user.email.as_str().to_string(),
            subject: VERIFICATION_SUBJECT.to_string(),
            html_body: format!("<a href='{link}'>Click here to verify your email</a>"),
        })
        .await?;

        Ok(SignUpOutput { user_id: user.id })
    }

    /// Send on a detached task and wait at most the delivery cap. A send still
    /// running at the cap keeps going in the background.
    async fn deliver(&self, email: OutgoingEmail) -> AuthResult<()> {
        let mailer = self.mailer.clone();
        let delivery = tokio::spawn(async move {
            let to = email.to.clone();
            let result = mailer.send(email).await;
            match &result {
                Ok(()) => tracing::debug!(to = %to, "Verification email sent"),
                Err(e) => tracing::warn!(to = %to, error = %e, "Verification email failed"),
            }
            result
        });

        let cap = self.sessions.config().email_delivery_cap;
        match tokio::time::timeout(cap, delivery).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(AuthError::EmailDelivery(msg)))) => Err(AuthError::EmailDelivery(msg)),
            Ok(Ok(Err(other))) => Err(AuthError::EmailDelivery(other.to_string())),
            Ok(Err(join_err)) => Err(AuthError::Internal(format!("mail task: {join_err}"))),
            Err(_) => {
                tracing::info!(cap_ms = cap.as_millis() as u64, "Verification email still pending");
                Ok(())
            }
        }
    }
}
