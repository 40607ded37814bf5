//! Mail delivery
//!
//! `SmtpEmailSender` relays through an authenticated STARTTLS server.
//! `CapturingEmailSender` keeps messages in memory for tests.

use std::sync::{Arc, Mutex};

use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::domain::gateway::{EmailSender, OutgoingEmail};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub sender_email: String,
    pub sender_password: String,
}

#[derive(Clone)]
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(config: SmtpConfig) -> AuthResult<Self> {
        let from: Mailbox = config
            .sender_email
            .parse()
            .map_err(|e| AuthError::Internal(format!("sender address: {e}")))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AuthError::Internal(format!("smtp relay: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(config.sender_email, config.sender_password))
            .build();

        Ok(Self { transport, from })
    }
}

impl EmailSender for SmtpEmailSender {
    async fn send(&self, email: OutgoingEmail) -> AuthResult<()> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| AuthError::EmailDelivery(format!("recipient address: {e}")))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html_body)
            .map_err(|e| AuthError::EmailDelivery(format!("build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AuthError::EmailDelivery(e.to_string()))?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct CapturingEmailSender {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    fail: bool,
}

impl CapturingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<OutgoingEmail> {
        self.sent().pop()
    }
}

impl EmailSender for CapturingEmailSender {
    async fn send(&self, email: OutgoingEmail) -> AuthResult<()> {
        if self.fail {
            return Err(AuthError::EmailDelivery("relay refused message".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| AuthError::Internal("mailbox lock poisoned".to_string()))?
            .push(email);
        Ok(())
    }
}
