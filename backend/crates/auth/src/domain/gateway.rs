//! Outbound gateways
//!
//! The federated identity provider and the mail relay, seen from the
//! domain. Both are swapped for in-process fakes in tests.

use serde::Deserialize;

use crate::error::AuthResult;

/// Profile returned by the identity provider's userinfo endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalProfile {
    /// Stable subject identifier at the provider
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// OAuth2 authorization-code provider
#[trait_variant::make(IdentityProvider: Send)]
pub trait LocalIdentityProvider {
    /// Consent URL carrying `state`. Pure, no I/O.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for a provider access token.
    async fn exchange_code(&self, code: &str) -> AuthResult<String>;

    async fn fetch_user_info(&self, access_token: &str) -> AuthResult<ExternalProfile>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[trait_variant::make(EmailSender: Send)]
pub trait LocalEmailSender {
    async fn send(&self, email: OutgoingEmail) -> AuthResult<()>;
}
