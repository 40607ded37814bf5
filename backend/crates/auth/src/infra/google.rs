//! Google OAuth2 Provider
//!
//! Authorization-code flow against Google's endpoints. The reqwest client
//! carries the operation deadline as its request timeout.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::domain::gateway::{ExternalProfile, IdentityProvider};
use crate::error::{AuthError, AuthResult};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const SCOPE: &str = "email profile";

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Clone)]
pub struct GoogleProvider {
    config: GoogleOAuthConfig,
    client: Client,
    auth_url: Url,
    token_url: String,
    userinfo_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GoogleProvider {
    pub fn new(config: GoogleOAuthConfig, request_timeout: Duration) -> AuthResult<Self> {
        Self::with_endpoints(
            config,
            request_timeout,
            GOOGLE_TOKEN_URL,
            GOOGLE_USERINFO_URL,
        )
    }

    /// Same provider against other token and userinfo endpoints.
    pub fn with_endpoints(
        config: GoogleOAuthConfig,
        request_timeout: Duration,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuthError::Internal(format!("http client: {e}")))?;
        let auth_url = Url::parse(GOOGLE_AUTH_URL)
            .map_err(|e| AuthError::Internal(format!("auth url: {e}")))?;

        Ok(Self {
            config,
            client,
            auth_url,
            token_url: token_url.into(),
            userinfo_url: userinfo_url.into(),
        })
    }
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("client_id", &self.config.client_id)
            .field("redirect_uri", &self.config.redirect_uri)
            .finish_non_exhaustive()
    }
}

impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &str) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPE)
            .append_pair("access_type", "offline")
            .append_pair("state", state);
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<String> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::ExchangeFailed(format!("{status} {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ExchangeFailed(format!("token response: {e}")))?;
        Ok(token.access_token)
    }

    async fn fetch_user_info(&self, access_token: &str) -> AuthResult<ExternalProfile> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::ProviderError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::ProviderError(format!(
                "userinfo returned {}",
                response.status()
            )));
        }

        response
            .json::<ExternalProfile>()
            .await
            .map_err(|e| AuthError::ProviderError(format!("userinfo body: {e}")))
    }
}
