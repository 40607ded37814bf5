//! Application Configuration
//!
//! Lifetimes, secrets and limits for the auth use cases. Built by the binary
//! from the environment; tests start from [`AuthConfig::for_tests`].

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::password::HashParams;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";
pub const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";
pub const OAUTH_STATE_MAX_AGE_SECS: i64 = 300;

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub access_secret: Vec<u8>,
    /// Must differ from `access_secret`
    pub refresh_secret: Vec<u8>,
    pub access_ttl: chrono::Duration,
    /// Sliding lifetime of a refresh session
    pub refresh_ttl: chrono::Duration,
    /// Hard ceiling for a chain of rotations, fixed at first issue
    pub refresh_max_ttl: chrono::Duration,
    pub verification_ttl: chrono::Duration,
    /// Set `Secure` on the refresh cookie (release mode)
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    /// Bound on each store or provider call
    pub operation_timeout: Duration,
    /// How long registration waits for the verification mail
    pub email_delivery_cap: Duration,
    /// Public API root used in verification links, without trailing slash
    pub base_url: String,
    pub hash_params: HashParams,
}

impl AuthConfig {
    /// Defaults from the deployment guide, with the given secrets.
    pub fn new(access_secret: impl Into<Vec<u8>>, refresh_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: chrono::Duration::minutes(15),
            refresh_ttl: chrono::Duration::days(7),
            refresh_max_ttl: chrono::Duration::days(30),
            verification_ttl: chrono::Duration::hours(24),
            cookie_secure: false,
            cookie_same_site: SameSite::Lax,
            operation_timeout: Duration::from_secs(5),
            email_delivery_cap: Duration::from_secs(2),
            base_url: "http://localhost:8080/api".to_string(),
            hash_params: HashParams::default(),
        }
    }

    /// Cheap hashing and fixed secrets.
    pub fn for_tests() -> Self {
        Self {
            hash_params: HashParams::insecure_fast(),
            ..Self::new(
                b"test-access-secret-0123456789abcdef".to_vec(),
                b"test-refresh-secret-fedcba9876543210".to_vec(),
            )
        }
    }

    /// Startup validation. Returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err("JWT secrets must not be empty".to_string());
        }
        if self.access_secret == self.refresh_secret {
            return Err("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ".to_string());
        }
        if self.access_ttl <= chrono::Duration::zero() || self.refresh_ttl <= chrono::Duration::zero()
        {
            return Err("token lifetimes must be positive".to_string());
        }
        if self.refresh_max_ttl < self.refresh_ttl {
            return Err("JWT_REFRESH_MAX_TTL must be at least JWT_REFRESH_TTL".to_string());
        }
        Ok(())
    }

    /// Max-Age of the refresh cookie, in seconds.
    pub fn refresh_cookie_max_age(&self) -> i64 {
        self.refresh_ttl.num_seconds()
    }

    /// `refresh_token`: HttpOnly, SameSite, Secure in release mode.
    pub fn refresh_cookie(&self) -> CookieConfig {
        CookieConfig::new(REFRESH_COOKIE_NAME)
            .secure(self.cookie_secure)
            .same_site(self.cookie_same_site)
            .max_age(self.refresh_cookie_max_age())
    }

    /// `oauth_state`: HttpOnly, five minutes.
    pub fn oauth_state_cookie(&self) -> CookieConfig {
        CookieConfig::new(OAUTH_STATE_COOKIE_NAME).max_age(OAUTH_STATE_MAX_AGE_SECS)
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/auth/verify?token={}", self.base_url, token)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("refresh_max_ttl", &self.refresh_max_ttl)
            .field("verification_ttl", &self.verification_ttl)
            .field("cookie_secure", &self.cookie_secure)
            .field("operation_timeout", &self.operation_timeout)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(AuthConfig::for_tests().validate().is_ok());

        let same = AuthConfig::new(b"same".to_vec(), b"same".to_vec());
        assert!(same.validate().is_err());

        let mut inverted = AuthConfig::for_tests();
        inverted.refresh_max_ttl = chrono::Duration::days(1);
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_verification_link() {
        let config = AuthConfig::for_tests();
        assert_eq!(
            config.verification_link("abc"),
            "http://localhost:8080/api/auth/verify?token=abc"
        );
    }

    #[test]
    fn test_cookie_attributes() {
        let mut config = AuthConfig::for_tests();
        config.cookie_secure = true;

        let refresh = config.refresh_cookie().build_set_cookie("t");
        assert_eq!(
            refresh,
            "refresh_token=t; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=604800"
        );

        let state = config.oauth_state_cookie().build_set_cookie("s");
        assert_eq!(state, "oauth_state=s; HttpOnly; Path=/; Max-Age=300");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?}", AuthConfig::for_tests());
        assert!(!debug.contains("test-access-secret"));
    }
}
