//! Server configuration from the environment
//!
//! Every variable is read through a lookup function so tests can supply a
//! map instead of touching the process environment.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use auth::infra::{GoogleOAuthConfig, SmtpConfig};
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Debug,
    Release,
    Test,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Mode::Debug),
            "release" => Ok(Mode::Release),
            "test" => Ok(Mode::Test),
            other => bail!("MODE must be debug, release or test, got {other:?}"),
        }
    }
}

#[derive(Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub log_level: String,
    pub mode: Mode,
    pub database_url: String,
    pub redis: ConnectionInfo,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
    pub smtp: SmtpConfig,
    pub google: GoogleOAuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let env = Env(&lookup);

        let mode: Mode = env.parsed("MODE", Mode::Debug)?;

        // Built field by field so the password never passes through a URL.
        let redis = ConnectionInfo {
            addr: ConnectionAddr::Tcp(
                env.or("REDIS_HOST", "localhost"),
                env.parsed("REDIS_PORT", 6379u16)?,
            ),
            redis: RedisConnectionInfo {
                db: env.parsed("REDIS_DB", 0i64)?,
                password: env.get("REDIS_PASSWORD"),
                ..Default::default()
            },
        };

        let mut auth = AuthConfig::new(
            env.required("JWT_ACCESS_SECRET")?,
            env.required("JWT_REFRESH_SECRET")?,
        );
        auth.access_ttl = env.lifetime("JWT_ACCESS_TTL", 15, chrono::Duration::try_minutes)?;
        auth.refresh_ttl = env.lifetime("JWT_REFRESH_TTL", 7, chrono::Duration::try_days)?;
        auth.refresh_max_ttl =
            env.lifetime("JWT_REFRESH_MAX_TTL", 30, chrono::Duration::try_days)?;
        auth.cookie_secure = mode == Mode::Release;
        auth.operation_timeout =
            Duration::from_millis(env.parsed("OPERATION_TIMEOUT_MS", 5000u64)?);
        auth.email_delivery_cap =
            Duration::from_millis(env.parsed("EMAIL_DELIVERY_CAP_MS", 2000u64)?);
        auth.base_url = env
            .or("BASE_URL", "http://localhost:8080/api")
            .trim_end_matches('/')
            .to_string();
        if let Err(problem) = auth.validate() {
            bail!(problem);
        }

        let smtp = SmtpConfig {
            host: env.or("SMTP_HOST", "smtp.gmail.com"),
            port: env.parsed("SMTP_PORT", 587u16)?,
            sender_email: env.required("SENDER_EMAIL")?,
            sender_password: env.required("SENDER_PASSWORD")?,
        };

        let google = GoogleOAuthConfig {
            client_id: env.required("GOOGLE_CLIENT_ID")?,
            client_secret: env.required("GOOGLE_CLIENT_SECRET")?,
            redirect_uri: env.required("GOOGLE_REDIRECT_URI")?,
        };

        let frontend_origins = env
            .or(
                "FRONTEND_ORIGINS",
                "http://localhost:3000,http://127.0.0.1:3000",
            )
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            port: env.parsed("PORT", 8080u16)?,
            log_level: env.or("LOG_LEVEL", "info"),
            mode,
            database_url: env.required("DATABASE_URL")?,
            redis,
            frontend_origins,
            auth,
            smtp,
            google,
        })
    }

    /// `info` applied to this binary, the auth crate and the HTTP trace layer.
    pub fn default_filter(&self) -> String {
        let level = &self.log_level;
        format!("usof={level},auth={level},tower_http={level}")
    }
}

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> anyhow::Result<String> {
        self.get(key)
            .with_context(|| format!("{key} must be set in environment"))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("{key} is invalid: {e}")),
            None => Ok(default),
        }
    }

    /// A count of `unit`s, rejected when the result overflows.
    fn lifetime(
        &self,
        key: &str,
        default: i64,
        unit: fn(i64) -> Option<chrono::Duration>,
    ) -> anyhow::Result<chrono::Duration> {
        let count = self.parsed(key, default)?;
        unit(count).with_context(|| format!("{key} is out of range: {count}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://usof@localhost/usof"),
            ("JWT_ACCESS_SECRET", "access-secret"),
            ("JWT_REFRESH_SECRET", "refresh-secret"),
            ("SENDER_EMAIL", "noreply@example.com"),
            ("SENDER_PASSWORD", "app-password"),
            ("GOOGLE_CLIENT_ID", "client"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("GOOGLE_REDIRECT_URI", "http://localhost:8080/api/auth/google/callback"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> anyhow::Result<ServerConfig> {
        ServerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.mode, Mode::Debug);
        assert!(matches!(
            &config.redis.addr,
            ConnectionAddr::Tcp(host, 6379) if host == "localhost"
        ));
        assert_eq!(config.redis.redis.db, 0);
        assert_eq!(config.redis.redis.password, None);
        assert_eq!(config.auth.access_ttl, chrono::Duration::minutes(15));
        assert_eq!(config.auth.refresh_ttl, chrono::Duration::days(7));
        assert_eq!(config.auth.refresh_max_ttl, chrono::Duration::days(30));
        assert!(!config.auth.cookie_secure);
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.default_filter(), "usof=info,auth=info,tower_http=info");
    }

    #[test]
    fn test_release_mode_sets_secure_cookie() {
        let mut vars = base();
        vars.insert("MODE", "release");
        let config = load(&vars).unwrap();
        assert!(config.auth.cookie_secure);
    }

    #[test]
    fn test_redis_password_with_url_characters() {
        let mut vars = base();
        vars.insert("REDIS_HOST", "cache.internal");
        vars.insert("REDIS_PASSWORD", "p@ss/word#1:%");
        vars.insert("REDIS_DB", "2");
        let config = load(&vars).unwrap();

        assert_eq!(config.redis.redis.password.as_deref(), Some("p@ss/word#1:%"));
        assert_eq!(config.redis.redis.db, 2);
        assert!(matches!(
            &config.redis.addr,
            ConnectionAddr::Tcp(host, 6379) if host == "cache.internal"
        ));
        // Opening a client validates the settings without connecting.
        assert!(redis::Client::open(config.redis).is_ok());
    }

    #[test]
    fn test_missing_required_variable() {
        let mut vars = base();
        vars.remove("DATABASE_URL");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = base();
        vars.insert("JWT_REFRESH_SECRET", "access-secret");
        assert!(load(&vars).is_err());

        let mut vars = base();
        vars.insert("JWT_REFRESH_TTL", "10");
        vars.insert("JWT_REFRESH_MAX_TTL", "5");
        assert!(load(&vars).is_err());

        let mut vars = base();
        vars.insert("PORT", "eighty");
        assert!(load(&vars).is_err());

        let mut vars = base();
        vars.insert("MODE", "staging");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_lifetime_overflow_is_an_error() {
        let mut vars = base();
        vars.insert("JWT_REFRESH_TTL", "1000000000000000");
        vars.insert("JWT_REFRESH_MAX_TTL", "1000000000000000");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("JWT_REFRESH_TTL"));

        let mut vars = base();
        vars.insert("JWT_ACCESS_TTL", "9223372036854775807");
        assert!(load(&vars).is_err());
    }
}
