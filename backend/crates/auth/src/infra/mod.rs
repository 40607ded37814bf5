//! Infrastructure Layer
//!
//! Store implementations and external service integrations.

pub mod google;
pub mod mailer;
pub mod memory;
pub mod postgres;
pub mod redis;

pub use google::{GoogleOAuthConfig, GoogleProvider};
pub use mailer::{CapturingEmailSender, SmtpConfig, SmtpEmailSender};
pub use memory::{MemorySessionStore, MemoryUserRepository};
pub use postgres::PgUserRepository;
pub use self::redis::RedisSessionStore;
