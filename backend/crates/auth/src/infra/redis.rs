//! Redis Session Store
//!
//! `take` maps to `GETDEL` (Redis 6.2+), so rotation and verification
//! consumption have exactly one winner across all server instances.

use std::time::Duration;

use redis::{AsyncCommands, IntoConnectionInfo};
use redis::aio::ConnectionManager;

use crate::domain::repository::SessionStore;
use crate::error::{AuthError, AuthResult};

/// Redis-backed session store
///
/// The connection manager multiplexes one connection and reconnects on its
/// own. Cloning is cheap.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Connect and verify the server answers.
    pub async fn connect(info: impl IntoConnectionInfo) -> AuthResult<Self> {
        let client = redis::Client::open(info)?;
        let mut conn = ConnectionManager::new(client).await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self { conn })
    }
}

impl SessionStore for RedisSessionStore {
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AuthResult<()> {
        let millis = u64::try_from(ttl.as_millis())
            .map_err(|_| AuthError::Internal("ttl out of range".to_string()))?;
        if millis == 0 {
            return Err(AuthError::Internal("ttl must be positive".to_string()));
        }

        let mut conn = self.conn.clone();
        let _: () = conn.pset_ex(key, value, millis).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AuthResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn take(&self, key: &str) -> AuthResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get_del(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AuthResult<bool> {
        let mut conn = self.conn.clone();
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }
}
