//! In-memory stores
//!
//! Process-local implementations of the identity and session stores for
//! tests and single-node development runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use platform::clock::{Clock, SystemClock};

use crate::domain::entity::user::{NewUser, User};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Users
// ============================================================================

#[derive(Debug)]
pub struct MemoryUserRepository {
    users: DashMap<UserId, User>,
    /// Serializes writes so unique checks and inserts happen together.
    /// Holds the last assigned id.
    write_lock: Mutex<i64>,
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            write_lock: Mutex::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn find(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .iter()
            .find(|entry| pred(entry.value()))
            .map(|entry| entry.value().clone())
    }

    fn check_unique(
        &self,
        except: Option<UserId>,
        login: Option<&str>,
        email: &Email,
        external_id: Option<&str>,
    ) -> AuthResult<()> {
        for entry in self.users.iter() {
            let other = entry.value();
            if Some(other.id) == except {
                continue;
            }
            if other.email == *email {
                return Err(AuthError::EmailTaken);
            }
            if login.is_some_and(|l| other.login.as_str() == l) {
                return Err(AuthError::DuplicateLogin);
            }
            if external_id.is_some() && other.external_id.as_deref() == external_id {
                return Err(AuthError::DuplicateExternalId);
            }
        }
        Ok(())
    }

    fn lock(&self) -> AuthResult<std::sync::MutexGuard<'_, i64>> {
        self.write_lock
            .lock()
            .map_err(|_| AuthError::Internal("user store lock poisoned".to_string()))
    }
}

impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> AuthResult<User> {
        let mut last_id = self.lock()?;
        self.check_unique(
            None,
            Some(user.login.as_str()),
            &user.email,
            user.external_id.as_deref(),
        )?;

        *last_id += 1;
        let now = Utc::now();
        let created = User {
            id: UserId::from_i64(*last_id),
            login: user.login,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            email_verified: user.email_verified,
            external_id: user.external_id,
            full_name: user.full_name,
            avatar: user.avatar,
            rating: 0,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self.find(|u| u.email == *email))
    }

    async fn find_by_external_id(&self, external_id: &str) -> AuthResult<Option<User>> {
        Ok(self.find(|u| u.external_id.as_deref() == Some(external_id)))
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let _guard = self.lock()?;
        self.check_unique(
            Some(user.id),
            None,
            &user.email,
            user.external_id.as_deref(),
        )?;

        // Login, role and creation time are not updatable, same as the SQL store.
        let mut stored = self.users.get_mut(&user.id).ok_or(AuthError::UserNotFound)?;
        let login = stored.login.clone();
        let role = stored.role;
        let created_at = stored.created_at;
        *stored = User {
            login,
            role,
            created_at,
            updated_at: Utc::now(),
            ..user.clone()
        };
        Ok(())
    }

    async fn delete(&self, id: UserId) -> AuthResult<bool> {
        let _guard = self.lock()?;
        Ok(self.users.remove(&id).is_some())
    }
}

// ============================================================================
// Sessions
// ============================================================================

pub struct MemorySessionStore {
    entries: DashMap<String, (Vec<u8>, DateTime<Utc>)>,
    clock: Arc<dyn Clock>,
    available: AtomicBool,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemorySessionStore {
    /// Entries expire against `clock`, so a manual clock drives TTLs too.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: while unavailable every call fails with `Store`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of live entries whose key starts with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        let now = self.clock.now();
        self.entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix) && entry.value().1 > now)
            .count()
    }

    fn ensure_available(&self) -> AuthResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthError::Store("memory store marked unavailable".to_string()))
        }
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl SessionStore for MemorySessionStore {
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AuthResult<()> {
        self.ensure_available()?;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AuthError::Internal(format!("ttl out of range: {e}")))?;
        let expires_at = self.clock.now() + ttl;
        self.entries.insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> AuthResult<Option<Vec<u8>>> {
        self.ensure_available()?;
        let now = self.clock.now();
        Ok(self
            .entries
            .get(key)
            .filter(|entry| entry.value().1 > now)
            .map(|entry| entry.value().0.clone()))
    }

    async fn take(&self, key: &str) -> AuthResult<Option<Vec<u8>>> {
        self.ensure_available()?;
        let now = self.clock.now();
        Ok(self
            .entries
            .remove(key)
            .filter(|(_, (_, expires_at))| *expires_at > now)
            .map(|(_, (value, _))| value))
    }

    async fn delete(&self, key: &str) -> AuthResult<()> {
        self.ensure_available()?;
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AuthResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
