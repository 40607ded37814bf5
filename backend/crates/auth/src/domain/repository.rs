//! Repository Traits
//!
//! Interfaces for durable users and short-lived session records.
//! Implementations live in the infrastructure layer.

use std::time::Duration;

use crate::domain::entity::user::{NewUser, User};
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::AuthResult;

/// Identity store
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Persist a new user and return it with its assigned id.
    ///
    /// Fails with `EmailTaken`, `DuplicateLogin` or `DuplicateExternalId`
    /// when a unique field collides.
    async fn create(&self, user: NewUser) -> AuthResult<User>;

    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn find_by_external_id(&self, external_id: &str) -> AuthResult<Option<User>>;

    /// Write every mutable field of `user`. Missing rows are `UserNotFound`.
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Returns `false` when no row matched.
    async fn delete(&self, id: UserId) -> AuthResult<bool>;
}

/// Key-value store with per-key expiry
///
/// Values are opaque bytes. An entry past its TTL is indistinguishable
/// from an absent one.
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Write `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AuthResult<()>;

    async fn get(&self, key: &str) -> AuthResult<Option<Vec<u8>>>;

    /// Read and delete in one step. Of several concurrent callers at most
    /// one receives the value.
    async fn take(&self, key: &str) -> AuthResult<Option<Vec<u8>>>;

    /// Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> AuthResult<()>;

    async fn exists(&self, key: &str) -> AuthResult<bool>;
}
