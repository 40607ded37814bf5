//! Password Service
//!
//! Runs Argon2id work on the blocking pool so request tasks never stall a
//! runtime worker.

use std::sync::Arc;

use platform::password::{Argon2Hasher, HashParams};

use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::{AuthError, AuthResult};

pub enum PasswordCheck {
    /// `rehashed` is set when the stored hash used an outdated profile.
    Valid { rehashed: Option<UserPassword> },
    Invalid,
}

#[derive(Clone, Debug)]
pub struct PasswordService {
    hasher: Arc<Argon2Hasher>,
}

impl PasswordService {
    pub fn new(params: HashParams) -> AuthResult<Self> {
        Ok(Self {
            hasher: Arc::new(Argon2Hasher::new(params)?),
        })
    }

    pub async fn hash(&self, password: RawPassword) -> AuthResult<UserPassword> {
        let hasher = self.hasher.clone();
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(password.inner()))
            .await
            .map_err(|e| AuthError::Internal(format!("hash task: {e}")))??;
        Ok(hashed.into())
    }

    pub async fn verify_and_upgrade(
        &self,
        password: RawPassword,
        stored: &UserPassword,
    ) -> AuthResult<PasswordCheck> {
        let hasher = self.hasher.clone();
        let stored = stored.clone();
        tokio::task::spawn_blocking(move || -> AuthResult<PasswordCheck> {
            if !hasher.verify(password.inner(), stored.inner()) {
                return Ok(PasswordCheck::Invalid);
            }
            let rehashed = if hasher.needs_rehash(stored.inner()) {
                Some(hasher.hash(password.inner())?.into())
            } else {
                None
            };
            Ok(PasswordCheck::Valid { rehashed })
        })
        .await
        .map_err(|e| AuthError::Internal(format!("verify task: {e}")))?
    }

    /// Spend one verification's worth of work and discard it.
    pub async fn burn(&self, password: RawPassword) -> AuthResult<()> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.burn_verification(password.inner()))
            .await
            .map_err(|e| AuthError::Internal(format!("verify task: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(s: &str) -> RawPassword {
        RawPassword::new(s.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_hash_then_verify() {
        let service = PasswordService::new(HashParams::insecure_fast()).unwrap();
        let stored = service.hash(raw("hunter22")).await.unwrap();

        assert!(matches!(
            service.verify_and_upgrade(raw("hunter22"), &stored).await.unwrap(),
            PasswordCheck::Valid { rehashed: None }
        ));
        assert!(matches!(
            service.verify_and_upgrade(raw("hunter23"), &stored).await.unwrap(),
            PasswordCheck::Invalid
        ));
    }

    #[tokio::test]
    async fn test_outdated_profile_is_rehashed() {
        let old = PasswordService::new(HashParams::insecure_fast()).unwrap();
        let stored = old.hash(raw("hunter22")).await.unwrap();

        let current = PasswordService::new(HashParams {
            memory_kib: 16,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        match current.verify_and_upgrade(raw("hunter22"), &stored).await.unwrap() {
            PasswordCheck::Valid { rehashed: Some(new_hash) } => {
                assert!(new_hash.as_phc_string().contains("m=16"));
            }
            _ => panic!("expected a rehash"),
        }
    }
}
