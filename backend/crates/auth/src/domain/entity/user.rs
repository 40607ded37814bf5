//! User Entity
//!
//! The durable identity record. Equality is by store-assigned id.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email, login::Login, user_id::UserId, user_password::UserPassword,
    user_role::UserRole,
};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Assigned by the identity store
    pub id: UserId,
    /// Unique handle
    pub login: Login,
    /// Unique, lower-cased
    pub email: Email,
    /// Argon2id PHC string. Federated-only accounts hold the hash of a
    /// random placeholder.
    pub password_hash: UserPassword,
    pub role: UserRole,
    /// Flips to true once and never back
    pub email_verified: bool,
    /// Subject identifier at the federated identity provider
    pub external_id: Option<String>,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl User {
    /// Password sign-in is refused until the address is verified.
    pub fn can_sign_in_with_password(&self) -> bool {
        self.email_verified
    }

    /// Returns `false` when the flag was already set.
    pub fn mark_email_verified(&mut self) -> bool {
        if self.email_verified {
            return false;
        }
        self.email_verified = true;
        self.updated_at = Utc::now();
        true
    }

    /// Attach a federated identity. A provider-verified address also
    /// verifies the local account.
    pub fn link_external_identity(&mut self, external_id: String, provider_verified: bool) {
        self.external_id = Some(external_id);
        if provider_verified {
            self.email_verified = true;
        }
        self.updated_at = Utc::now();
    }

    pub fn set_password_hash(&mut self, password_hash: UserPassword) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }
}

/// A user that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: Login,
    pub email: Email,
    pub password_hash: UserPassword,
    pub role: UserRole,
    pub email_verified: bool,
    pub external_id: Option<String>,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
}

impl NewUser {
    /// Self-registered account: role `user`, unverified.
    pub fn registered(
        login: Login,
        email: Email,
        password_hash: UserPassword,
        full_name: Option<String>,
    ) -> Self {
        Self {
            login,
            email,
            password_hash,
            role: UserRole::User,
            email_verified: false,
            external_id: None,
            full_name,
            avatar: None,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use platform::password::{Argon2Hasher, ClearTextPassword, HashParams};

    pub fn user(id: i64, email: &str) -> User {
        let hasher = Argon2Hasher::new(HashParams::insecure_fast()).unwrap();
        let hash = hasher
            .hash(&ClearTextPassword::new("hunter22".to_string()).unwrap())
            .unwrap();
        let now = Utc::now();
        User {
            id: UserId::from_i64(id),
            login: Login::new(format!("user{id}")).unwrap(),
            email: Email::new(email).unwrap(),
            password_hash: hash.into(),
            role: UserRole::User,
            email_verified: false,
            external_id: None,
            full_name: None,
            avatar: None,
            rating: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::user;

    #[test]
    fn test_equality_is_by_id() {
        let a = user(1, "a@x.test");
        let mut b = user(1, "b@x.test");
        b.rating = 10;
        assert_eq!(a, b);
        assert_ne!(a, user(2, "a@x.test"));
    }

    #[test]
    fn test_mark_email_verified_once() {
        let mut u = user(1, "a@x.test");
        assert!(!u.can_sign_in_with_password());
        assert!(u.mark_email_verified());
        assert!(!u.mark_email_verified());
        assert!(u.can_sign_in_with_password());
    }

    #[test]
    fn test_link_external_identity() {
        let mut u = user(1, "a@x.test");
        u.link_external_identity("google-123".into(), false);
        assert_eq!(u.external_id.as_deref(), Some("google-123"));
        assert!(!u.email_verified);

        u.link_external_identity("google-123".into(), true);
        assert!(u.email_verified);
    }
}
