//! Login Value Object
//!
//! The public handle: 3 to 20 ASCII letters or digits, unique per account.
//! Case is preserved; uniqueness is enforced by the identity store.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const LOGIN_MIN_LENGTH: usize = 3;
pub const LOGIN_MAX_LENGTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Login(String);

impl Login {
    pub fn new(login: impl Into<String>) -> AppResult<Self> {
        let login = login.into();
        let len = login.chars().count();

        if !(LOGIN_MIN_LENGTH..=LOGIN_MAX_LENGTH).contains(&len) {
            return Err(AppError::bad_request(format!(
                "Login must be between {} and {} characters",
                LOGIN_MIN_LENGTH, LOGIN_MAX_LENGTH
            )));
        }

        if !login.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::bad_request(
                "Login may only contain letters and digits",
            ));
        }

        Ok(Self(login))
    }

    /// Derive a login for a federated account from its email local part.
    ///
    /// Non-alphanumerics are dropped, the result is cut to leave room for
    /// `suffix`, and short results are padded with `"user"`.
    pub fn derive(local_part: &str, suffix: &str) -> AppResult<Self> {
        let room = LOGIN_MAX_LENGTH.saturating_sub(suffix.len());
        let mut base: String = local_part
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(room)
            .collect();
        base.push_str(suffix);
        while base.len() < LOGIN_MIN_LENGTH {
            base.push_str("user");
        }
        base.truncate(LOGIN_MAX_LENGTH);
        Self::new(base)
    }

    pub fn from_db(login: impl Into<String>) -> Self {
        Self(login.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_bounds() {
        assert!(Login::new("ab").is_err());
        assert!(Login::new("abc").is_ok());
        assert!(Login::new("a".repeat(20)).is_ok());
        assert!(Login::new("a".repeat(21)).is_err());
    }

    #[test]
    fn test_login_charset() {
        assert!(Login::new("alice42").is_ok());
        assert!(Login::new("Alice").is_ok());
        assert!(Login::new("alice_42").is_err());
        assert!(Login::new("al ice").is_err());
        assert!(Login::new("алиса").is_err());
    }

    #[test]
    fn test_derive_from_email() {
        assert_eq!(Login::derive("john.doe", "").unwrap().as_str(), "johndoe");
        assert_eq!(Login::derive("a", "").unwrap().as_str(), "auser");
        assert_eq!(Login::derive("", "").unwrap().as_str(), "user");

        let long = Login::derive("averyveryverylonglocalpart", "x7k2").unwrap();
        assert_eq!(long.as_str().len(), 20);
        assert!(long.as_str().ends_with("x7k2"));
    }
}
