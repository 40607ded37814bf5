//! Domain Layer
//!
//! Entities, value objects, tokens and the traits the outer layers implement.

pub mod entity;
pub mod gateway;
pub mod repository;
pub mod token;
pub mod value_object;

// Re-exports
pub use entity::{
    session::{RefreshSession, VerificationRequest},
    user::{NewUser, User},
};
pub use gateway::{EmailSender, ExternalProfile, IdentityProvider, OutgoingEmail};
pub use repository::{SessionStore, UserRepository};
pub use token::{Claims, TokenError, TokenKind, TokenMinter, TokenSubject};
