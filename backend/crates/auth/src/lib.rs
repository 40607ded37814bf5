//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, tokens, store and gateway traits
//! - `application/` - Use cases and the session manager
//! - `infra/` - Postgres, Redis, Google, SMTP and in-memory implementations
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Registration with email verification links
//! - Email + password login issuing an access/refresh token pair
//! - Refresh rotation with a sliding lifetime and an absolute ceiling
//! - Google OAuth2 sign-in that links or creates local accounts
//! - Bearer and role gates for protected routes
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, upgraded on login when params change
//! - Access and refresh tokens signed with separate HS256 secrets
//! - Refresh sessions are single-use: rotation takes the old one atomically
//! - Unknown accounts and wrong passwords fail identically

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use presentation::router::api_router;
pub use presentation::state::{AuthAppState, AuthBackend, ProductionBackend};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
