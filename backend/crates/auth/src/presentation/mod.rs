//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use middleware::{CurrentUser, require_bearer, require_role};
pub use router::api_router;
pub use state::{AuthAppState, AuthBackend, ProductionBackend};
