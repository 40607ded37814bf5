//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod oauth;
pub mod password;
pub mod session_manager;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod users;
pub mod verify_email;

// Re-exports
pub use config::AuthConfig;
pub use oauth::{AuthorizationRequest, CallbackInput, FederatedSignIn, OAuthUseCase};
pub use password::{PasswordCheck, PasswordService};
pub use session_manager::{SessionManager, TokenPair};
pub use sign_in::{SignInInput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use users::UserAccountUseCase;
pub use verify_email::VerifyEmailUseCase;
