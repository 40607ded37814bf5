//! Shared Kernel
//!
//! Vocabulary shared by every crate in the workspace:
//! - [`error`]: the unified [`AppError`](error::app_error::AppError) and its
//!   HTTP classification
//! - [`id`]: typed 64-bit identifiers assigned by the identity store
//!
//! Anything that lands here must mean the same thing in every domain.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
