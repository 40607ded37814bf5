//! User identifier, assigned by the identity store on creation.

pub use kernel::id::UserId;
