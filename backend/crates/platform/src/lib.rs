//! Platform Crate - Technical Infrastructure
//!
//! Domain-free building blocks shared by the service crates:
//! - Random tokens and constant-time comparison
//! - Password hashing (Argon2id, PHC strings)
//! - Cookie building and parsing
//! - An injectable wall clock
//! - Operation deadlines for outbound I/O

pub mod clock;
pub mod cookie;
pub mod crypto;
pub mod deadline;
pub mod password;
