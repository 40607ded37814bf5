//! Value Object Module

pub mod email;
pub mod login;
pub mod user_id;
pub mod user_password;
pub mod user_role;
