//! Value Object Module

pub mod email;
pub mod secret_token;
pub mod totp_secret;
pub mod user_id;
pub mod user_password;
