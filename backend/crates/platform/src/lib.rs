//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, Base64, AES-256-GCM secret box)
//! - Password hashing (Argon2id) and the account password policy
//! - Cookie management
//! - Client identification from request headers

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
