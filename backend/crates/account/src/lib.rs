//! Account (Account & Session) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository and queue traits
//! - `application/` - Use cases and configuration
//! - `infra/` - PostgreSQL repositories, the email outbox adapter, in-memory stores
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Registration and login with email + password
//! - Optional TOTP second factor (pending session until the code is checked)
//! - Server-side sessions referenced by a signed cookie
//! - Password reset and email verification through emailed tokens
//! - User listing and administration
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Reset and verification tokens stored as SHA-256 digests
//! - TOTP secrets encrypted at rest with AES-256-GCM

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AccountConfig;
pub use error::{AccountError, AccountResult};
pub use infra::memory::{InMemoryAccountStore, RecordingEmailQueue};
pub use infra::postgres::PgAccountRepository;
pub use presentation::router::account_router;

pub use kernel::error::{app_error::AppError, kind::ErrorKind};
