//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod memory;
pub mod outbox;
pub mod postgres;

pub use memory::{InMemoryAccountStore, RecordingEmailQueue};
pub use postgres::PgAccountRepository;
