//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    auth_session::{AuthSession, SessionStage},
    user::User,
};
pub use repository::{AccountStore, AuthSessionRepository, EmailQueue, UserRepository};
