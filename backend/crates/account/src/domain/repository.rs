//! Repository Traits
//!
//! Interfaces for data persistence and outgoing email. Implementations are in
//! the infrastructure layer.

use mail::EmailJob;

use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::value_object::{
    email::Email,
    user_id::{SessionId, UserId},
};
use crate::error::AccountResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user; fails with `EmailAlreadyExists` on a duplicate email
    async fn create(&self, user: &User) -> AccountResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AccountResult<Option<User>>;

    /// Exact, case-sensitive lookup
    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AccountResult<bool>;

    /// Update user
    async fn update(&self, user: &User) -> AccountResult<()>;

    /// Delete a user and, through the cascade, its sessions; `false` if absent
    async fn delete(&self, user_id: &UserId) -> AccountResult<bool>;

    async fn count(&self) -> AccountResult<u64>;

    /// All users ordered by creation time, then id
    async fn list_all(&self) -> AccountResult<Vec<User>>;

    /// One window of [`LocalUserRepository::list_all`]'s ordering
    async fn list_page(&self, offset: u64, limit: u64) -> AccountResult<Vec<User>>;
}

/// Auth session repository trait
#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    /// Create a new session
    async fn create(&self, session: &AuthSession) -> AccountResult<()>;

    /// Find a live (not expired) session
    async fn find_by_id(&self, session_id: &SessionId) -> AccountResult<Option<AuthSession>>;

    /// Update session (last activity)
    async fn update(&self, session: &AuthSession) -> AccountResult<()>;

    /// Delete a session
    async fn delete(&self, session_id: &SessionId) -> AccountResult<()>;

    /// Clean up expired sessions
    async fn cleanup_expired(&self) -> AccountResult<u64>;
}

/// Outgoing email queue; delivery happens in another process
#[trait_variant::make(EmailQueue: Send)]
pub trait LocalEmailQueue {
    async fn enqueue(&self, job: EmailJob) -> AccountResult<()>;
}

/// Everything the HTTP layer needs from a store
pub trait AccountStore: UserRepository + AuthSessionRepository + Send + Sync + 'static {}

impl<T> AccountStore for T where T: UserRepository + AuthSessionRepository + Send + Sync + 'static {}
