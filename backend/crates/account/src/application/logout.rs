//! Logout Use Case
//!
//! Invalidates a user session.

use std::sync::Arc;

use crate::domain::entity::auth_session::AuthSession;
use crate::domain::repository::AuthSessionRepository;
use crate::error::AccountResult;

/// Logout use case
pub struct LogoutUseCase<S>
where
    S: AuthSessionRepository,
{
    session_repo: Arc<S>,
}

impl<S> LogoutUseCase<S>
where
    S: AuthSessionRepository,
{
    pub fn new(session_repo: Arc<S>) -> Self {
        Self { session_repo }
    }

    pub async fn execute(&self, session: &AuthSession) -> AccountResult<()> {
        self.session_repo.delete(&session.session_id).await?;

        tracing::info!(
            user_id = %session.user_id,
            session_id = %session.session_id,
            "User logged out"
        );
        Ok(())
    }
}
