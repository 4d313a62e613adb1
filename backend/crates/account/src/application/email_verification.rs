//! Email Verification Use Cases

use std::sync::Arc;

use mail::EmailJob;

use crate::application::notify::enqueue_email;
use crate::domain::entity::user::User;
use crate::domain::repository::{EmailQueue, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AccountError, AccountResult};

/// Verify email use case
pub struct VerifyEmailUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> VerifyEmailUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, email: String, verification_token: &str) -> AccountResult<User> {
        let email = Email::new(email).map_err(|_| AccountError::InvalidVerificationToken)?;

        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidVerificationToken)?;

        user.confirm_email(verification_token)?;
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Email verified");
        Ok(user)
    }
}

/// Resend verification use case
///
/// Issues a new token; the previous one stops working.
pub struct ResendVerificationUseCase<U, Q>
where
    U: UserRepository,
    Q: EmailQueue,
{
    user_repo: Arc<U>,
    queue: Arc<Q>,
}

impl<U, Q> ResendVerificationUseCase<U, Q>
where
    U: UserRepository,
    Q: EmailQueue,
{
    pub fn new(user_repo: Arc<U>, queue: Arc<Q>) -> Self {
        Self { user_repo, queue }
    }

    pub async fn execute(&self, mut user: User) -> AccountResult<()> {
        let token = user.issue_verification_token();
        self.user_repo.update(&user).await?;

        enqueue_email(
            &*self.queue,
            EmailJob::email_verification(user.email.as_str(), token.into_string()),
        )
        .await;

        tracing::info!(user_id = %user.user_id, "Verification email re-sent");
        Ok(())
    }
}
