//! Password Use Cases
//!
//! Change (while logged in), forgot (emails a reset token) and reset.

use std::sync::Arc;

use chrono::Utc;
use mail::EmailJob;

use crate::application::config::AccountConfig;
use crate::application::notify::enqueue_email;
use crate::domain::entity::user::User;
use crate::domain::repository::{EmailQueue, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AccountError, AccountResult};

// ============================================================================
// Change Password
// ============================================================================

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

/// Change password use case
///
/// Other sessions of the user stay valid.
pub struct ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AccountConfig>,
}

impl<U> ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AccountConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, mut user: User, input: ChangePasswordInput) -> AccountResult<User> {
        let current = RawPassword::new(input.current_password);
        if !user.password.verify(&current, self.config.pepper()) {
            return Err(AccountError::WrongPassword);
        }

        let new_password = RawPassword::new(input.new_password);
        new_password.check_policy()?;

        user.set_password(UserPassword::from_raw(&new_password, self.config.pepper())?);
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Password changed");
        Ok(user)
    }
}

// ============================================================================
// Forgot Password
// ============================================================================

/// Forgot password use case
///
/// Unknown addresses succeed silently so the endpoint reveals nothing.
pub struct ForgotPasswordUseCase<U, Q>
where
    U: UserRepository,
    Q: EmailQueue,
{
    user_repo: Arc<U>,
    queue: Arc<Q>,
}

impl<U, Q> ForgotPasswordUseCase<U, Q>
where
    U: UserRepository,
    Q: EmailQueue,
{
    pub fn new(user_repo: Arc<U>, queue: Arc<Q>) -> Self {
        Self { user_repo, queue }
    }

    pub async fn execute(&self, email: String) -> AccountResult<()> {
        let Ok(email) = Email::new(email) else {
            return Ok(());
        };

        let Some(mut user) = self.user_repo.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = user.issue_password_reset(Utc::now());
        self.user_repo.update(&user).await?;

        enqueue_email(
            &*self.queue,
            EmailJob::password_reset(user.email.as_str(), token.into_string()),
        )
        .await;

        tracing::info!(user_id = %user.user_id, "Password reset token issued");
        Ok(())
    }
}

// ============================================================================
// Reset Password
// ============================================================================

pub struct ResetPasswordInput {
    pub email: String,
    pub reset_token: String,
    pub new_password: String,
}

/// Reset password use case
///
/// Checks run in order: token match, token age, password policy.
pub struct ResetPasswordUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AccountConfig>,
}

impl<U> ResetPasswordUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AccountConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, input: ResetPasswordInput) -> AccountResult<()> {
        let email = Email::new(input.email).map_err(|_| AccountError::InvalidResetToken)?;

        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidResetToken)?;

        user.check_reset_token(&input.reset_token, self.config.reset_token_ttl(), Utc::now())?;

        let new_password = RawPassword::new(input.new_password);
        new_password.check_policy()?;

        user.complete_password_reset(UserPassword::from_raw(
            &new_password,
            self.config.pepper(),
        )?);
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Password reset completed");
        Ok(())
    }
}
