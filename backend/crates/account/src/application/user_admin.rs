//! User Administration Use Cases
//!
//! Listing, lookup, admin creation, update and deletion of users.

use std::sync::Arc;

use mail::EmailJob;

use crate::application::config::AccountConfig;
use crate::application::notify::enqueue_email;
use crate::application::register::create_account;
use crate::domain::entity::user::User;
use crate::domain::repository::{EmailQueue, UserRepository};
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::{AccountError, AccountResult};

/// Largest accepted page size
pub const MAX_PER_PAGE: u64 = 100;

// ============================================================================
// List Users
// ============================================================================

/// Raw pagination parameters; paging applies only when both are present
#[derive(Debug, Clone, Copy, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Pagination envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

pub struct UserListing {
    pub users: Vec<User>,
    /// `None` when the full list was returned
    pub meta: Option<PageMeta>,
}

/// List users use case
pub struct ListUsersUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ListUsersUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, query: PageQuery) -> AccountResult<UserListing> {
        let (Some(page), Some(per_page)) = (query.page, query.per_page) else {
            let users = self.user_repo.list_all().await?;
            return Ok(UserListing { users, meta: None });
        };

        let page = page.max(1) as u64;
        let per_page = per_page.clamp(1, MAX_PER_PAGE as i64) as u64;

        let total_items = self.user_repo.count().await?;
        let users = self
            .user_repo
            .list_page((page - 1).saturating_mul(per_page), per_page)
            .await?;

        Ok(UserListing {
            users,
            meta: Some(PageMeta {
                page,
                per_page,
                total_pages: total_items.div_ceil(per_page),
                total_items,
            }),
        })
    }
}

// ============================================================================
// Create User (admin)
// ============================================================================

pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

/// Admin create user use case; no session is opened
pub struct CreateUserUseCase<U, Q>
where
    U: UserRepository,
    Q: EmailQueue,
{
    user_repo: Arc<U>,
    queue: Arc<Q>,
    config: Arc<AccountConfig>,
}

impl<U, Q> CreateUserUseCase<U, Q>
where
    U: UserRepository,
    Q: EmailQueue,
{
    pub fn new(user_repo: Arc<U>, queue: Arc<Q>, config: Arc<AccountConfig>) -> Self {
        Self {
            user_repo,
            queue,
            config,
        }
    }

    pub async fn execute(&self, admin: &User, input: CreateUserInput) -> AccountResult<User> {
        let user = create_account(
            &*self.user_repo,
            &*self.queue,
            &self.config,
            input.email,
            input.password,
            input.is_admin,
        )
        .await?;

        tracing::info!(
            admin_id = %admin.user_id,
            user_id = %user.user_id,
            is_admin = user.is_admin,
            "User created by admin"
        );
        Ok(user)
    }
}

// ============================================================================
// Get / Update User (admin)
// ============================================================================

/// Admin lookup of a single user
pub struct GetUserUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> GetUserUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, user_id: &UserId) -> AccountResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)
    }
}

/// Fields an admin may change; absent fields are left alone
#[derive(Debug, Default)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

/// Admin update use case
///
/// A new address resets `is_verified` and sends a fresh verification email.
pub struct UpdateUserUseCase<U, Q>
where
    U: UserRepository,
    Q: EmailQueue,
{
    user_repo: Arc<U>,
    queue: Arc<Q>,
}

impl<U, Q> UpdateUserUseCase<U, Q>
where
    U: UserRepository,
    Q: EmailQueue,
{
    pub fn new(user_repo: Arc<U>, queue: Arc<Q>) -> Self {
        Self { user_repo, queue }
    }

    pub async fn execute(
        &self,
        admin: &User,
        user_id: &UserId,
        input: UpdateUserInput,
    ) -> AccountResult<User> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        let new_email = input.email.map(Email::new).transpose()?;
        let verification = match new_email {
            Some(email) if email != user.email => {
                if self.user_repo.exists_by_email(&email).await? {
                    return Err(AccountError::EmailAlreadyExists);
                }
                Some(user.change_email(email))
            }
            _ => None,
        };
        if let Some(is_admin) = input.is_admin {
            user.is_admin = is_admin;
        }

        self.user_repo.update(&user).await?;

        if let Some(token) = verification {
            enqueue_email(
                &*self.queue,
                EmailJob::email_verification(user.email.as_str(), token.into_string()),
            )
            .await;
        }

        tracing::info!(
            admin_id = %admin.user_id,
            user_id = %user.user_id,
            is_admin = user.is_admin,
            "User updated by admin"
        );
        Ok(user)
    }
}

// ============================================================================
// Delete User
// ============================================================================

/// Delete user use case (admin delete and self-delete)
pub struct DeleteUserUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> DeleteUserUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn delete_by_id(&self, admin: &User, user_id: &UserId) -> AccountResult<()> {
        if !self.user_repo.delete(user_id).await? {
            return Err(AccountError::UserNotFound);
        }

        tracing::info!(admin_id = %admin.user_id, user_id = %user_id, "User deleted by admin");
        Ok(())
    }

    pub async fn delete_account(&self, user: &User) -> AccountResult<()> {
        self.user_repo.delete(&user.user_id).await?;

        tracing::info!(user_id = %user.user_id, "Account deleted");
        Ok(())
    }
}
