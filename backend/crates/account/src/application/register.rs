//! Register Use Case
//!
//! Creates a new account and signs it in.

use std::sync::Arc;

use mail::EmailJob;
use platform::client::ClientInfo;

use crate::application::check_session::open_session;
use crate::application::config::AccountConfig;
use crate::application::notify::enqueue_email;
use crate::domain::entity::{auth_session::SessionStage, user::User};
use crate::domain::repository::{AuthSessionRepository, EmailQueue, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AccountError, AccountResult};

/// Register input
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

/// A user together with the cookie value of their new session
pub struct SessionOutput {
    pub user: User,
    pub session_token: String,
}

/// Register use case
pub struct RegisterUseCase<U, S, Q>
where
    U: UserRepository,
    S: AuthSessionRepository,
    Q: EmailQueue,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    queue: Arc<Q>,
    config: Arc<AccountConfig>,
}

impl<U, S, Q> RegisterUseCase<U, S, Q>
where
    U: UserRepository,
    S: AuthSessionRepository,
    Q: EmailQueue,
{
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        queue: Arc<Q>,
        config: Arc<AccountConfig>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            queue,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: RegisterInput,
        client: &ClientInfo,
    ) -> AccountResult<SessionOutput> {
        let user = create_account(
            &*self.user_repo,
            &*self.queue,
            &self.config,
            input.email,
            input.password,
            false,
        )
        .await?;

        let (session, session_token) = open_session(
            &*self.session_repo,
            &self.config,
            user.user_id,
            SessionStage::Authenticated,
            client,
        )
        .await?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            "User registered"
        );

        Ok(SessionOutput {
            user,
            session_token,
        })
    }
}

/// Create an unverified user and send the verification email
///
/// No password policy is applied here.
pub(crate) async fn create_account<U, Q>(
    user_repo: &U,
    queue: &Q,
    config: &AccountConfig,
    email: String,
    password: String,
    is_admin: bool,
) -> AccountResult<User>
where
    U: UserRepository,
    Q: EmailQueue,
{
    let email = Email::new(email)?;

    if user_repo.exists_by_email(&email).await? {
        return Err(AccountError::EmailAlreadyExists);
    }

    let raw_password = RawPassword::new(password);
    let password = UserPassword::from_raw(&raw_password, config.pepper())?;

    let mut user = User::new(email, password, is_admin);
    let token = user.issue_verification_token();

    user_repo.create(&user).await?;

    enqueue_email(
        queue,
        EmailJob::email_verification(user.email.as_str(), token.into_string()),
    )
    .await;

    Ok(user)
}
