//! Check Session Use Case
//!
//! Resolves the session cookie to a live session and opens new sessions.

use std::sync::Arc;

use chrono::Duration;
use platform::client::ClientInfo;

use crate::application::config::AccountConfig;
use crate::application::session_token;
use crate::domain::entity::{
    auth_session::{AuthSession, SessionStage},
    user::User,
};
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::value_object::user_id::UserId;
use crate::error::{AccountError, AccountResult};

/// A fully authenticated caller, stored in request extensions
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub session: AuthSession,
    pub user: User,
}

/// Check session use case
pub struct CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<AccountConfig>,
}

impl<U, S> CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<AccountConfig>) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    /// Require an authenticated session and load its user
    pub async fn authenticate(&self, session_token: Option<&str>) -> AccountResult<Authenticated> {
        let token = session_token.ok_or(AccountError::Unauthenticated)?;

        let mut session = find_session(&*self.session_repo, &self.config, token)
            .await?
            .filter(AuthSession::is_authenticated)
            .ok_or(AccountError::Unauthenticated)?;

        let user = self
            .user_repo
            .find_by_id(&session.user_id)
            .await?
            .ok_or(AccountError::Unauthenticated)?;

        session.touch();
        self.session_repo.update(&session).await?;

        Ok(Authenticated { session, user })
    }
}

/// Resolve a cookie token to a live session, in any stage
pub(crate) async fn find_session<S>(
    session_repo: &S,
    config: &AccountConfig,
    token: &str,
) -> AccountResult<Option<AuthSession>>
where
    S: AuthSessionRepository,
{
    let Some(session_id) = session_token::verify(&config.session_secret, token) else {
        return Ok(None);
    };

    let Some(session) = session_repo.find_by_id(&session_id).await? else {
        return Ok(None);
    };

    if session.is_expired() {
        session_repo.delete(&session_id).await?;
        return Ok(None);
    }

    Ok(Some(session))
}

/// Persist a new session and return it with its signed cookie value
pub(crate) async fn open_session<S>(
    session_repo: &S,
    config: &AccountConfig,
    user_id: UserId,
    stage: SessionStage,
    client: &ClientInfo,
) -> AccountResult<(AuthSession, String)>
where
    S: AuthSessionRepository,
{
    let ttl = Duration::milliseconds(config.session_ttl_ms());
    let session = AuthSession::new(user_id, stage, client, ttl);
    session_repo.create(&session).await?;

    let token = session_token::sign(&config.session_secret, &session.session_id)?;
    Ok((session, token))
}
