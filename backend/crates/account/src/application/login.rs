//! Login Use Cases
//!
//! Password step, then (for 2FA users) the TOTP step.

use std::sync::Arc;

use platform::client::ClientInfo;

use crate::application::check_session::{find_session, open_session};
use crate::application::config::AccountConfig;
use crate::application::register::SessionOutput;
use crate::application::session_token;
use crate::domain::entity::auth_session::SessionStage;
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AccountError, AccountResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Second factor input
pub struct SecondFactorInput {
    pub email: String,
    pub totp_code: String,
}

/// Password login use case
///
/// Users with 2FA get a session in the `PendingSecondFactor` stage, which
/// grants nothing but the right to call [`SecondFactorLoginUseCase`].
pub struct LoginUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<AccountConfig>,
}

impl<U, S> LoginUseCase<U, S>
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

    pub async fn execute(
        &self,
        input: LoginInput,
        current_token: Option<&str>,
        client: &ClientInfo,
    ) -> AccountResult<SessionOutput> {
        let email = Email::new(input.email).map_err(|_| AccountError::WrongEmailOrPassword)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::WrongEmailOrPassword)?;

        let raw_password = RawPassword::new(input.password);
        if !user.password.verify(&raw_password, self.config.pepper()) {
            return Err(AccountError::WrongEmailOrPassword);
        }

        // A failed attempt leaves the current session alone
        if let Some(session_id) =
            current_token.and_then(|t| session_token::verify(&self.config.session_secret, t))
        {
            self.session_repo.delete(&session_id).await?;
        }

        let stage = if user.two_factor_enabled() {
            SessionStage::PendingSecondFactor
        } else {
            SessionStage::Authenticated
        };

        let (session, session_token) = open_session(
            &*self.session_repo,
            &self.config,
            user.user_id,
            stage,
            client,
        )
        .await?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            stage = stage.as_str(),
            "Password login accepted"
        );

        Ok(SessionOutput {
            user,
            session_token,
        })
    }
}

/// Second factor login use case
pub struct SecondFactorLoginUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<AccountConfig>,
}

impl<U, S> SecondFactorLoginUseCase<U, S>
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

    /// Every failure is reported as `WrongEmailOrTotpCode`
    pub async fn execute(
        &self,
        input: SecondFactorInput,
        current_token: Option<&str>,
        client: &ClientInfo,
    ) -> AccountResult<SessionOutput> {
        let token = current_token.ok_or(AccountError::WrongEmailOrTotpCode)?;

        let pending = find_session(&*self.session_repo, &self.config, token)
            .await?
            .filter(|s| s.stage == SessionStage::PendingSecondFactor)
            .ok_or(AccountError::WrongEmailOrTotpCode)?;

        let user = self
            .user_repo
            .find_by_id(&pending.user_id)
            .await?
            .filter(|u| u.email.as_str() == input.email.trim())
            .ok_or(AccountError::WrongEmailOrTotpCode)?;

        let sealed = user
            .two_factor
            .as_ref()
            .ok_or(AccountError::WrongEmailOrTotpCode)?;
        let secret = sealed.open(&self.config.totp_cipher())?;

        if !secret.verify(&input.totp_code, &self.config.totp_issuer, user.email.as_str()) {
            return Err(AccountError::WrongEmailOrTotpCode);
        }

        self.session_repo.delete(&pending.session_id).await?;

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
            "Second factor accepted"
        );

        Ok(SessionOutput {
            user,
            session_token,
        })
    }
}
