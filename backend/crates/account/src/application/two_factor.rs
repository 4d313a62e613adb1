//! Two-Factor Use Case
//!
//! Secret generation, enabling and disabling of TOTP.

use std::sync::Arc;

use crate::application::config::AccountConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::totp_secret::TotpSecret;
use crate::error::{AccountError, AccountResult};

/// Provisioning data for an authenticator app
pub struct TwoFactorSetup {
    /// QR code as base64-encoded PNG
    pub qr_code: String,
    /// Base32 secret for manual entry
    pub totp_secret: String,
    /// otpauth:// URL
    pub otpauth_url: String,
}

/// Two-factor use case
pub struct TwoFactorUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AccountConfig>,
}

impl<U> TwoFactorUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AccountConfig>) -> Self {
        Self { user_repo, config }
    }

    /// Propose a fresh secret; nothing is stored until [`Self::enable`]
    pub fn generate(&self, user: &User) -> AccountResult<TwoFactorSetup> {
        if user.two_factor_enabled() {
            return Err(AccountError::AlreadyEnabled);
        }

        let secret = TotpSecret::generate();
        let account_name = user.email.as_str();

        Ok(TwoFactorSetup {
            qr_code: secret.qr_code(&self.config.totp_issuer, account_name)?,
            otpauth_url: secret.otpauth_url(&self.config.totp_issuer, account_name),
            totp_secret: secret.as_base32().to_string(),
        })
    }

    /// Enable 2FA with a client-held secret, proven by a current code
    pub async fn enable(&self, mut user: User, totp_secret: &str, code: &str) -> AccountResult<User> {
        if user.two_factor_enabled() {
            return Err(AccountError::AlreadyEnabled);
        }

        let secret = TotpSecret::from_base32(totp_secret).map_err(|_| AccountError::IncorrectCode)?;
        if !secret.verify(code, &self.config.totp_issuer, user.email.as_str()) {
            return Err(AccountError::IncorrectCode);
        }

        user.enable_two_factor(secret.seal(&self.config.totp_cipher())?);
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "2FA enabled");
        Ok(user)
    }

    /// Disable 2FA, proven by a current code
    pub async fn disable(&self, mut user: User, code: &str) -> AccountResult<User> {
        let sealed = user.two_factor.as_ref().ok_or(AccountError::AlreadyDisabled)?;

        let secret = sealed.open(&self.config.totp_cipher())?;
        if !secret.verify(code, &self.config.totp_issuer, user.email.as_str()) {
            return Err(AccountError::IncorrectCode);
        }

        user.disable_two_factor();
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "2FA disabled");
        Ok(user)
    }
}
