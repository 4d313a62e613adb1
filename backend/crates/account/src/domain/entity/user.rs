//! User Entity
//!
//! The account itself: credentials, flags, and the pending token state of
//! the email-driven flows.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{
    email::Email,
    secret_token::{SecretToken, TokenHash},
    totp_secret::EncryptedTotpSecret,
    user_id::UserId,
    user_password::UserPassword,
};
use crate::error::{AccountError, AccountResult};

/// An outstanding password reset: digest and issuance time always travel together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub token_hash: TokenHash,
    pub issued_at: DateTime<Utc>,
}

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub email: Email,
    pub password: UserPassword,
    pub is_admin: bool,
    pub is_verified: bool,
    pub password_reset: Option<PasswordReset>,
    pub email_verification: Option<TokenHash>,
    /// Present exactly when 2FA is enabled
    pub two_factor: Option<EncryptedTotpSecret>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unverified user
    pub fn new(email: Email, password: UserPassword, is_admin: bool) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email,
            password,
            is_admin,
            is_verified: false,
            password_reset: None,
            email_verification: None,
            two_factor: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn two_factor_enabled(&self) -> bool {
        self.two_factor.is_some()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn set_password(&mut self, password: UserPassword) {
        self.password = password;
        self.touch();
    }

    // ------------------------------------------------------------------------
    // Email verification
    // ------------------------------------------------------------------------

    /// Replace any previous verification token with a fresh one
    pub fn issue_verification_token(&mut self) -> SecretToken {
        let token = SecretToken::generate();
        self.email_verification = Some(token.hash());
        self.touch();
        token
    }

    /// Move to a new address, which has to be verified again
    pub fn change_email(&mut self, email: Email) -> SecretToken {
        self.email = email;
        self.is_verified = false;
        self.issue_verification_token()
    }

    pub fn confirm_email(&mut self, raw_token: &str) -> AccountResult<()> {
        match &self.email_verification {
            Some(hash) if hash.matches(raw_token) => {
                self.is_verified = true;
                self.email_verification = None;
                self.touch();
                Ok(())
            }
            _ => Err(AccountError::InvalidVerificationToken),
        }
    }

    // ------------------------------------------------------------------------
    // Password reset
    // ------------------------------------------------------------------------

    pub fn issue_password_reset(&mut self, now: DateTime<Utc>) -> SecretToken {
        let token = SecretToken::generate();
        self.password_reset = Some(PasswordReset {
            token_hash: token.hash(),
            issued_at: now,
        });
        self.touch();
        token
    }

    /// Check a reset token: it must match first, then be younger than `ttl`
    pub fn check_reset_token(
        &self,
        raw_token: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AccountResult<()> {
        let reset = self
            .password_reset
            .as_ref()
            .filter(|reset| reset.token_hash.matches(raw_token))
            .ok_or(AccountError::InvalidResetToken)?;

        if now - reset.issued_at > ttl {
            return Err(AccountError::TokenExpired);
        }
        Ok(())
    }

    pub fn complete_password_reset(&mut self, password: UserPassword) {
        self.password = password;
        self.password_reset = None;
        self.touch();
    }

    // ------------------------------------------------------------------------
    // Two-factor
    // ------------------------------------------------------------------------

    pub fn enable_two_factor(&mut self, secret: EncryptedTotpSecret) {
        self.two_factor = Some(secret);
        self.touch();
    }

    pub fn disable_two_factor(&mut self) {
        self.two_factor = None;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;

    fn user() -> User {
        let password = UserPassword::from_raw(&RawPassword::new("White_wolf123".into()), None)
            .unwrap();
        User::new(Email::new("alice@example.com").unwrap(), password, false)
    }

    #[test]
    fn test_new_user_defaults() {
        let user = user();
        assert!(!user.is_admin);
        assert!(!user.is_verified);
        assert!(!user.two_factor_enabled());
        assert!(user.password_reset.is_none());
    }

    #[test]
    fn test_confirm_email() {
        let mut user = user();
        let token = user.issue_verification_token();

        assert!(matches!(
            user.confirm_email("wrong"),
            Err(AccountError::InvalidVerificationToken)
        ));
        assert!(!user.is_verified);

        user.confirm_email(token.as_str()).unwrap();
        assert!(user.is_verified);
        assert!(user.email_verification.is_none());

        // Tokens are single use
        assert!(user.confirm_email(token.as_str()).is_err());
    }

    #[test]
    fn test_change_email_requires_new_verification() {
        let mut user = user();
        let old = user.issue_verification_token();
        user.confirm_email(old.as_str()).unwrap();

        let token = user.change_email(Email::new("bob@example.com").unwrap());

        assert_eq!(user.email.as_str(), "bob@example.com");
        assert!(!user.is_verified);
        assert!(user.confirm_email(token.as_str()).is_ok());
    }

    #[test]
    fn test_reissued_verification_token_replaces_old_one() {
        let mut user = user();
        let old = user.issue_verification_token();
        let new = user.issue_verification_token();

        assert!(user.confirm_email(old.as_str()).is_err());
        assert!(user.confirm_email(new.as_str()).is_ok());
    }

    #[test]
    fn test_reset_token_checks_match_before_expiry() {
        let mut user = user();
        let issued_at = Utc::now() - Duration::hours(3);
        let token = user.issue_password_reset(issued_at);
        let now = Utc::now();

        // A wrong token is reported as invalid even when the real one expired
        assert!(matches!(
            user.check_reset_token("wrong", Duration::hours(2), now),
            Err(AccountError::InvalidResetToken)
        ));
        assert!(matches!(
            user.check_reset_token(token.as_str(), Duration::hours(2), now),
            Err(AccountError::TokenExpired)
        ));
        // Expiry leaves the pair in place
        assert!(user.password_reset.is_some());

        assert!(
            user.check_reset_token(token.as_str(), Duration::hours(4), now)
                .is_ok()
        );
    }

    #[test]
    fn test_reset_token_expiry_boundary() {
        let mut user = user();
        let now = Utc::now();
        let ttl = Duration::hours(2);
        let token = user.issue_password_reset(now);

        let age = |user: &mut User, issued_at| {
            if let Some(reset) = user.password_reset.as_mut() {
                reset.issued_at = issued_at;
            }
        };

        // Exactly `ttl` old is still accepted
        age(&mut user, now - ttl);
        assert!(user.check_reset_token(token.as_str(), ttl, now).is_ok());

        age(&mut user, now - ttl + Duration::seconds(1));
        assert!(user.check_reset_token(token.as_str(), ttl, now).is_ok());

        age(&mut user, now - ttl - Duration::seconds(1));
        assert!(matches!(
            user.check_reset_token(token.as_str(), ttl, now),
            Err(AccountError::TokenExpired)
        ));
        assert!(user.password_reset.is_some());
    }

    #[test]
    fn test_reset_without_token() {
        let user = user();
        assert!(matches!(
            user.check_reset_token("anything", Duration::hours(2), Utc::now()),
            Err(AccountError::InvalidResetToken)
        ));
    }

    #[test]
    fn test_complete_password_reset_clears_pair() {
        let mut user = user();
        user.issue_password_reset(Utc::now());

        let password = UserPassword::from_raw(&RawPassword::new("Black_wolf456".into()), None)
            .unwrap();
        user.complete_password_reset(password);

        assert!(user.password_reset.is_none());
        assert!(
            user.password
                .verify(&RawPassword::new("Black_wolf456".into()), None)
        );
    }

    #[test]
    fn test_two_factor_flag_follows_secret() {
        let mut user = user();
        user.enable_two_factor(EncryptedTotpSecret::from_db("sealed"));
        assert!(user.two_factor_enabled());
        user.disable_two_factor();
        assert!(!user.two_factor_enabled());
    }
}
