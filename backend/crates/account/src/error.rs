//! Account Error Types
//!
//! Every client-facing variant carries a stable numeric code that is
//! rendered as `{"error": <code>, "message": <text>}`.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::crypto::CipherError;
use platform::password::{PasswordHashError, PasswordPolicyError};
use thiserror::Error;

/// Account result type alias
pub type AccountResult<T> = Result<T, AccountError>;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("An account with this email already exists")]
    EmailAlreadyExists,

    #[error("Could not login with the given email and password")]
    WrongEmailOrPassword,

    #[error("Could not login with the given email and 2FA code")]
    WrongEmailOrTotpCode,

    #[error("The current password is incorrect")]
    WrongPassword,

    #[error("Password does not match the conditions: {0}")]
    PasswordPolicyViolation(#[from] PasswordPolicyError),

    #[error("Could not reset the password with this token")]
    InvalidResetToken,

    #[error("The token has expired")]
    TokenExpired,

    #[error("Could not verify the email with this token")]
    InvalidVerificationToken,

    #[error("You must be an administrator to do this")]
    MustBeAdmin,

    #[error("2FA is already enabled")]
    AlreadyEnabled,

    #[error("Incorrect 2FA code")]
    IncorrectCode,

    #[error("2FA is already disabled")]
    AlreadyDisabled,

    #[error("User not found")]
    UserNotFound,

    #[error("You must be logged in to do this")]
    Unauthenticated,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    /// Stable numeric code sent to clients; `None` for server errors
    pub fn code(&self) -> Option<u16> {
        let code = match self {
            AccountError::EmailAlreadyExists => 0,
            AccountError::WrongEmailOrPassword => 1,
            AccountError::WrongEmailOrTotpCode => 2,
            AccountError::WrongPassword => 3,
            AccountError::PasswordPolicyViolation(_) => 4,
            AccountError::InvalidResetToken => 5,
            AccountError::TokenExpired => 6,
            AccountError::InvalidVerificationToken => 7,
            AccountError::MustBeAdmin => 8,
            AccountError::AlreadyEnabled => 9,
            AccountError::IncorrectCode => 10,
            AccountError::AlreadyDisabled => 11,
            AccountError::UserNotFound => 12,
            AccountError::Unauthenticated => 13,
            AccountError::InvalidEmail => 14,
            AccountError::Database(_) | AccountError::Internal(_) => return None,
        };
        Some(code)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::InvalidResetToken
            | AccountError::InvalidVerificationToken
            | AccountError::AlreadyEnabled
            | AccountError::AlreadyDisabled
            | AccountError::InvalidEmail => ErrorKind::Rejected,
            AccountError::WrongEmailOrPassword
            | AccountError::WrongEmailOrTotpCode
            | AccountError::IncorrectCode
            | AccountError::Unauthenticated => ErrorKind::Unauthenticated,
            AccountError::MustBeAdmin => ErrorKind::Forbidden,
            AccountError::UserNotFound => ErrorKind::NotFound,
            AccountError::EmailAlreadyExists
            | AccountError::WrongPassword
            | AccountError::PasswordPolicyViolation(_) => ErrorKind::Conflict,
            AccountError::TokenExpired => ErrorKind::Expired,
            AccountError::Database(_) | AccountError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let error = AppError::new(self.kind(), self.to_string());
        match self.code() {
            Some(code) => error.with_code(code),
            None => error,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AccountError::Database(e) => {
                tracing::error!(error = %e, "Account database error");
            }
            AccountError::Internal(msg) => {
                tracing::error!(message = %msg, "Account internal error");
            }
            AccountError::WrongEmailOrPassword => {
                tracing::warn!("Failed login attempt");
            }
            AccountError::WrongEmailOrTotpCode => {
                tracing::warn!("Failed second factor login attempt");
            }
            AccountError::IncorrectCode => {
                tracing::warn!("Incorrect 2FA code submitted");
            }
            _ => {
                tracing::debug!(error = %self, "Account error");
            }
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<PasswordHashError> for AccountError {
    fn from(err: PasswordHashError) -> Self {
        AccountError::Internal(err.to_string())
    }
}

impl From<CipherError> for AccountError {
    fn from(err: CipherError) -> Self {
        AccountError::Internal(format!("TOTP secret: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::error::kind::ErrorCode;

    #[test]
    fn test_codes_and_statuses() {
        let cases = [
            (AccountError::EmailAlreadyExists, 0, 409),
            (AccountError::WrongEmailOrPassword, 1, 401),
            (AccountError::WrongEmailOrTotpCode, 2, 401),
            (AccountError::WrongPassword, 3, 409),
            (
                AccountError::PasswordPolicyViolation(PasswordPolicyError::MissingDigit),
                4,
                409,
            ),
            (AccountError::InvalidResetToken, 5, 400),
            (AccountError::TokenExpired, 6, 410),
            (AccountError::InvalidVerificationToken, 7, 400),
            (AccountError::MustBeAdmin, 8, 403),
            (AccountError::AlreadyEnabled, 9, 400),
            (AccountError::IncorrectCode, 10, 401),
            (AccountError::AlreadyDisabled, 11, 400),
            (AccountError::UserNotFound, 12, 404),
            (AccountError::Unauthenticated, 13, 401),
            (AccountError::InvalidEmail, 14, 400),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.code(), Some(code), "{error}");
            assert_eq!(error.status_code(), status, "{error}");
        }
    }

    #[test]
    fn test_server_errors_have_no_code() {
        let error = AccountError::Internal("boom".to_string());
        assert_eq!(error.code(), None);
        assert_eq!(error.status_code(), 500);
        assert!(error.to_app_error().is_server_error());
    }

    #[test]
    fn test_app_error_carries_code_and_message() {
        let app = AccountError::AlreadyEnabled.to_app_error();
        assert_eq!(app.code(), Some(ErrorCode::new(9)));
        assert_eq!(app.message(), "2FA is already enabled");
    }
}
