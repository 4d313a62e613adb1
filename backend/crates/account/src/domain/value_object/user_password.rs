//! User Password Value Object
//!
//! Domain wrapper over `platform::password`. Hashing never checks the policy;
//! callers that accept a new password call [`RawPassword::check_policy`] first.

use platform::password::{ClearTextPassword, HashedPassword};
use std::fmt;

use crate::error::{AccountError, AccountResult};

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input, zeroized on drop
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    pub fn new(raw: String) -> Self {
        Self(ClearTextPassword::new(raw))
    }

    /// Check the password policy (length, upper, lower, digit)
    pub fn check_policy(&self) -> AccountResult<()> {
        self.0.check_policy().map_err(AccountError::PasswordPolicyViolation)
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Hashed user password in Argon2id PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash a raw password
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AccountResult<Self> {
        Ok(Self(raw.inner().hash(pepper)?))
    }

    /// Create from PHC string (from database)
    pub fn from_phc_string(phc_string: impl Into<String>) -> AccountResult<Self> {
        let hashed = HashedPassword::from_phc_string(phc_string)
            .map_err(|_| AccountError::Internal("Invalid password hash in database".to_string()))?;
        Ok(Self(hashed))
    }

    /// Get PHC string for database storage
    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Verify a raw password against this hash
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::PasswordPolicyError;

    #[test]
    fn test_policy_maps_to_account_error() {
        assert!(RawPassword::new("White_wolf123".to_string()).check_policy().is_ok());

        let result = RawPassword::new("white_wolf".to_string()).check_policy();
        assert!(matches!(
            result,
            Err(AccountError::PasswordPolicyViolation(
                PasswordPolicyError::MissingUppercase
            ))
        ));
    }

    #[test]
    fn test_hash_and_verify() {
        let raw = RawPassword::new("TestPassword123!".to_string());
        let hashed = UserPassword::from_raw(&raw, Some(b"pepper")).unwrap();

        assert!(hashed.verify(&raw, Some(b"pepper")));
        assert!(!hashed.verify(&raw, None));

        let wrong = RawPassword::new("WrongPassword123!".to_string());
        assert!(!hashed.verify(&wrong, Some(b"pepper")));
    }

    #[test]
    fn test_weak_password_can_still_be_hashed() {
        let raw = RawPassword::new("abc".to_string());
        let hashed = UserPassword::from_raw(&raw, None).unwrap();
        assert!(hashed.verify(&raw, None));
    }

    #[test]
    fn test_invalid_phc_string() {
        assert!(matches!(
            UserPassword::from_phc_string("plaintext"),
            Err(AccountError::Internal(_))
        ));
    }
}
