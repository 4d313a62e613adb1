//! TOTP Secret Value Object
//!
//! Wraps a TOTP secret for two-factor authentication.
//! Google Authenticator compatible: SHA1, 6 digits, 30 second step, one step of skew.

use platform::crypto::SecretBox;
use std::fmt;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{AccountError, AccountResult};

/// TOTP configuration constants
const TOTP_DIGITS: usize = 6;
const TOTP_SKEW: u8 = 1;
const TOTP_STEP: u64 = 30;

/// TOTP Secret for two-factor authentication
#[derive(Clone)]
pub struct TotpSecret {
    /// Base32-encoded secret
    secret_base32: String,
    bytes: Vec<u8>,
}

impl TotpSecret {
    /// Generate a new random TOTP secret
    pub fn generate() -> Self {
        let secret = Secret::generate_secret();
        let secret_base32 = secret.to_encoded().to_string();
        Self {
            bytes: secret.to_bytes().unwrap_or_default(),
            secret_base32,
        }
    }

    /// Parse a base32-encoded secret (spaces and lowercase are tolerated)
    pub fn from_base32(secret: &str) -> AccountResult<Self> {
        let secret_base32: String = secret
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        let bytes = Secret::Encoded(secret_base32.clone())
            .to_bytes()
            .map_err(|e| AccountError::Internal(format!("Invalid TOTP secret: {e}")))?;
        if bytes.is_empty() {
            return Err(AccountError::Internal("Empty TOTP secret".to_string()));
        }

        Ok(Self {
            secret_base32,
            bytes,
        })
    }

    /// Get the base32-encoded secret
    pub fn as_base32(&self) -> &str {
        &self.secret_base32
    }

    fn to_totp(&self, issuer: &str, account_name: &str) -> TOTP {
        // Secrets chosen by clients may be shorter than 128 bits
        TOTP::new_unchecked(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            self.bytes.clone(),
            Some(issuer.to_string()),
            account_name.to_string(),
        )
    }

    /// Verify a TOTP code against the current time window
    pub fn verify(&self, code: &str, issuer: &str, account_name: &str) -> bool {
        self.to_totp(issuer, account_name)
            .check_current(code.trim())
            .unwrap_or(false)
    }

    /// Generate current TOTP code (for testing)
    #[cfg(test)]
    pub fn generate_current(&self) -> String {
        self.to_totp("test", "test")
            .generate_current()
            .unwrap_or_default()
    }

    /// Generate the code for a Unix timestamp (for testing)
    #[cfg(test)]
    pub fn generate_at(&self, unix_secs: u64) -> String {
        self.to_totp("test", "test").generate(unix_secs)
    }

    /// Generate QR code as base64-encoded PNG
    pub fn qr_code(&self, issuer: &str, account_name: &str) -> AccountResult<String> {
        self.to_totp(issuer, account_name)
            .get_qr_base64()
            .map_err(|e| AccountError::Internal(format!("Failed to generate QR code: {e}")))
    }

    /// Get the otpauth:// URL for manual entry
    pub fn otpauth_url(&self, issuer: &str, account_name: &str) -> String {
        self.to_totp(issuer, account_name).get_url()
    }

    /// Encrypt for storage
    pub fn seal(&self, cipher: &SecretBox) -> AccountResult<EncryptedTotpSecret> {
        Ok(EncryptedTotpSecret(cipher.encrypt(self.secret_base32.as_bytes())?))
    }
}

impl fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotpSecret")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// TOTP secret as stored: `base64(nonce || AES-256-GCM ciphertext)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedTotpSecret(String);

impl EncryptedTotpSecret {
    /// Create from database value
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decrypt into a usable secret
    pub fn open(&self, cipher: &SecretBox) -> AccountResult<TotpSecret> {
        let plaintext = cipher.decrypt(&self.0)?;
        let base32 = String::from_utf8(plaintext)
            .map_err(|_| AccountError::Internal("TOTP secret is not UTF-8".to_string()))?;
        TotpSecret::from_base32(&base32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::crypto::random_key;

    #[test]
    fn test_totp_secret_generate() {
        let secret = TotpSecret::generate();
        assert!(!secret.as_base32().is_empty());
        assert!(TotpSecret::from_base32(secret.as_base32()).is_ok());
    }

    #[test]
    fn test_totp_secret_verify() {
        let secret = TotpSecret::generate();

        let code = secret.generate_current();
        assert_eq!(code.len(), 6);
        assert!(secret.verify(&code, "MySolidApp", "test@example.com"));

        // Wrong code should fail
        let wrong = if code == "000000" { "111111" } else { "000000" };
        assert!(!secret.verify(wrong, "MySolidApp", "test@example.com"));
    }

    #[test]
    fn test_from_base32_normalizes_input() {
        let secret = TotpSecret::from_base32("jbsw y3dp ehpk 3pxp").unwrap();
        assert_eq!(secret.as_base32(), "JBSWY3DPEHPK3PXP");
        assert!(TotpSecret::from_base32("not base32 !!").is_err());
        assert!(TotpSecret::from_base32("").is_err());
    }

    #[test]
    fn test_provisioning() {
        let secret = TotpSecret::from_base32("JBSWY3DPEHPK3PXP").unwrap();
        let url = secret.otpauth_url("MySolidApp", "alice@example.com");
        assert!(url.starts_with("otpauth://totp/"));
        assert!(url.contains("secret=JBSWY3DPEHPK3PXP"));
        assert!(url.contains("issuer=MySolidApp"));

        let qr = secret.qr_code("MySolidApp", "alice@example.com").unwrap();
        assert!(!qr.is_empty());
    }

    #[test]
    fn test_seal_and_open() {
        let cipher = SecretBox::new(random_key());
        let secret = TotpSecret::generate();

        let sealed = secret.seal(&cipher).unwrap();
        assert!(!sealed.as_str().contains(secret.as_base32()));

        let opened = sealed.open(&cipher).unwrap();
        assert_eq!(opened.as_base32(), secret.as_base32());

        let other = SecretBox::new(random_key());
        assert!(sealed.open(&other).is_err());
    }
}
