//! Emailed Tokens
//!
//! Reset and verification tokens are random, sent to the user once, and only
//! their SHA-256 digest is stored. Lookups compare digests in constant time;
//! the password hasher is not involved.

use std::fmt;

use platform::crypto::{constant_time_eq, random_bytes, sha256, to_base64_url};

use crate::error::{AccountError, AccountResult};

/// Raw token entropy in bytes
const TOKEN_BYTES: usize = 32;

/// Raw token as sent in the email link
pub struct SecretToken(String);

impl SecretToken {
    pub fn generate() -> Self {
        Self(to_base64_url(&random_bytes(TOKEN_BYTES)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn hash(&self) -> TokenHash {
        TokenHash::of(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretToken").field(&"[REDACTED]").finish()
    }
}

/// SHA-256 digest of a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHash([u8; 32]);

impl TokenHash {
    pub fn of(raw: &str) -> Self {
        Self(sha256(raw.as_bytes()))
    }

    /// Create from database value
    pub fn from_bytes(bytes: &[u8]) -> AccountResult<Self> {
        let digest: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AccountError::Internal("Invalid token hash in database".to_string()))?;
        Ok(Self(digest))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether `raw` is the token this digest was made from
    pub fn matches(&self, raw: &str) -> bool {
        constant_time_eq(&self.0, &sha256(raw.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_url_safe_and_unique() {
        let a = SecretToken::generate();
        let b = SecretToken::generate();
        assert_ne!(a.as_str(), b.as_str());
        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(a.as_str().len(), 43);
        assert!(
            a.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_stored_digest_is_sha256_of_token() {
        let token = SecretToken::generate();
        let hash = token.hash();

        assert_eq!(hash.as_bytes(), &sha256(token.as_str().as_bytes()));
        assert_ne!(hash.as_bytes(), token.as_str().as_bytes());
        assert!(hash.matches(token.as_str()));
        assert!(!hash.matches("something-else"));
    }

    #[test]
    fn test_from_bytes_checks_length() {
        let hash = TokenHash::of("abc");
        assert_eq!(TokenHash::from_bytes(hash.as_bytes()).unwrap(), hash);
        assert!(TokenHash::from_bytes(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_debug_hides_raw_token() {
        let token = SecretToken::generate();
        assert!(!format!("{:?}", token).contains(token.as_str()));
    }
}
