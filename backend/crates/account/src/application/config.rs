//! Application Configuration
//!
//! Configuration for the Account application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::crypto::{SecretBox, random_key};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Account application configuration
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Session lifetime, also used as the cookie Max-Age
    pub session_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// How long a password reset token stays usable
    pub password_reset_token_ttl: Duration,
    /// Issuer shown by authenticator apps
    pub totp_issuer: String,
    /// AES-256-GCM key for TOTP secrets at rest
    pub totp_encryption_key: [u8; 32],
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "session".to_string(),
            session_secret: [0u8; 32],
            session_ttl: Duration::from_secs(7 * 24 * 3600), // 1 week
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            password_reset_token_ttl: Duration::from_secs(2 * 3600), // 2 hours
            totp_issuer: "MySolidApp".to_string(),
            totp_encryption_key: [0u8; 32],
        }
    }
}

impl AccountConfig {
    /// Create config with random secrets (for development)
    pub fn with_random_secrets() -> Self {
        Self {
            session_secret: random_key(),
            totp_encryption_key: random_key(),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secrets()
        }
    }

    /// Get session TTL in milliseconds
    pub fn session_ttl_ms(&self) -> i64 {
        self.session_ttl.as_millis() as i64
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Reset token lifetime as a chrono duration
    pub fn reset_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.password_reset_token_ttl).unwrap_or(chrono::Duration::MAX)
    }

    /// Cipher for TOTP secrets at rest
    pub fn totp_cipher(&self) -> SecretBox {
        SecretBox::new(self.totp_encryption_key)
    }

    /// Attributes of the session cookie
    pub fn cookie_config(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.session_ttl.as_secs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AccountConfig::default();
        assert_eq!(config.password_reset_token_ttl, Duration::from_secs(7200));
        assert_eq!(config.totp_issuer, "MySolidApp");
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_development_uses_random_secrets() {
        let a = AccountConfig::development();
        let b = AccountConfig::development();
        assert!(!a.cookie_secure);
        assert_ne!(a.session_secret, b.session_secret);
        assert_ne!(a.totp_encryption_key, [0u8; 32]);
    }

    #[test]
    fn test_cookie_config() {
        let config = AccountConfig::development();
        let cookie = config.cookie_config().build_set_cookie("abc");
        assert!(cookie.starts_with("session=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));
    }
}
