//! Cryptographic Utilities

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit},
};
use base64::{Engine, engine::general_purpose};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroize;

/// AES-GCM nonce length in bytes (96 bits)
const NONCE_LENGTH: usize = 12;

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate a random 32-byte key
pub fn random_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 to bytes
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

/// Encode bytes as URL-safe base64 without padding
pub fn to_base64_url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a base64-encoded 32-byte key (from environment configuration)
pub fn key_from_base64(s: &str) -> Result<[u8; 32], CipherError> {
    let mut bytes = from_base64(s.trim()).map_err(|_| CipherError::InvalidKey)?;
    let key: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CipherError::InvalidKey)?;
    bytes.zeroize();
    Ok(key)
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

// ============================================================================
// Secret Box (AES-256-GCM)
// ============================================================================

/// Symmetric encryption errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    #[error("Encryption key must be 32 bytes of base64")]
    InvalidKey,

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Invalid encrypted data encoding")]
    InvalidEncoding,

    #[error("Decryption failed")]
    DecryptionFailed,
}

/// Authenticated symmetric encryption for secrets at rest
///
/// Output format: `base64(nonce || ciphertext)` with a fresh random nonce per call.
#[derive(Clone)]
pub struct SecretBox {
    key: [u8; 32],
}

impl SecretBox {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Encrypt and encode as base64
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(to_base64(&combined))
    }

    /// Decode and decrypt a value produced by [`SecretBox::encrypt`]
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>, CipherError> {
        let combined = from_base64(encoded).map_err(|_| CipherError::InvalidEncoding)?;

        if combined.len() < NONCE_LENGTH {
            return Err(CipherError::InvalidEncoding);
        }

        let (nonce, ciphertext) = combined.split_at(NONCE_LENGTH);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));

        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::DecryptionFailed)
    }
}

impl Drop for SecretBox {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for SecretBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBox")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_values() {
        // SHA-256 of empty string
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);

        // SHA-256 of "hello"
        let hash = sha256(b"hello");
        let expected =
            hex::decode("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        // Should not be all zeros (statistically)
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_base64_url_has_no_padding_or_plus() {
        let encoded = to_base64_url(&[0xfb, 0xff, 0xfe, 0x01]);
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn test_key_from_base64() {
        let key = random_key();
        assert_eq!(key_from_base64(&to_base64(&key)).unwrap(), key);

        assert_eq!(
            key_from_base64(&to_base64(&[1u8; 16])),
            Err(CipherError::InvalidKey)
        );
        assert_eq!(key_from_base64("%%%"), Err(CipherError::InvalidKey));
    }

    #[test]
    fn test_constant_time_eq() {
        let a = [1u8, 2, 3, 4];
        let b = [1u8, 2, 3, 4];
        let c = [1u8, 2, 3, 5];
        assert!(constant_time_eq(&a, &b));
        assert!(!constant_time_eq(&a, &c));
        assert!(!constant_time_eq(&a, &c[..3]));
    }

    #[test]
    fn test_secret_box_nonce_is_fresh() {
        let secret_box = SecretBox::new(random_key());

        let first = secret_box.encrypt(b"JBSWY3DPEHPK3PXP").unwrap();
        let second = secret_box.encrypt(b"JBSWY3DPEHPK3PXP").unwrap();
        assert_ne!(first, second);

        assert_eq!(secret_box.decrypt(&first).unwrap(), b"JBSWY3DPEHPK3PXP");
        assert_eq!(secret_box.decrypt(&second).unwrap(), b"JBSWY3DPEHPK3PXP");
    }

    #[test]
    fn test_secret_box_wrong_key() {
        let encrypted = SecretBox::new(random_key()).encrypt(b"secret").unwrap();
        let other = SecretBox::new(random_key());
        assert_eq!(
            other.decrypt(&encrypted),
            Err(CipherError::DecryptionFailed)
        );
    }

    #[test]
    fn test_secret_box_tampered_input() {
        let secret_box = SecretBox::new(random_key());
        assert_eq!(
            secret_box.decrypt("not base64!"),
            Err(CipherError::InvalidEncoding)
        );
        assert_eq!(
            secret_box.decrypt(&to_base64(&[0u8; 4])),
            Err(CipherError::InvalidEncoding)
        );
    }

    #[test]
    fn test_secret_box_debug_redacted() {
        let debug = format!("{:?}", SecretBox::new([7u8; 32]));
        assert!(debug.contains("REDACTED"));
    }
}
