//! Session Token
//!
//! Cookie value format: `<session_id>.<base64url(HMAC-SHA256(session_id))>`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::value_object::user_id::SessionId;
use crate::error::{AccountError, AccountResult};

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &[u8; 32], session_id: &str) -> AccountResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AccountError::Internal(format!("Session HMAC key: {e}")))?;
    mac.update(session_id.as_bytes());
    Ok(mac)
}

/// Generate signed session token
pub fn sign(secret: &[u8; 32], session_id: &SessionId) -> AccountResult<String> {
    let session_id = session_id.to_string();
    let signature = mac(secret, &session_id)?.finalize().into_bytes();
    Ok(format!("{}.{}", session_id, URL_SAFE_NO_PAD.encode(signature)))
}

/// Parse and verify session token
pub fn verify(secret: &[u8; 32], token: &str) -> Option<SessionId> {
    let (session_id, signature_b64) = token.split_once('.')?;
    let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

    mac(secret, session_id).ok()?.verify_slice(&signature).ok()?;
    session_id.parse().ok()
}
