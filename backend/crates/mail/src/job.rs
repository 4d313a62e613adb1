//! Email Jobs
//!
//! A job carries the raw token that ends up in the link. It only lives in the
//! queue until the worker consumes it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MailError;

/// Kind of email, stored in its own column next to the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    EmailVerification,
    PasswordReset,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
        }
    }

    pub fn parse(s: &str) -> Result<Self, MailError> {
        match s {
            "email_verification" => Ok(Self::EmailVerification),
            "password_reset" => Ok(Self::PasswordReset),
            other => Err(MailError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmailJob {
    EmailVerification {
        receiver: String,
        verification_token: String,
    },
    PasswordReset {
        receiver: String,
        reset_token: String,
    },
}

impl EmailJob {
    pub fn email_verification(receiver: impl Into<String>, token: impl Into<String>) -> Self {
        Self::EmailVerification {
            receiver: receiver.into(),
            verification_token: token.into(),
        }
    }

    pub fn password_reset(receiver: impl Into<String>, token: impl Into<String>) -> Self {
        Self::PasswordReset {
            receiver: receiver.into(),
            reset_token: token.into(),
        }
    }

    pub fn kind(&self) -> EmailKind {
        match self {
            Self::EmailVerification { .. } => EmailKind::EmailVerification,
            Self::PasswordReset { .. } => EmailKind::PasswordReset,
        }
    }

    pub fn receiver(&self) -> &str {
        match self {
            Self::EmailVerification { receiver, .. } | Self::PasswordReset { receiver, .. } => {
                receiver
            }
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Self::EmailVerification {
                verification_token, ..
            } => verification_token,
            Self::PasswordReset { reset_token, .. } => reset_token,
        }
    }

    pub fn to_payload(&self) -> Result<String, MailError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a stored payload, checking it against the kind column
    pub fn from_stored(kind: &str, payload: &str) -> Result<Self, MailError> {
        let expected = EmailKind::parse(kind)?;
        let job: Self = serde_json::from_str(payload)?;
        if job.kind() != expected {
            return Err(MailError::UnknownKind(format!(
                "{kind} (payload says {})",
                job.kind()
            )));
        }
        Ok(job)
    }
}

impl fmt::Debug for EmailJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailJob")
            .field("kind", &self.kind())
            .field("receiver", &self.receiver())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_tagged_by_kind() {
        let job = EmailJob::password_reset("someone@example.com", "tok");
        let payload: serde_json::Value =
            serde_json::from_str(&job.to_payload().unwrap()).unwrap();

        assert_eq!(payload["kind"], "password_reset");
        assert_eq!(payload["receiver"], "someone@example.com");
        assert_eq!(payload["reset_token"], "tok");
    }

    #[test]
    fn test_from_stored_rejects_mismatched_kind() {
        let payload = EmailJob::email_verification("a@example.com", "tok")
            .to_payload()
            .unwrap();

        assert!(EmailJob::from_stored("email_verification", &payload).is_ok());
        assert!(matches!(
            EmailJob::from_stored("password_reset", &payload),
            Err(MailError::UnknownKind(_))
        ));
        assert!(matches!(
            EmailJob::from_stored("newsletter", &payload),
            Err(MailError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let job = EmailJob::email_verification("a@example.com", "very-secret-token");
        let debug = format!("{:?}", job);
        assert!(debug.contains("a@example.com"));
        assert!(!debug.contains("very-secret-token"));
    }
}
