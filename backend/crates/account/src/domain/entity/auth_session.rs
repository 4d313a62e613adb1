//! Auth Session Entity
//!
//! Server-side session referenced by the signed session cookie.
//! A session is either waiting for the second factor or fully authenticated.

use chrono::{DateTime, Duration, Utc};
use platform::client::ClientInfo;

use crate::domain::value_object::user_id::{SessionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    /// Password checked, TOTP code still required
    PendingSecondFactor,
    Authenticated,
}

impl SessionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingSecondFactor => "pending_second_factor",
            Self::Authenticated => "authenticated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending_second_factor" => Some(Self::PendingSecondFactor),
            "authenticated" => Some(Self::Authenticated),
            _ => None,
        }
    }
}

/// Auth session entity
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub stage: SessionStage,
    /// Session expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    /// Client IP (optional, for logging)
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    /// Create a new auth session
    ///
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn new(user_id: UserId, stage: SessionStage, client: &ClientInfo, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            session_id: SessionId::new(),
            user_id,
            stage,
            expires_at_ms: (now + ttl).timestamp_millis(),
            client_ip: client.ip_string(),
            user_agent: client.user_agent.clone(),
            created_at: now,
            last_activity_at: now,
        }
    }

    /// Check if session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    pub fn is_authenticated(&self) -> bool {
        self.stage == SessionStage::Authenticated
    }

    /// Update last activity timestamp
    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let client = ClientInfo {
            ip: Some("10.0.0.1".parse().unwrap()),
            user_agent: Some("curl/8.0".to_string()),
        };
        let session = AuthSession::new(
            UserId::new(),
            SessionStage::PendingSecondFactor,
            &client,
            Duration::hours(1),
        );

        assert!(!session.is_expired());
        assert!(!session.is_authenticated());
        assert_eq!(session.client_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(session.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn test_expired_session() {
        let session = AuthSession::new(
            UserId::new(),
            SessionStage::Authenticated,
            &ClientInfo::default(),
            Duration::seconds(-1),
        );
        assert!(session.is_expired());
    }

    #[test]
    fn test_stage_round_trip() {
        for stage in [SessionStage::PendingSecondFactor, SessionStage::Authenticated] {
            assert_eq!(SessionStage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(SessionStage::parse("admin"), None);
    }
}
