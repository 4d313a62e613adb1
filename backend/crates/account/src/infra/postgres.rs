//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    auth_session::{AuthSession, SessionStage},
    user::{PasswordReset, User},
};
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    secret_token::TokenHash,
    totp_secret::EncryptedTotpSecret,
    user_id::{SessionId, UserId},
    user_password::UserPassword,
};
use crate::error::{AccountError, AccountResult};

const USER_COLUMNS: &str = r#"
    user_id,
    email,
    password_hash,
    is_admin,
    is_verified,
    reset_token_hash,
    reset_token_issued_at,
    verification_token_hash,
    totp_secret_encrypted,
    created_at,
    updated_at
"#;

const SESSION_COLUMNS: &str = r#"
    session_id,
    user_id,
    stage,
    expires_at_ms,
    client_ip,
    user_agent,
    created_at,
    last_activity_at
"#;

/// PostgreSQL-backed account repository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired(&self) -> AccountResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAccountRepository {
    async fn create(&self, user: &User) -> AccountResult<()> {
        let (reset_hash, reset_issued_at) = split_reset(user);

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                password_hash,
                is_admin,
                is_verified,
                reset_token_hash,
                reset_token_issued_at,
                verification_token_hash,
                totp_secret_encrypted,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.password.as_phc_string())
        .bind(user.is_admin)
        .bind(user.is_verified)
        .bind(reset_hash)
        .bind(reset_issued_at)
        .bind(user.email_verification.as_ref().map(TokenHash::as_bytes))
        .bind(user.two_factor.as_ref().map(EncryptedTotpSecret::as_str))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AccountError::EmailAlreadyExists
            } else {
                AccountError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AccountResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AccountResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update(&self, user: &User) -> AccountResult<()> {
        let (reset_hash, reset_issued_at) = split_reset(user);

        sqlx::query(
            r#"
            UPDATE users SET
                password_hash = $2,
                is_admin = $3,
                is_verified = $4,
                reset_token_hash = $5,
                reset_token_issued_at = $6,
                verification_token_hash = $7,
                totp_secret_encrypted = $8,
                updated_at = $9,
                email = $10
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.password.as_phc_string())
        .bind(user.is_admin)
        .bind(user.is_verified)
        .bind(reset_hash)
        .bind(reset_issued_at)
        .bind(user.email_verification.as_ref().map(TokenHash::as_bytes))
        .bind(user.two_factor.as_ref().map(EncryptedTotpSecret::as_str))
        .bind(user.updated_at)
        .bind(user.email.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AccountError::EmailAlreadyExists
            } else {
                AccountError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> AccountResult<bool> {
        let deleted = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn count(&self) -> AccountResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    async fn list_all(&self) -> AccountResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, user_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_user()).collect()
    }

    async fn list_page(&self, offset: u64, limit: u64) -> AccountResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, user_id OFFSET $1 LIMIT $2"
        ))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_user()).collect()
    }
}

fn split_reset(user: &User) -> (Option<&[u8]>, Option<DateTime<Utc>>) {
    match &user.password_reset {
        Some(reset) => (Some(reset.token_hash.as_bytes()), Some(reset.issued_at)),
        None => (None, None),
    }
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for PgAccountRepository {
    async fn create(&self, session: &AuthSession) -> AccountResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_id,
                stage,
                expires_at_ms,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(session.stage.as_str())
        .bind(session.expires_at_ms)
        .bind(&session.client_ip)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, session_id: &SessionId) -> AccountResult<Option<AuthSession>> {
        let now_ms = Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, AuthSessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM auth_sessions WHERE session_id = $1 AND expires_at_ms > $2"
        ))
        .bind(session_id.as_uuid())
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_session()).transpose()
    }

    async fn update(&self, session: &AuthSession) -> AccountResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                expires_at_ms = $2,
                last_activity_at = $3
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.expires_at_ms)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> AccountResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> AccountResult<u64> {
        PgAccountRepository::cleanup_expired(self).await
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    password_hash: String,
    is_admin: bool,
    is_verified: bool,
    reset_token_hash: Option<Vec<u8>>,
    reset_token_issued_at: Option<DateTime<Utc>>,
    verification_token_hash: Option<Vec<u8>>,
    totp_secret_encrypted: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AccountResult<User> {
        let password_reset = match (self.reset_token_hash, self.reset_token_issued_at) {
            (Some(hash), Some(issued_at)) => Some(PasswordReset {
                token_hash: TokenHash::from_bytes(&hash)?,
                issued_at,
            }),
            (None, None) => None,
            _ => {
                return Err(AccountError::Internal(format!(
                    "User {} has a partial password reset",
                    self.user_id
                )));
            }
        };

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            password: UserPassword::from_phc_string(self.password_hash)?,
            is_admin: self.is_admin,
            is_verified: self.is_verified,
            password_reset,
            email_verification: self
                .verification_token_hash
                .as_deref()
                .map(TokenHash::from_bytes)
                .transpose()?,
            two_factor: self.totp_secret_encrypted.map(EncryptedTotpSecret::from_db),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    user_id: Uuid,
    stage: String,
    expires_at_ms: i64,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AccountResult<AuthSession> {
        let stage = SessionStage::parse(&self.stage).ok_or_else(|| {
            AccountError::Internal(format!("Unknown session stage: {}", self.stage))
        })?;

        Ok(AuthSession {
            session_id: SessionId::from_uuid(self.session_id),
            user_id: UserId::from_uuid(self.user_id),
            stage,
            expires_at_ms: self.expires_at_ms,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        })
    }
}
