//! In-Memory Stores
//!
//! Process-local implementations of the repository and queue traits, used by
//! the HTTP tests and handy for local experiments without PostgreSQL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use mail::EmailJob;

use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthSessionRepository, EmailQueue, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_id::{SessionId, UserId},
};
use crate::error::{AccountError, AccountResult};

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    sessions: HashMap<SessionId, AuthSession>,
}

/// In-memory users and sessions with the same semantics as the Postgres store
#[derive(Clone, Default)]
pub struct InMemoryAccountStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AccountResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AccountError::Internal("In-memory store poisoned".to_string()))
    }

    pub fn user_count(&self) -> usize {
        self.lock().map(|s| s.users.len()).unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.lock().map(|s| s.sessions.len()).unwrap_or_default()
    }

    /// Snapshot of a user, looked up by exact email
    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let state = self.lock().ok()?;
        state.users.values().find(|u| u.email.as_str() == email).cloned()
    }

    /// Mutate a stored user in place; returns `false` if there is no such user
    pub fn edit_user(&self, email: &str, edit: impl FnOnce(&mut User)) -> bool {
        let Ok(mut state) = self.lock() else {
            return false;
        };
        match state.users.values_mut().find(|u| u.email.as_str() == email) {
            Some(user) => {
                edit(user);
                true
            }
            None => false,
        }
    }

    fn sorted_users(state: &MemoryState) -> Vec<User> {
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.as_uuid().cmp(b.user_id.as_uuid()))
        });
        users
    }
}

impl UserRepository for InMemoryAccountStore {
    async fn create(&self, user: &User) -> AccountResult<()> {
        let mut state = self.lock()?;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(AccountError::EmailAlreadyExists);
        }
        state.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AccountResult<Option<User>> {
        Ok(self.lock()?.users.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AccountResult<bool> {
        Ok(self.lock()?.users.values().any(|u| &u.email == email))
    }

    async fn update(&self, user: &User) -> AccountResult<()> {
        let mut state = self.lock()?;
        if state
            .users
            .values()
            .any(|u| u.email == user.email && u.user_id != user.user_id)
        {
            return Err(AccountError::EmailAlreadyExists);
        }
        if let Some(stored) = state.users.get_mut(&user.user_id) {
            *stored = user.clone();
        }
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> AccountResult<bool> {
        let mut state = self.lock()?;
        let removed = state.users.remove(user_id).is_some();
        // ON DELETE CASCADE
        state.sessions.retain(|_, s| &s.user_id != user_id);
        Ok(removed)
    }

    async fn count(&self) -> AccountResult<u64> {
        Ok(self.lock()?.users.len() as u64)
    }

    async fn list_all(&self) -> AccountResult<Vec<User>> {
        Ok(Self::sorted_users(&*self.lock()?))
    }

    async fn list_page(&self, offset: u64, limit: u64) -> AccountResult<Vec<User>> {
        let users = Self::sorted_users(&*self.lock()?);
        Ok(users
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }
}

impl AuthSessionRepository for InMemoryAccountStore {
    async fn create(&self, session: &AuthSession) -> AccountResult<()> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&session.user_id) {
            return Err(AccountError::Internal(
                "Session references a missing user".to_string(),
            ));
        }
        state.sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_by_id(&self, session_id: &SessionId) -> AccountResult<Option<AuthSession>> {
        Ok(self
            .lock()?
            .sessions
            .get(session_id)
            .filter(|s| !s.is_expired())
            .cloned())
    }

    async fn update(&self, session: &AuthSession) -> AccountResult<()> {
        let mut state = self.lock()?;
        if let Some(stored) = state.sessions.get_mut(&session.session_id) {
            *stored = session.clone();
        }
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> AccountResult<()> {
        self.lock()?.sessions.remove(session_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> AccountResult<u64> {
        let now_ms = Utc::now().timestamp_millis();
        let mut state = self.lock()?;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.expires_at_ms >= now_ms);
        Ok((before - state.sessions.len()) as u64)
    }
}

/// Email queue that keeps jobs in memory instead of sending them
#[derive(Clone, Default)]
pub struct RecordingEmailQueue {
    jobs: Arc<Mutex<Vec<EmailJob>>>,
    failing: bool,
}

impl RecordingEmailQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue whose every enqueue fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn jobs(&self) -> Vec<EmailJob> {
        self.jobs.lock().map(|j| j.clone()).unwrap_or_default()
    }

    pub fn last_job(&self) -> Option<EmailJob> {
        self.jobs().pop()
    }
}

impl EmailQueue for RecordingEmailQueue {
    async fn enqueue(&self, job: EmailJob) -> AccountResult<()> {
        if self.failing {
            return Err(AccountError::Internal("Email queue unavailable".to_string()));
        }
        self.jobs
            .lock()
            .map_err(|_| AccountError::Internal("Email queue poisoned".to_string()))?
            .push(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::auth_session::SessionStage;
    use crate::domain::value_object::user_password::{RawPassword, UserPassword};
    use chrono::Duration;
    use platform::client::ClientInfo;

    fn user(email: &str) -> User {
        let password =
            UserPassword::from_raw(&RawPassword::new("White_wolf123".into()), None).unwrap();
        User::new(Email::new(email).unwrap(), password, false)
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryAccountStore::new();
        UserRepository::create(&store, &user("a@example.com")).await.unwrap();

        let result = UserRepository::create(&store, &user("a@example.com")).await;
        assert!(matches!(result, Err(AccountError::EmailAlreadyExists)));

        // Case differs, so this is another account
        UserRepository::create(&store, &user("A@example.com")).await.unwrap();
        assert_eq!(store.user_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_sessions() {
        let store = InMemoryAccountStore::new();
        let alice = user("alice@example.com");
        UserRepository::create(&store, &alice).await.unwrap();

        let session = AuthSession::new(
            alice.user_id,
            SessionStage::Authenticated,
            &ClientInfo::default(),
            Duration::hours(1),
        );
        AuthSessionRepository::create(&store, &session).await.unwrap();
        assert_eq!(store.session_count(), 1);

        assert!(UserRepository::delete(&store, &alice.user_id).await.unwrap());
        assert_eq!(store.session_count(), 0);
        assert!(!UserRepository::delete(&store, &alice.user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_invisible_and_cleaned() {
        let store = InMemoryAccountStore::new();
        let alice = user("alice@example.com");
        UserRepository::create(&store, &alice).await.unwrap();

        let expired = AuthSession::new(
            alice.user_id,
            SessionStage::Authenticated,
            &ClientInfo::default(),
            Duration::seconds(-5),
        );
        AuthSessionRepository::create(&store, &expired).await.unwrap();

        assert!(
            AuthSessionRepository::find_by_id(&store, &expired.session_id)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(
            AuthSessionRepository::cleanup_expired(&store).await.unwrap(),
            1
        );
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test]
    async fn test_list_page_is_ordered_by_creation() {
        let store = InMemoryAccountStore::new();
        let base = Utc::now();
        for i in 0..5 {
            let mut u = user(&format!("u{i}@example.com"));
            u.created_at = base + Duration::seconds(i);
            UserRepository::create(&store, &u).await.unwrap();
        }

        let page = store.list_page(2, 2).await.unwrap();
        let emails: Vec<&str> = page.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["u2@example.com", "u3@example.com"]);
        assert!(store.list_page(10, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recording_queue() {
        let queue = RecordingEmailQueue::new();
        queue
            .enqueue(EmailJob::email_verification("a@example.com", "t"))
            .await
            .unwrap();
        assert_eq!(queue.jobs().len(), 1);

        let failing = RecordingEmailQueue::failing();
        assert!(
            failing
                .enqueue(EmailJob::email_verification("a@example.com", "t"))
                .await
                .is_err()
        );
    }
}
