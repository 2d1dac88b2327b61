use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::turn::{ConversationState, Turn};
use crate::error::SessionError;
use crate::options::OptionSet;

/// Per-user state from login to logout
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque identifier carried in the session cookie
    pub id: String,

    /// Authenticated username
    pub identity: String,

    pub conversation: ConversationState,

    /// Choices currently offered to the patient, if any
    pub options: Option<OptionSet>,

    /// Synthesized reply files, removed when the session ends
    pub artifacts: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Storage for sessions behind a narrow interface.
///
/// Each call is atomic with respect to other calls on the same session.
/// Sessions idle past the store's timeout behave as if they were gone.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Start a session with an empty conversation
    async fn create(&self, identity: &str) -> Session;

    /// Snapshot of a session; refreshes its idle clock
    async fn load(&self, id: &str) -> Option<Session>;

    /// Append a turn; returns the new conversation length
    async fn append_turn(&self, id: &str, turn: Turn) -> Result<usize, SessionError>;

    /// Replace (never merge) the offered options
    async fn replace_options(&self, id: &str, options: Option<OptionSet>) -> Result<(), SessionError>;

    /// Remember a reply file written for this session
    async fn record_artifact(&self, id: &str, file_name: &str) -> Result<(), SessionError>;

    /// Destroy a session, returning its final state
    async fn clear(&self, id: &str) -> Result<Session, SessionError>;

    /// Remove every idle session, returning what was removed
    async fn expire_idle(&self) -> Vec<Session>;
}

/// Process-local session store
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    idle_timeout: Option<Duration>,
}

impl InMemorySessionStore {
    /// Store whose sessions never expire
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Sessions held, including idle ones not yet swept
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn is_idle(&self, session: &Session, now: DateTime<Utc>) -> bool {
        let Some(timeout) = self.idle_timeout else {
            return false;
        };

        (now - session.last_seen)
            .to_std()
            .is_ok_and(|idle| idle >= timeout)
    }

    /// Live session for `id` with its idle clock reset
    fn touch<'a>(
        &self,
        sessions: &'a mut HashMap<String, Session>,
        id: &str,
    ) -> Result<&'a mut Session, SessionError> {
        let now = Utc::now();
        match sessions.get_mut(id) {
            Some(session) if !self.is_idle(session, now) => {
                session.last_seen = now;
                Ok(session)
            }
            _ => Err(SessionError::NotFound(id.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, identity: &str) -> Session {
        let now = Utc::now();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            identity: identity.to_string(),
            conversation: ConversationState::new(),
            options: None,
            artifacts: Vec::new(),
            created_at: now,
            last_seen: now,
        };

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session.id.clone(), session.clone());
        }

        info!("Created session {} for {}", session.id, identity);

        session
    }

    async fn load(&self, id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        self.touch(&mut sessions, id).ok().map(|session| session.clone())
    }

    async fn append_turn(&self, id: &str, turn: Turn) -> Result<usize, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = self.touch(&mut sessions, id)?;

        debug!("Session {}: {:?} turn {:?}", id, turn.role, turn.content);
        session.conversation.append(turn);

        Ok(session.conversation.len())
    }

    async fn replace_options(&self, id: &str, options: Option<OptionSet>) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = self.touch(&mut sessions, id)?;

        session.options = options;

        Ok(())
    }

    async fn record_artifact(&self, id: &str, file_name: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = self.touch(&mut sessions, id)?;

        session.artifacts.push(file_name.to_string());

        Ok(())
    }

    async fn clear(&self, id: &str) -> Result<Session, SessionError> {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(id)
        };

        match removed {
            Some(session) => {
                info!(
                    "Cleared session {} for {} ({} turns)",
                    id,
                    session.identity,
                    session.conversation.len()
                );
                Ok(session)
            }
            None => Err(SessionError::NotFound(id.to_string())),
        }
    }

    async fn expire_idle(&self) -> Vec<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let idle: Vec<String> = sessions
            .values()
            .filter(|session| self.is_idle(session, now))
            .map(|session| session.id.clone())
            .collect();

        let expired: Vec<Session> = idle.iter().filter_map(|id| sessions.remove(id)).collect();

        for session in &expired {
            info!("Expired idle session {} for {}", session.id, session.identity);
        }

        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_starts_empty() {
        let store = InMemorySessionStore::new();
        let session = store.create("client1").await;

        let loaded = store.load(&session.id).await.unwrap();
        assert_eq!(loaded.identity, "client1");
        assert!(loaded.conversation.is_empty());
        assert!(loaded.options.is_none());
    }

    #[tokio::test]
    async fn test_append_and_replace() {
        let store = InMemorySessionStore::new();
        let session = store.create("client1").await;

        assert_eq!(store.append_turn(&session.id, Turn::doctor("Hi")).await, Ok(1));
        assert_eq!(store.append_turn(&session.id, Turn::patient("Yes")).await, Ok(2));

        store
            .replace_options(&session.id, Some(OptionSet::fallback()))
            .await
            .unwrap();
        assert_eq!(
            store.load(&session.id).await.unwrap().options,
            Some(OptionSet::fallback())
        );

        store.replace_options(&session.id, None).await.unwrap();
        assert!(store.load(&session.id).await.unwrap().options.is_none());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = InMemorySessionStore::new();
        assert_eq!(
            store.append_turn("missing", Turn::doctor("Hi")).await,
            Err(SessionError::NotFound("missing".to_string()))
        );
        assert!(store.clear("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_clear_removes_session() {
        let store = InMemorySessionStore::new();
        let session = store.create("client1").await;

        store.clear(&session.id).await.unwrap();
        assert!(store.load(&session.id).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_clear_returns_artifacts() {
        let store = InMemorySessionStore::new();
        let session = store.create("client1").await;

        store.record_artifact(&session.id, "reply-1-a.mp3").await.unwrap();
        store.record_artifact(&session.id, "reply-3-b.mp3").await.unwrap();

        let cleared = store.clear(&session.id).await.unwrap();
        assert_eq!(cleared.artifacts, vec!["reply-1-a.mp3", "reply-3-b.mp3"]);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = InMemorySessionStore::new().with_idle_timeout(Duration::ZERO);
        let session = store.create("client1").await;

        assert!(store.load(&session.id).await.is_none());
        assert!(store.append_turn(&session.id, Turn::doctor("Hi")).await.is_err());

        let expired = store.expire_idle().await;
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, session.id);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_access_keeps_session_alive() {
        let store = InMemorySessionStore::new().with_idle_timeout(Duration::from_secs(1));
        let session = store.create("client1").await;

        tokio::time::sleep(Duration::from_millis(600)).await;
        store.append_turn(&session.id, Turn::doctor("Hi")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(store.load(&session.id).await.is_some());
        assert!(store.expire_idle().await.is_empty());
    }

    #[tokio::test]
    async fn test_no_timeout_never_expires() {
        let store = InMemorySessionStore::new();
        store.create("client1").await;

        assert!(store.expire_idle().await.is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let store = InMemorySessionStore::new();
        let session = store.create("client1").await;

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            let id = session.id.clone();
            handles.push(tokio::spawn(async move {
                store.append_turn(&id, Turn::doctor(format!("q{}", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load(&session.id).await.unwrap().conversation.len(), 20);
    }
}
