//! Chat sessions: one append-only history per `x-session-id`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use zonewatch_agent::{DispatchAgent, DispatchOutcome};
use zonewatch_core::history::ChatHistory;

pub const DEFAULT_SESSION_ID: &str = "default";

/// Maximum number of sessions kept before the least recently created is evicted.
const MAX_SESSIONS: usize = 1_000;

pub struct ChatSession {
    id: String,
    history: ChatHistory,
}

impl ChatSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: ChatHistory::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Run one chat turn. The user entry is recorded first; the answer or the
    /// error is recorded after the dispatcher returns.
    pub async fn ask(
        &mut self,
        dispatcher: &DispatchAgent,
        query: &str,
    ) -> zonewatch_core::Result<DispatchOutcome> {
        self.history.push_user(query);
        match dispatcher.run(query).await {
            Ok(outcome) => {
                self.history.push_agent(&outcome.answer);
                info!(session = %self.id, iterations = outcome.iterations, "Chat turn answered");
                Ok(outcome)
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "Chat turn failed");
                self.history.push_error(e.to_string());
                Err(e)
            }
        }
    }
}

/// Sessions by id. Each session has its own async mutex so turns within a
/// session run one at a time while different sessions run concurrently.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, (u64, Arc<tokio::sync::Mutex<ChatSession>>)>>,
    counter: std::sync::atomic::AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, id: &str) -> Arc<tokio::sync::Mutex<ChatSession>> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, session)) = sessions.get(id) {
            return session.clone();
        }

        if sessions.len() >= MAX_SESSIONS {
            if let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, (created, _))| *created)
                .map(|(k, _)| k.clone())
            {
                sessions.remove(&oldest);
            }
        }

        let seq = self.counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let session = Arc::new(tokio::sync::Mutex::new(ChatSession::new(id)));
        sessions.insert(id.to_string(), (seq, session.clone()));
        session
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_returns_same_session() {
        let store = SessionStore::new();
        let a = store.get_or_create("alice");
        let b = store.get_or_create("alice");
        assert!(Arc::ptr_eq(&a, &b));
        store.get_or_create("bob");
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn reset_clears_history() {
        let mut session = ChatSession::new("s1");
        session.history.push_user("hello");
        assert_eq!(session.history().len(), 1);
        session.reset();
        assert!(session.history().is_empty());
        assert_eq!(session.id(), "s1");
    }
}
