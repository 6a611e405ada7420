//! # Session Store
//!
//! Sessions keyed by conversation id. Each conversation has its own async
//! mutex, held for the whole handling of an event (provider calls included),
//! so events from one chat are applied strictly one at a time while other
//! chats proceed independently.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::dialogue::Session;

/// Identity of a conversation (the Telegram chat id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<teloxide::types::ChatId> for ConversationId {
    fn from(chat_id: teloxide::types::ChatId) -> Self {
        ConversationId(chat_id.0)
    }
}

#[derive(Debug)]
struct SessionSlot {
    session: Session,
    last_active: DateTime<Utc>,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            session: Session::new(),
            last_active: Utc::now(),
        }
    }
}

type SharedSlot = Arc<AsyncMutex<SessionSlot>>;

/// In-memory per-conversation session storage.
#[derive(Debug, Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<ConversationId, SharedSlot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: ConversationId) -> SharedSlot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            slots
                .entry(id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(SessionSlot::new()))),
        )
    }

    /// Wait for exclusive access to a conversation's session, creating it on
    /// first contact.
    pub async fn lock(&self, id: ConversationId) -> SessionGuard {
        let guard = self.slot(id).lock_owned().await;
        SessionGuard { id, guard }
    }

    /// Copy of the stored session, if the conversation is known.
    pub async fn snapshot(&self, id: ConversationId) -> Option<Session> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.get(&id).cloned()
        }?;
        let guard = slot.lock().await;
        Some(guard.session.clone())
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions idle for longer than `max_idle`. Sessions currently in use
    /// or awaited are kept. Returns the number evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();

        slots.retain(|id, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(inner) if inner.last_active < cutoff => {
                    debug!(conversation = %id, "Evicting idle session");
                    false
                }
                _ => true,
            }
        });

        before - slots.len()
    }
}

/// Periodically evict idle sessions for the lifetime of the process.
pub fn spawn_sweeper(store: Arc<SessionStore>, config: SessionConfig) -> JoinHandle<()> {
    let max_idle = Duration::minutes(config.idle_ttl_minutes);
    let period = std::time::Duration::from_secs(config.sweep_interval_secs.max(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let evicted = store.evict_idle(max_idle);
            if evicted > 0 {
                info!(evicted, remaining = store.len(), "Evicted idle sessions");
            }
        }
    })
}

/// Exclusive access to one conversation's session.
pub struct SessionGuard {
    id: ConversationId,
    guard: OwnedMutexGuard<SessionSlot>,
}

impl SessionGuard {
    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn session(&self) -> &Session {
        &self.guard.session
    }

    /// Working copy for a handler. Only [`commit`](Self::commit) makes it stick.
    pub fn draft(&self) -> Session {
        self.guard.session.clone()
    }

    /// Store `draft` if it was taken from the current revision.
    ///
    /// A draft built on an older revision is a stale completion and is dropped.
    pub fn commit(&mut self, mut draft: Session) -> bool {
        self.guard.last_active = Utc::now();
        if draft.revision != self.guard.session.revision {
            warn!(
                conversation = %self.id,
                draft_revision = draft.revision,
                current_revision = self.guard.session.revision,
                "Discarding stale session update"
            );
            return false;
        }
        draft.revision += 1;
        self.guard.session = draft;
        true
    }

    /// Mark the conversation as active without changing it.
    pub fn touch(&mut self) {
        self.guard.last_active = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::ChatState;

    #[tokio::test]
    async fn test_first_contact_creates_session() {
        let store = SessionStore::new();
        let guard = store.lock(ConversationId(1)).await;
        assert_eq!(guard.session().state, ChatState::Init);
        drop(guard);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_bumps_revision() {
        let store = SessionStore::new();
        let mut guard = store.lock(ConversationId(1)).await;
        let mut draft = guard.draft();
        draft.state = ChatState::SelectingLanguage;
        assert!(guard.commit(draft));
        assert_eq!(guard.session().revision, 1);
        assert_eq!(guard.session().state, ChatState::SelectingLanguage);
    }

    #[tokio::test]
    async fn test_stale_draft_is_discarded() {
        let store = SessionStore::new();
        let mut guard = store.lock(ConversationId(1)).await;
        let stale = guard.draft();
        let mut fresh = guard.draft();
        fresh.state = ChatState::Searching;
        assert!(guard.commit(fresh));

        let mut stale = stale;
        stale.state = ChatState::ViewingResults;
        assert!(!guard.commit(stale));
        assert_eq!(guard.session().state, ChatState::Searching);
    }

    #[tokio::test]
    async fn test_dropped_draft_leaves_session_untouched() {
        let store = SessionStore::new();
        {
            let guard = store.lock(ConversationId(5)).await;
            let mut draft = guard.draft();
            draft.state = ChatState::ViewingTranslation;
        }
        let session = store.snapshot(ConversationId(5)).await.unwrap();
        assert_eq!(session.state, ChatState::Init);
        assert_eq!(session.revision, 0);
    }

    #[tokio::test]
    async fn test_conversations_are_independent() {
        let store = Arc::new(SessionStore::new());
        let _held = store.lock(ConversationId(1)).await;
        // A second chat is not blocked by the first one's lock.
        let other = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            store.lock(ConversationId(2)),
        )
        .await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_same_conversation_is_serialized() {
        let store = Arc::new(SessionStore::new());
        let held = store.lock(ConversationId(1)).await;
        let waiting = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            store.lock(ConversationId(1)),
        )
        .await;
        assert!(waiting.is_err());
        drop(held);
        assert!(store.snapshot(ConversationId(1)).await.is_some());
    }

    #[tokio::test]
    async fn test_evict_idle_skips_busy_sessions() {
        let store = SessionStore::new();
        drop(store.lock(ConversationId(1)).await);
        let busy = store.lock(ConversationId(2)).await;

        assert_eq!(store.evict_idle(Duration::seconds(-1)), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(busy.id(), ConversationId(2));
        assert!(store.snapshot(ConversationId(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_evict_idle_keeps_recent_sessions() {
        let store = SessionStore::new();
        drop(store.lock(ConversationId(1)).await);
        assert_eq!(store.evict_idle(Duration::minutes(10)), 0);
        assert_eq!(store.len(), 1);
    }
}
