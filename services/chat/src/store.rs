//! Session collection with write-through persistence
//!
//! [`SessionStore`] is the only writer of the `chat_sessions` key. Every
//! mutation builds the next collection on the side, writes the complete
//! snapshot, and swaps it in only after the write succeeded. Storage
//! therefore always holds a whole, consistent collection, and a failed
//! write leaves the in-memory state exactly as it was.

use std::collections::HashSet;
use std::sync::Arc;

use common::{PersistentStore, keys};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::models::{Message, Session, SessionId};

/// Version written into every persisted snapshot
pub const SCHEMA_VERSION: u32 = 1;

/// Question asked before a session is deleted
pub const DELETE_PROMPT: &str = "Delete this chat?";

/// Blocking yes/no prompt shown before destructive operations
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Result of [`SessionStore::delete_session`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion {
    /// The session is gone; `active` is the session now active
    Deleted { active: SessionId },
    /// The prompt was declined and nothing changed
    Declined,
}

#[derive(Debug, Clone, PartialEq)]
struct Collection {
    sessions: Vec<Session>,
    active_id: SessionId,
}

impl Collection {
    fn fresh() -> Self {
        let session = Session::new();
        Self {
            active_id: session.id.clone(),
            sessions: vec![session],
        }
    }

    fn position(&self, id: &SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| &s.id == id)
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    active_id: &'a SessionId,
    sessions: &'a [Session],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    active_id: Option<SessionId>,
    #[serde(default)]
    sessions: Vec<Session>,
}

/// Owner of all conversation sessions and the active pointer
pub struct SessionStore<S> {
    store: Arc<S>,
    state: Collection,
}

impl<S: PersistentStore> SessionStore<S> {
    /// Restore the collection saved by a previous run
    ///
    /// Missing, corrupt, or unknown-version content starts over with one
    /// default session. Duplicate ids and a dangling active pointer are
    /// repaired. Repaired state is written back; a failed write is logged
    /// and the store still starts.
    pub async fn load(store: Arc<S>) -> Self {
        let stored = match store.read(keys::CHAT_SESSIONS).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read stored sessions: {}", e);
                None
            }
        };

        let (state, repaired) = stored
            .as_deref()
            .and_then(decode)
            .unwrap_or_else(|| (Collection::fresh(), true));

        let mut session_store = Self {
            store,
            state: state.clone(),
        };

        if repaired {
            if let Err(e) = session_store.commit(state).await {
                error!("Failed to persist initial sessions: {}", e);
            }
        }

        info!(
            "Loaded {} chat session(s), active {}",
            session_store.state.sessions.len(),
            session_store.state.active_id
        );
        session_store
    }

    /// Sessions, most recent first
    pub fn sessions(&self) -> &[Session] {
        &self.state.sessions
    }

    pub fn len(&self) -> usize {
        self.state.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.sessions.is_empty()
    }

    pub fn active_id(&self) -> &SessionId {
        &self.state.active_id
    }

    pub fn active(&self) -> Option<&Session> {
        self.get(&self.state.active_id)
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.state.sessions.iter().find(|s| &s.id == id)
    }

    /// Start a new empty session at the front and make it active
    pub async fn create_session(&mut self) -> SessionResult<Session> {
        let session = Session::new();
        let mut next = self.state.clone();
        next.sessions.insert(0, session.clone());
        next.active_id = session.id.clone();

        self.commit(next).await?;
        info!("Created chat session {}", session.id);
        Ok(session)
    }

    /// Make `id` the active session
    pub async fn select_session(&mut self, id: &SessionId) -> SessionResult<()> {
        if self.get(id).is_none() {
            return Err(SessionError::NotFound(id.clone()));
        }
        if &self.state.active_id == id {
            return Ok(());
        }

        let mut next = self.state.clone();
        next.active_id = id.clone();
        self.commit(next).await
    }

    /// Delete `id` after the user confirms
    ///
    /// Deleting the active session activates the first remaining one.
    /// Deleting the last session replaces it with a fresh default session
    /// in the same snapshot, so storage never holds an empty collection.
    pub async fn delete_session(
        &mut self,
        id: &SessionId,
        confirm: &impl Confirm,
    ) -> SessionResult<Deletion> {
        let Some(index) = self.state.position(id) else {
            return Err(SessionError::NotFound(id.clone()));
        };

        if !confirm.confirm(DELETE_PROMPT) {
            debug!("Deletion of session {} declined", id);
            return Ok(Deletion::Declined);
        }

        let mut next = self.state.clone();
        next.sessions.remove(index);
        if next.sessions.is_empty() {
            next.sessions.push(Session::new());
        }
        if next.position(&next.active_id).is_none() {
            next.active_id = next.sessions[0].id.clone();
        }

        let active = next.active_id.clone();
        self.commit(next).await?;
        info!("Deleted chat session {}, active is now {}", id, active);
        Ok(Deletion::Deleted { active })
    }

    /// Give a session an explicit title
    pub async fn rename_session(&mut self, id: &SessionId, title: &str) -> SessionResult<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SessionError::EmptyTitle);
        }

        let mut next = self.state.clone();
        let index = next
            .position(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        let session = &mut next.sessions[index];
        session.title = title.to_string();
        session.title_pinned = true;

        self.commit(next).await
    }

    /// Replace the messages of a session and re-derive its title
    pub async fn append_messages(
        &mut self,
        id: &SessionId,
        messages: Vec<Message>,
    ) -> SessionResult<()> {
        let mut next = self.state.clone();
        let index = next
            .position(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        let session = &mut next.sessions[index];
        session.messages = messages;
        session.derive_title();

        self.commit(next).await
    }

    /// Append one message to the end of a session
    pub async fn push_message(&mut self, id: &SessionId, message: Message) -> SessionResult<()> {
        let mut messages = self
            .get(id)
            .map(|s| s.messages.clone())
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        messages.push(message);
        self.append_messages(id, messages).await
    }

    async fn commit(&mut self, next: Collection) -> SessionResult<()> {
        let snapshot = SnapshotRef {
            version: SCHEMA_VERSION,
            active_id: &next.active_id,
            sessions: &next.sessions,
        };
        let bytes = serde_json::to_vec(&snapshot)?;
        self.store.write(keys::CHAT_SESSIONS, &bytes).await?;

        debug!("Persisted {} chat session(s)", next.sessions.len());
        self.state = next;
        Ok(())
    }
}

/// Decode a stored snapshot, repairing what can be repaired
///
/// Returns `None` when nothing usable is stored. The flag reports whether
/// the decoded collection differs from what was stored.
fn decode(bytes: &[u8]) -> Option<(Collection, bool)> {
    let snapshot: Snapshot = match serde_json::from_slice(bytes) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Ignoring unreadable stored sessions: {}", e);
            return None;
        }
    };

    if snapshot.version != SCHEMA_VERSION {
        warn!(
            "Ignoring stored sessions with unknown schema version {}",
            snapshot.version
        );
        return None;
    }

    let stored_count = snapshot.sessions.len();
    let mut seen = HashSet::new();
    let sessions: Vec<Session> = snapshot
        .sessions
        .into_iter()
        .filter(|s| seen.insert(s.id.clone()))
        .collect();
    let mut repaired = sessions.len() != stored_count;
    if repaired {
        warn!("Dropped {} duplicate stored session(s)", stored_count - sessions.len());
    }

    let first = sessions.first()?.id.clone();
    let active_id = match snapshot.active_id {
        Some(id) if sessions.iter().any(|s| s.id == id) => id,
        _ => {
            repaired = true;
            first
        }
    };

    Some((
        Collection {
            sessions,
            active_id,
        },
        repaired,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::StoreError;
    use common::store::MemoryStore;

    fn accept() -> impl Confirm {
        |_: &str| true
    }

    async fn stored_snapshot(store: &MemoryStore) -> serde_json::Value {
        let bytes = store.read(keys::CHAT_SESSIONS).await.unwrap().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Reads work; every write fails.
    struct ReadOnlyStore(MemoryStore);

    impl PersistentStore for ReadOnlyStore {
        async fn read(&self, key: &str) -> common::StoreResult<Option<Vec<u8>>> {
            self.0.read(key).await
        }

        async fn write(&self, _key: &str, _value: &[u8]) -> common::StoreResult<()> {
            Err(StoreError::Configuration("read-only".to_string()))
        }

        async fn remove(&self, _key: &str) -> common::StoreResult<()> {
            Err(StoreError::Configuration("read-only".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fresh_start_has_one_default_session() {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionStore::load(store.clone()).await;

        assert_eq!(sessions.len(), 1);
        let active = sessions.active().unwrap();
        assert_eq!(active.title, "New Chat");
        assert!(active.messages.is_empty());

        // the default collection is persisted immediately
        let snapshot = stored_snapshot(&store).await;
        assert_eq!(snapshot["version"], 1);
        assert_eq!(snapshot["active_id"], active.id.as_str());
    }

    #[tokio::test]
    async fn test_corrupt_storage_fails_soft() -> SessionResult<()> {
        for garbage in [
            &b"not json"[..],
            &br#"{"version":99,"sessions":[]}"#[..],
            &br#"{"version":1,"sessions":[]}"#[..],
            &br#"[1,2,3]"#[..],
        ] {
            let store = Arc::new(MemoryStore::new());
            store.write(keys::CHAT_SESSIONS, garbage).await?;

            let sessions = SessionStore::load(store).await;
            assert_eq!(sessions.len(), 1);
            assert_eq!(sessions.active().unwrap().title, "New Chat");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_round_trip_preserves_order_and_active() -> SessionResult<()> {
        let store = Arc::new(MemoryStore::new());
        let mut sessions = SessionStore::load(store.clone()).await;
        let first = sessions.active_id().clone();
        sessions
            .push_message(&first, Message::user("Who is the chair?"))
            .await?;
        sessions.create_session().await?;
        sessions.create_session().await?;
        sessions.select_session(&first).await?;

        let reloaded = SessionStore::load(store).await;
        assert_eq!(reloaded.sessions(), sessions.sessions());
        assert_eq!(reloaded.active_id(), &first);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_active_pointer_is_repaired() -> SessionResult<()> {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new();
        let snapshot = serde_json::json!({
            "version": 1,
            "active_id": "gone",
            "sessions": [session, session],
        });
        store
            .write(keys::CHAT_SESSIONS, &serde_json::to_vec(&snapshot)?)
            .await?;

        let sessions = SessionStore::load(store.clone()).await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.active_id(), &session.id);
        assert_eq!(stored_snapshot(&store).await["active_id"], session.id.as_str());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_inserts_at_front_and_activates() -> SessionResult<()> {
        let mut sessions = SessionStore::load(Arc::new(MemoryStore::new())).await;
        let original = sessions.active_id().clone();

        let created = sessions.create_session().await?;
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions.sessions()[0].id, created.id);
        assert_eq!(sessions.active_id(), &created.id);
        assert_eq!(sessions.sessions()[1].id, original);
        Ok(())
    }

    #[tokio::test]
    async fn test_select_unknown_session_is_rejected() -> SessionResult<()> {
        let mut sessions = SessionStore::load(Arc::new(MemoryStore::new())).await;
        let before = sessions.active_id().clone();

        let err = sessions.select_session(&SessionId::from("missing")).await;
        assert!(matches!(err, Err(SessionError::NotFound(_))));
        assert_eq!(sessions.active_id(), &before);
        Ok(())
    }

    #[tokio::test]
    async fn test_declined_delete_changes_nothing() -> SessionResult<()> {
        let store = Arc::new(MemoryStore::new());
        let mut sessions = SessionStore::load(store.clone()).await;
        let id = sessions.active_id().clone();
        let before = stored_snapshot(&store).await;

        let asked = std::cell::Cell::new(None);
        let decline = |prompt: &str| {
            asked.set(Some(prompt.to_string()));
            false
        };
        let outcome = sessions.delete_session(&id, &decline).await?;

        assert_eq!(outcome, Deletion::Declined);
        assert_eq!(asked.take().as_deref(), Some(DELETE_PROMPT));
        assert_eq!(sessions.len(), 1);
        assert_eq!(stored_snapshot(&store).await, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_only_session_creates_replacement() -> SessionResult<()> {
        let store = Arc::new(MemoryStore::new());
        let mut sessions = SessionStore::load(store.clone()).await;
        let old = sessions.active_id().clone();

        let outcome = sessions.delete_session(&old, &accept()).await?;

        let Deletion::Deleted { active } = outcome else {
            panic!("expected deletion");
        };
        assert_ne!(active, old);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.active_id(), &active);
        assert_eq!(sessions.active().unwrap().title, "New Chat");
        assert_eq!(
            stored_snapshot(&store).await["sessions"].as_array().unwrap().len(),
            1
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_active_session_activates_first_remaining() -> SessionResult<()> {
        let mut sessions = SessionStore::load(Arc::new(MemoryStore::new())).await;
        let oldest = sessions.active_id().clone();
        let middle = sessions.create_session().await?.id;
        let newest = sessions.create_session().await?.id;

        sessions.select_session(&middle).await?;
        sessions.delete_session(&middle, &accept()).await?;
        assert_eq!(sessions.active_id(), &newest);

        // deleting an inactive session leaves the pointer alone
        sessions.delete_session(&oldest, &accept()).await?;
        assert_eq!(sessions.active_id(), &newest);
        assert_eq!(sessions.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_collection_never_empty_under_create_delete() -> SessionResult<()> {
        let mut sessions = SessionStore::load(Arc::new(MemoryStore::new())).await;

        for round in 0..12 {
            if round % 3 == 0 {
                sessions.create_session().await?;
            } else {
                let victim = sessions.sessions()[round % sessions.len()].id.clone();
                sessions.delete_session(&victim, &accept()).await?;
            }
            assert!(!sessions.is_empty());
            assert!(sessions.active().is_some());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_append_replaces_messages_and_derives_title() -> SessionResult<()> {
        let mut sessions = SessionStore::load(Arc::new(MemoryStore::new())).await;
        let id = sessions.active_id().clone();

        sessions
            .append_messages(
                &id,
                vec![
                    Message::user("What is the first day of class for fall 2025?"),
                    Message::bot("August 25"),
                ],
            )
            .await?;

        let session = sessions.get(&id).unwrap();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.title, "What is the first da");

        let err = sessions
            .append_messages(&SessionId::from("missing"), Vec::new())
            .await;
        assert!(matches!(err, Err(SessionError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_pins_title() -> SessionResult<()> {
        let mut sessions = SessionStore::load(Arc::new(MemoryStore::new())).await;
        let id = sessions.active_id().clone();

        assert!(matches!(
            sessions.rename_session(&id, "   ").await,
            Err(SessionError::EmptyTitle)
        ));

        sessions.rename_session(&id, "  Advising  ").await?;
        sessions.push_message(&id, Message::user("hello")).await?;
        assert_eq!(sessions.get(&id).unwrap().title, "Advising");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_unchanged() -> SessionResult<()> {
        let inner = MemoryStore::new();
        let mut sessions = SessionStore::load(Arc::new(ReadOnlyStore(inner))).await;
        let before = sessions.sessions().to_vec();
        let id = sessions.active_id().clone();

        let err = sessions.push_message(&id, Message::user("hello")).await;
        assert!(matches!(err, Err(SessionError::Store(_))));
        assert!(sessions.create_session().await.is_err());
        assert_eq!(sessions.sessions(), before.as_slice());
        Ok(())
    }
}
