//! Conversation sessions keyed by (user, document)
//!
//! [`SessionManager`] hands out one mutation slot per pair: a shared
//! `tokio::sync::Mutex` around the session. Requests against the same pair
//! hold the slot for their whole read-append-save cycle, so their turns
//! never interleave. Different pairs never contend. Deletion takes the slot
//! too, so a request in flight cannot write a deleted session back.

use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;
use tracing::info;

use crate::errors::Result;
use crate::models::ConversationSession;
use crate::models::ConversationTurn;
use crate::models::SessionSummary;

type SessionKey = (String, String);

fn key(user_id: &str, document_id: &str) -> SessionKey {
    (user_id.to_string(), document_id.to_string())
}

/// Session persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load_session(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Option<ConversationSession>>;

    async fn save(&self, session: &ConversationSession) -> Result<()>;

    /// Most recently active first
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>>;

    /// Returns whether a session was removed
    async fn delete_session(&self, user_id: &str, document_id: &str) -> Result<bool>;

    /// Remove every session of `user_id` about `document_id`, returning the count
    async fn delete_sessions_for_document(&self, user_id: &str, document_id: &str)
        -> Result<usize>;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionKey, ConversationSession>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load_session(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Option<ConversationSession>> {
        Ok(self
            .sessions
            .get(&key(user_id, document_id))
            .map(|entry| entry.value().clone()))
    }

    async fn save(&self, session: &ConversationSession) -> Result<()> {
        self.sessions
            .insert(key(&session.user_id, &session.document_id), session.clone());
        Ok(())
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.summary())
            .collect();
        summaries.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        Ok(summaries)
    }

    async fn delete_session(&self, user_id: &str, document_id: &str) -> Result<bool> {
        Ok(self.sessions.remove(&key(user_id, document_id)).is_some())
    }

    async fn delete_sessions_for_document(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<usize> {
        let before = self.sessions.len();
        self.sessions.retain(|(user, document), _| {
            !(user.as_str() == user_id && document.as_str() == document_id)
        });
        Ok(before.saturating_sub(self.sessions.len()))
    }
}

/// A live session plus its deletion mark
///
/// Derefs to the session, so holders read and append as usual. Once a
/// delete has gone through, the slot is marked and later saves through
/// the manager are dropped.
#[derive(Debug)]
pub struct SessionSlot {
    session: ConversationSession,
    deleted: bool,
}

impl SessionSlot {
    fn new(session: ConversationSession) -> Self {
        Self {
            session,
            deleted: false,
        }
    }

    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl Deref for SessionSlot {
    type Target = ConversationSession;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl DerefMut for SessionSlot {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

/// Handle to a session's mutation slot
pub type SessionHandle = Arc<Mutex<SessionSlot>>;

/// Caches live sessions in front of a [`SessionStore`]
///
/// A handle stays cached while some request holds it. Callers hand it back
/// with [`SessionManager::release`], and the last one out evicts it.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    live: DashMap<SessionKey, SessionHandle>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            live: DashMap::new(),
        }
    }

    /// In-memory store, no persistence beyond the process
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySessionStore::new()))
    }

    fn cached(&self, session_key: &SessionKey) -> Option<SessionHandle> {
        self.live
            .get(session_key)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// The session for the pair, loading it from the store or creating an
    /// empty one
    pub async fn get_or_create(&self, user_id: &str, document_id: &str) -> Result<SessionHandle> {
        let session_key = key(user_id, document_id);
        if let Some(handle) = self.cached(&session_key) {
            return Ok(handle);
        }

        let session = match self.store.load_session(user_id, document_id).await? {
            Some(session) => {
                debug!("Loaded session {} ({} turns)", session.id, session.turns.len());
                session
            }
            None => {
                let session = ConversationSession::new(user_id, document_id);
                info!(
                    "Created session {} for user {} on document {}",
                    session.id, user_id, document_id
                );
                session
            }
        };

        // A concurrent caller may have inserted first; the first insert wins.
        let handle = self
            .live
            .entry(session_key)
            .or_insert_with(|| Arc::new(Mutex::new(SessionSlot::new(session))));
        Ok(Arc::clone(handle.value()))
    }

    /// Give back a handle from [`SessionManager::get_or_create`]
    ///
    /// The cache entry is evicted when no other request holds it. The
    /// session itself stays in the store.
    pub fn release(&self, user_id: &str, document_id: &str, handle: SessionHandle) {
        let evicted = self
            .live
            .remove_if(&key(user_id, document_id), |_, cached| {
                // One reference in the map, one in `handle`
                Arc::ptr_eq(cached, &handle) && Arc::strong_count(cached) == 2
            })
            .is_some();
        if evicted {
            debug!("Evicted idle session for user {} on document {}", user_id, document_id);
        }
    }

    /// Last `k` turns of the pair's session, oldest first
    ///
    /// Reads the live copy when one is cached and the store otherwise. An
    /// unknown pair yields an empty window and creates nothing.
    pub async fn window(
        &self,
        user_id: &str,
        document_id: &str,
        k: usize,
    ) -> Result<Vec<ConversationTurn>> {
        if let Some(handle) = self.cached(&key(user_id, document_id)) {
            let slot = handle.lock().await;
            if !slot.deleted {
                return Ok(slot.window(k).to_vec());
            }
        }
        Ok(self
            .store
            .load_session(user_id, document_id)
            .await?
            .map(|session| session.window(k).to_vec())
            .unwrap_or_default())
    }

    /// Append one turn and persist the session
    pub async fn append(
        &self,
        user_id: &str,
        document_id: &str,
        turn: ConversationTurn,
    ) -> Result<()> {
        let handle = self.get_or_create(user_id, document_id).await?;
        let result = {
            let mut slot = handle.lock().await;
            slot.append(turn);
            self.save(&slot).await
        };
        self.release(user_id, document_id, handle);
        result
    }

    /// Persist a slot the caller already holds locked
    ///
    /// A slot deleted while the caller waited is not written back.
    pub async fn save(&self, slot: &SessionSlot) -> Result<()> {
        if slot.deleted {
            debug!("Session {} was deleted, not saving", slot.id);
            return Ok(());
        }
        self.store.save(&slot.session).await
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        self.store.list_sessions(user_id).await
    }

    /// Mark the cached slot deleted, keeping it locked
    ///
    /// Waits for the request currently holding the slot, so its save lands
    /// before the store delete that follows. Requests queued behind the
    /// returned guard see the mark and skip their save.
    async fn mark_deleted(
        &self,
        session_key: &SessionKey,
    ) -> Option<(SessionHandle, OwnedMutexGuard<SessionSlot>)> {
        let handle = self.cached(session_key)?;
        let mut slot = Arc::clone(&handle).lock_owned().await;
        slot.deleted = true;
        Some((handle, slot))
    }

    fn evict(&self, session_key: &SessionKey, handle: &SessionHandle) {
        self.live
            .remove_if(session_key, |_, cached| Arc::ptr_eq(cached, handle));
    }

    pub async fn delete(&self, user_id: &str, document_id: &str) -> Result<bool> {
        let session_key = key(user_id, document_id);
        let retired = self.mark_deleted(&session_key).await;
        let removed = self.store.delete_session(user_id, document_id).await;
        if let Some((handle, _slot)) = retired {
            self.evict(&session_key, &handle);
        }
        removed
    }

    /// Drop all sessions about a document, e.g. after it is deleted
    pub async fn delete_for_document(&self, user_id: &str, document_id: &str) -> Result<usize> {
        let session_key = key(user_id, document_id);
        let retired = self.mark_deleted(&session_key).await;
        let removed = self
            .store
            .delete_sessions_for_document(user_id, document_id)
            .await;
        if let Some((handle, _slot)) = retired {
            self.evict(&session_key, &handle);
        }
        removed
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::in_memory()
    }
}
