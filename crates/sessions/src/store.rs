use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use {
    pixelbot_common::types::SessionId,
    tokio::sync::{Mutex, OwnedMutexGuard},
    tracing::debug,
};

/// Exclusive access to one session's context.
pub type SessionGuard<S> = OwnedMutexGuard<S>;

/// Process-lifetime map of session id → context.
pub struct SessionStore<S> {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<S>>>>,
}

impl<S: Default + Send + 'static> Default for SessionStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Default + Send + 'static> SessionStore<S> {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The context cell for `id`, created with `S::default()` on first use.
    pub fn get_or_create(&self, id: &SessionId) -> Arc<Mutex<S>> {
        if let Some(cell) = self
            .sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
        {
            return Arc::clone(cell);
        }
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(sessions.entry(id.clone()).or_insert_with(|| {
            debug!(session = %id, "session created");
            Arc::new(Mutex::new(S::default()))
        }))
    }

    /// Wait for exclusive access to the session.
    pub async fn lock(&self, id: &SessionId) -> SessionGuard<S> {
        self.get_or_create(id).lock_owned().await
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self
            .sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
