//! Process-wide session registry.
//!
//! Owns every session and the order pool they share. Bootstrapped with the
//! `"default"` session at startup.

use crate::session::Session;
use matching_engine::OrderPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use types::errors::RequestError;
use types::ids::{ConnectionId, SessionId};

pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<Session>>>,
    pool: Arc<OrderPool>,
}

impl SessionRegistry {
    pub fn new(pool: Arc<OrderPool>) -> Self {
        let registry = Self {
            sessions: Mutex::new(HashMap::new()),
            pool,
        };
        registry.create_session(SessionId::default());
        registry
    }

    /// Idempotent: an existing session is returned untouched.
    pub fn create_session(&self, id: SessionId) -> Arc<Session> {
        let mut sessions = self.lock();
        Arc::clone(
            sessions
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Session::new(id, Arc::clone(&self.pool)))),
        )
    }

    pub fn get(&self, id: &SessionId) -> Result<Arc<Session>, RequestError> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or(RequestError::SessionNotFound)
    }

    /// Disconnect cleanup: unbind the connection from whichever sessions it
    /// joined. Session locks are taken after the registry lock is dropped.
    pub fn remove_connection(&self, connection: ConnectionId) {
        let sessions: Vec<Arc<Session>> = self.lock().values().cloned().collect();
        for session in sessions {
            if let Some(username) = session.remove_connection(connection) {
                tracing::info!(session = %session.id(), username, %connection, "user removed on disconnect");
            }
        }
    }

    pub fn pool(&self) -> Arc<OrderPool> {
        Arc::clone(&self.pool)
    }

    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, Arc<Session>>> {
        self.sessions.lock().expect("registry mutex poisoned")
    }
}
