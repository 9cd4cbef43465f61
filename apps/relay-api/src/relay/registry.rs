//! Process-wide store of sessions and connected participants.
//!
//! Two maps live under a single `parking_lot::Mutex`: sessions by id
//! and a global participant index. One lock keeps removal from both
//! maps atomic with respect to concurrent broadcasts. Event sends
//! inside the lock are unbounded-queue pushes and never touch the
//! socket, so a stalled peer cannot hold the lock hostage; the actual
//! network write happens in each connection's writer task.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use utoipa::ToSchema;

use relay_common::id::{prefix, prefixed_ulid};
use relay_common::time::now_unix;

use super::events::ServerEvent;
use super::handle::{ConnectionDriver, ConnectionHandle};

/// Public session record. The participant map is never serialized.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

/// The join target no longer exists (lost a race with delete).
#[derive(Debug, PartialEq, Eq)]
pub struct SessionNotFound;

struct SessionEntry {
    info: SessionInfo,
    participants: HashMap<String, Arc<ConnectionHandle>>,
}

#[derive(Default)]
struct RegistryInner {
    sessions: HashMap<String, SessionEntry>,
    participants: HashMap<String, Arc<ConnectionHandle>>,
}

pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// Create a session with a fresh `ses_` id and an empty member map.
    /// Sessions persist until deleted, even with zero participants.
    pub fn create_session(&self, name: String) -> SessionInfo {
        let info = SessionInfo {
            id: prefixed_ulid(prefix::SESSION),
            name,
            created_at: now_unix(),
        };
        let mut inner = self.inner.lock();
        inner.sessions.insert(
            info.id.clone(),
            SessionEntry {
                info: info.clone(),
                participants: HashMap::new(),
            },
        );
        info
    }

    /// Point-in-time snapshot of all sessions.
    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        let inner = self.inner.lock();
        inner.sessions.values().map(|e| e.info.clone()).collect()
    }

    pub fn get_session(&self, id: &str) -> Option<SessionInfo> {
        let inner = self.inner.lock();
        inner.sessions.get(id).map(|e| e.info.clone())
    }

    /// Remove a session and every member of it from both maps, then
    /// close every member's stream. Closing outside the lock keeps the
    /// lock hold time bounded; each close deterministically unblocks
    /// that member's receive loop.
    pub fn delete_session(&self, id: &str) -> bool {
        let handles: Vec<Arc<ConnectionHandle>> = {
            let mut inner = self.inner.lock();
            let Some(entry) = inner.sessions.remove(id) else {
                return false;
            };
            for participant_id in entry.participants.keys() {
                inner.participants.remove(participant_id);
            }
            entry.participants.into_values().collect()
        };

        tracing::info!(session_id = %id, participants = handles.len(), "session deleted");
        for handle in &handles {
            handle.close();
        }
        true
    }

    /// Register a new participant in a session. Fails if the session
    /// was deleted since the caller looked it up; the caller is
    /// responsible for closing the offered stream in that case.
    ///
    /// Emits `session_joined` to the new member and `client_joined` to
    /// every other current member, in that order.
    pub fn join(
        &self,
        session_id: &str,
    ) -> Result<(Arc<ConnectionHandle>, ConnectionDriver), SessionNotFound> {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.sessions.get_mut(session_id) else {
            return Err(SessionNotFound);
        };

        let participant_id = prefixed_ulid(prefix::CLIENT);
        let (handle, driver) =
            ConnectionHandle::new(participant_id.clone(), session_id.to_string());

        handle.send(&ServerEvent::SessionJoined {
            session_id: session_id.to_string(),
            client_id: participant_id.clone(),
        });
        let announce = ServerEvent::ClientJoined {
            client_id: participant_id.clone(),
        };
        for other in entry.participants.values() {
            other.send(&announce);
        }

        entry
            .participants
            .insert(participant_id.clone(), Arc::clone(&handle));
        inner.participants.insert(participant_id, Arc::clone(&handle));

        Ok((handle, driver))
    }

    /// Remove a participant from its session and the global index,
    /// close its stream, and announce `client_left` to the remaining
    /// members. Idempotent: a participant that is already gone is a
    /// no-op and emits nothing.
    pub fn leave(&self, participant_id: &str) {
        let handle = {
            let mut inner = self.inner.lock();
            let Some(handle) = inner.participants.remove(participant_id) else {
                return;
            };
            if let Some(entry) = inner.sessions.get_mut(handle.session_id.as_str()) {
                entry.participants.remove(participant_id);
                let left = ServerEvent::ClientLeft {
                    client_id: participant_id.to_string(),
                };
                for other in entry.participants.values() {
                    other.send(&left);
                }
            }
            handle
        };

        tracing::info!(
            session_id = %handle.session_id,
            participant_id = %participant_id,
            "participant left"
        );
        handle.close();
    }

    /// Fan a payload out to every other member of the sender's session,
    /// as of call time. An unknown sender or session means the sender
    /// raced a disconnect; the payload is silently dropped.
    pub fn relay(&self, from: &str, data: String) {
        let inner = self.inner.lock();
        let Some(handle) = inner.participants.get(from) else {
            return;
        };
        let Some(entry) = inner.sessions.get(handle.session_id.as_str()) else {
            return;
        };

        let event = ServerEvent::ScreenData {
            client_id: from.to_string(),
            data,
        };
        for (id, other) in &entry.participants {
            if id != from {
                other.send(&event);
            }
        }
    }

    /// Close every live stream and drop all state. Used at process
    /// shutdown so every receive loop unblocks before exit.
    pub fn shutdown(&self) {
        let handles: Vec<Arc<ConnectionHandle>> = {
            let mut inner = self.inner.lock();
            inner.sessions.clear();
            inner.participants.drain().map(|(_, h)| h).collect()
        };
        for handle in &handles {
            handle.close();
        }
    }
}
