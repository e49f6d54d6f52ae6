use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use walkie_common::{Participant, PeerId};

use super::types::{Session, SessionPhase};
use crate::media::MediaCapability;

/// The set of live sessions, keyed by peer.
///
/// Removal always tears the session down first, so a session found here
/// is never `Closed`.
pub struct Registry {
    sessions: HashMap<PeerId, Session>,
    placeholder_name: String,
    media: Arc<dyn MediaCapability>,
}

impl Registry {
    pub fn new(placeholder_name: impl Into<String>, media: Arc<dyn MediaCapability>) -> Self {
        Self {
            sessions: HashMap::new(),
            placeholder_name: placeholder_name.into(),
            media,
        }
    }

    /// The session for `peer`, created in `Pending` if absent.
    pub fn upsert(&mut self, peer: &PeerId) -> &mut Session {
        let placeholder = &self.placeholder_name;
        self.sessions.entry(peer.clone()).or_insert_with(|| {
            debug!(peer = %peer, "New session");
            Session::new(peer.clone(), placeholder)
        })
    }

    pub fn get(&self, peer: &PeerId) -> Option<&Session> {
        self.sessions.get(peer)
    }

    pub fn get_mut(&mut self, peer: &PeerId) -> Option<&mut Session> {
        self.sessions.get_mut(peer)
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.sessions.contains_key(peer)
    }

    /// Tear down and remove the session for `peer`.
    pub fn remove(&mut self, peer: &PeerId) -> Option<Session> {
        let mut session = self.sessions.remove(peer)?;
        session.teardown(self.media.as_ref());
        debug!(peer = %peer, "Session removed");
        Some(session)
    }

    /// Tear down every session.
    pub fn clear(&mut self) {
        for (_, mut session) in self.sessions.drain() {
            session.teardown(self.media.as_ref());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.values_mut()
    }

    /// Snapshot of every `Open` session, ordered by peer id.
    pub fn participants(&self) -> Vec<Participant> {
        let mut list: Vec<Participant> = self
            .sessions
            .values()
            .filter(|s| s.phase() == SessionPhase::Open)
            .map(Session::participant)
            .collect();
        list.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        list
    }

    /// Whether any session other than `except` is transmitting.
    pub fn any_talking_except(&self, except: &PeerId) -> bool {
        self.sessions
            .values()
            .any(|s| s.is_talking() && s.peer_id() != except)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
