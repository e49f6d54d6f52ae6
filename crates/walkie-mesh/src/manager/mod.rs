//! Mesh manager: the owned orchestrator of one participant's mesh.
//!
//! Operations take `&mut self`. Transport activity queues up in an inbox
//! and is applied by `process_next` / `process_pending`, so all state
//! changes happen on the task that owns the manager.

mod events;
mod mesh;
mod types;


pub use types::LocalState;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use walkie_common::{Event, EventBus, Participant, PeerId};

use crate::config::MeshConfig;
use crate::cues::Cues;
use crate::media::{AudioSource, CuePlayer, MediaCapability};
use crate::session::{Registry, Session};
use crate::talk::TalkCoordinator;
use crate::transport::{Envelope, TransportProvider};

// ---------------------------------------------------------------------------
// Mesh Manager
// ---------------------------------------------------------------------------

pub struct MeshManager {
    config: MeshConfig,
    transport: Arc<dyn TransportProvider>,
    media: Arc<dyn MediaCapability>,
    cues: Cues,
    registry: Registry,
    local: LocalState,
    talk: TalkCoordinator,
    /// Held from a successful connect until disconnect.
    source: Option<AudioSource>,
    /// Last attempt token handed out.
    attempts: u64,
    /// Token of the registration whose events are honoured.
    active_attempt: Option<u64>,
    events: EventBus,
    inbox_tx: mpsc::UnboundedSender<Envelope>,
    inbox_rx: mpsc::UnboundedReceiver<Envelope>,
}

impl MeshManager {
    pub fn new(
        config: MeshConfig,
        transport: Arc<dyn TransportProvider>,
        media: Arc<dyn MediaCapability>,
        cue_player: Arc<dyn CuePlayer>,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let cues = Cues::new(cue_player, config.cues_enabled, config.static_cue_delay);
        Self {
            registry: Registry::new(config.placeholder_name.clone(), Arc::clone(&media)),
            local: LocalState::new(config.display_name.clone()),
            events: EventBus::new(config.event_capacity),
            talk: TalkCoordinator::new(),
            source: None,
            attempts: 0,
            active_attempt: None,
            config,
            transport,
            media,
            cues,
            inbox_tx,
            inbox_rx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn local(&self) -> &LocalState {
        &self.local
    }

    pub fn identity(&self) -> Option<&PeerId> {
        self.local.identity.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.local.connected
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn session(&self, peer: &PeerId) -> Option<&Session> {
        self.registry.get(peer)
    }

    /// Remote participants with an open session, ordered by peer id.
    pub fn participants(&self) -> Vec<Participant> {
        self.registry.participants()
    }

    fn publish_presence(&self) {
        self.events
            .publish(Event::PresenceChanged(self.registry.participants()));
    }
}
