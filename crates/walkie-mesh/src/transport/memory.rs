//! In-process transport: every endpoint registered on a `MemoryHub` can
//! reach every other one.
//!
//! Events are pushed through each endpoint's `EventSink` synchronously, so
//! a test drives the whole mesh by draining manager inboxes. The hub also
//! carries failure knobs (rejected or stalled registration, unreachable
//! peers, broken links, backend drops) for exercising error paths.
//!
//! With `set_deferred_open(true)` control links stay closed until
//! `deliver_opens` is called, so both ends can dial before either open.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use walkie_common::{new_short_id, ChannelId, PeerId};

use super::{ControlChannel, EventSink, MediaChannel, TransportEvent, TransportProvider};
use crate::error::TransportError;
use crate::media::{AudioSource, RemoteStream};

/// How the hub answers `register` calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RegistrationMode {
    #[default]
    Accept,
    /// Reject every registration with this reason.
    Fail(String),
    /// Never answer.
    Stall,
}

/// One record sent over a control channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub from: PeerId,
    pub to: PeerId,
    pub record: Value,
}

impl Delivery {
    /// The `type` field of the record, if it has one.
    pub fn kind(&self) -> Option<&str> {
        self.record.get("type").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Control,
    Media,
}

#[derive(Debug)]
struct Link {
    kind: LinkKind,
    caller: PeerId,
    callee: PeerId,
    open: Arc<AtomicBool>,
    caller_stream: Option<RemoteStream>,
}

impl Link {
    fn other(&self, side: &PeerId) -> &PeerId {
        if *side == self.caller {
            &self.callee
        } else {
            &self.caller
        }
    }

    fn joins(&self, a: &PeerId, b: &PeerId) -> bool {
        (self.caller == *a && self.callee == *b) || (self.caller == *b && self.callee == *a)
    }
}

#[derive(Default)]
struct HubState {
    endpoints: HashMap<PeerId, EventSink>,
    links: HashMap<u64, Link>,
    next_channel: u64,
    registration: RegistrationMode,
    unreachable: HashSet<PeerId>,
    fail_reconnect: bool,
    deferred_open: bool,
    pending_opens: Vec<u64>,
    delivered: Vec<Delivery>,
}

impl HubState {
    fn emit(&self, to: &PeerId, event: TransportEvent) {
        match self.endpoints.get(to) {
            Some(sink) => {
                if !sink.emit(event) {
                    debug!(peer = %to, "Endpoint inbox closed, event dropped");
                }
            }
            None => debug!(peer = %to, "No endpoint registered, event dropped"),
        }
    }

    /// Close one link and notify both ends. Closing twice is a no-op.
    fn close_link(&mut self, id: u64, error: Option<&str>) {
        let Some(link) = self.links.remove(&id) else {
            return;
        };
        link.open.store(false, Ordering::SeqCst);
        let channel = ChannelId(id);
        for side in [&link.caller, &link.callee] {
            let peer = link.other(side).clone();
            let event = match (link.kind, error) {
                (LinkKind::Control, None) => TransportEvent::ChannelClosed { peer, channel },
                (LinkKind::Control, Some(detail)) => TransportEvent::ChannelError {
                    peer,
                    channel,
                    detail: detail.to_string(),
                },
                (LinkKind::Media, None) => TransportEvent::MediaClosed { peer, channel },
                (LinkKind::Media, Some(detail)) => TransportEvent::MediaError {
                    peer,
                    channel,
                    detail: detail.to_string(),
                },
            };
            self.emit(side, event);
        }
    }

    /// Mark a control link open and tell both ends.
    fn open_link(&self, id: u64) -> bool {
        let Some(link) = self.links.get(&id) else {
            return false;
        };
        link.open.store(true, Ordering::SeqCst);
        let channel = ChannelId(id);
        for side in [&link.callee, &link.caller] {
            self.emit(
                side,
                TransportEvent::ChannelOpened {
                    peer: link.other(side).clone(),
                    channel,
                },
            );
        }
        true
    }

    fn links_between(&self, a: &PeerId, b: &PeerId, kind: Option<LinkKind>) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .links
            .iter()
            .filter(|(_, link)| link.joins(a, b) && kind.map_or(true, |k| link.kind == k))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

/// Shared switchboard for in-process endpoints.
#[derive(Clone, Default)]
pub struct MemoryHub {
    state: Arc<Mutex<HubState>>,
}

impl fmt::Debug for MemoryHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MemoryHub")
            .field("endpoints", &state.endpoints.len())
            .field("links", &state.links.len())
            .finish()
    }
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// An endpoint that registers under the candidate it is offered.
    pub fn endpoint(&self) -> MemoryTransport {
        MemoryTransport {
            hub: self.clone(),
            fixed_id: None,
            registered: Mutex::new(None),
        }
    }

    /// An endpoint that always registers as `id`, whatever it proposes.
    pub fn endpoint_with_id(&self, id: impl Into<PeerId>) -> MemoryTransport {
        MemoryTransport {
            hub: self.clone(),
            fixed_id: Some(id.into()),
            registered: Mutex::new(None),
        }
    }

    pub fn set_registration(&self, mode: RegistrationMode) {
        self.lock().registration = mode;
    }

    /// Make `peer` refuse new channels while staying registered.
    pub fn set_unreachable(&self, peer: &PeerId, unreachable: bool) {
        let mut state = self.lock();
        if unreachable {
            state.unreachable.insert(peer.clone());
        } else {
            state.unreachable.remove(peer);
        }
    }

    pub fn set_fail_reconnect(&self, fail: bool) {
        self.lock().fail_reconnect = fail;
    }

    /// Hold back control-channel opens until `deliver_opens`.
    pub fn set_deferred_open(&self, deferred: bool) {
        self.lock().deferred_open = deferred;
    }

    /// Open every held-back control link that is still alive, in dial
    /// order. Returns how many opened.
    pub fn deliver_opens(&self) -> usize {
        let mut state = self.lock();
        let pending = std::mem::take(&mut state.pending_opens);
        pending.into_iter().filter(|id| state.open_link(*id)).count()
    }

    /// Report a lost signaling backend to `peer`. Channels stay up.
    pub fn drop_backend(&self, peer: &PeerId, reason: &str) {
        self.lock().emit(
            peer,
            TransportEvent::BackendDisconnected {
                reason: reason.to_string(),
            },
        );
    }

    /// Fail every control link between `a` and `b` with `detail`.
    pub fn break_link(&self, a: &PeerId, b: &PeerId, detail: &str) {
        let mut state = self.lock();
        for id in state.links_between(a, b, Some(LinkKind::Control)) {
            state.close_link(id, Some(detail));
        }
    }

    /// Fail every media link between `a` and `b` with `detail`.
    pub fn break_media(&self, a: &PeerId, b: &PeerId, detail: &str) {
        let mut state = self.lock();
        for id in state.links_between(a, b, Some(LinkKind::Media)) {
            state.close_link(id, Some(detail));
        }
    }

    pub fn is_registered(&self, peer: &PeerId) -> bool {
        self.lock().endpoints.contains_key(peer)
    }

    /// Open control and media links between `a` and `b`.
    pub fn open_links(&self, a: &PeerId, b: &PeerId) -> (usize, usize) {
        let state = self.lock();
        (
            state.links_between(a, b, Some(LinkKind::Control)).len(),
            state.links_between(a, b, Some(LinkKind::Media)).len(),
        )
    }

    /// Every control record sent so far, in send order.
    pub fn delivered(&self) -> Vec<Delivery> {
        self.lock().delivered.clone()
    }

    /// Records of the given `type` sent by `from`.
    pub fn sent_by(&self, from: &PeerId, kind: &str) -> Vec<Delivery> {
        self.lock()
            .delivered
            .iter()
            .filter(|d| d.from == *from && d.kind() == Some(kind))
            .cloned()
            .collect()
    }

    pub fn clear_delivered(&self) {
        self.lock().delivered.clear();
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// One participant's view of a `MemoryHub`.
pub struct MemoryTransport {
    hub: MemoryHub,
    fixed_id: Option<PeerId>,
    registered: Mutex<Option<PeerId>>,
}

impl MemoryTransport {
    /// Identifier held by the current registration.
    pub fn local_id(&self) -> Option<PeerId> {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require_local(&self) -> Result<PeerId, TransportError> {
        self.local_id().ok_or(TransportError::NotRegistered)
    }

    fn set_local(&self, id: Option<PeerId>) {
        *self.registered.lock().unwrap_or_else(PoisonError::into_inner) = id;
    }

    /// Create a link from this endpoint to `peer` and return its id.
    fn link_to(
        &self,
        state: &mut HubState,
        peer: &PeerId,
        kind: LinkKind,
        caller_stream: Option<RemoteStream>,
    ) -> Result<(PeerId, u64, Arc<AtomicBool>), TransportError> {
        let local = self.require_local()?;
        if !state.endpoints.contains_key(&local) {
            return Err(TransportError::NotRegistered);
        }
        if !state.endpoints.contains_key(peer) || state.unreachable.contains(peer) {
            return Err(TransportError::PeerUnreachable(peer.clone()));
        }

        state.next_channel += 1;
        let id = state.next_channel;
        let open = Arc::new(AtomicBool::new(
            kind == LinkKind::Media || !state.deferred_open,
        ));
        state.links.insert(
            id,
            Link {
                kind,
                caller: local.clone(),
                callee: peer.clone(),
                open: Arc::clone(&open),
                caller_stream,
            },
        );
        Ok((local, id, open))
    }
}

#[async_trait]
impl TransportProvider for MemoryTransport {
    async fn register(
        &self,
        candidate: Option<PeerId>,
        sink: EventSink,
    ) -> Result<PeerId, TransportError> {
        let mode = self.hub.lock().registration.clone();
        match mode {
            RegistrationMode::Accept => {}
            RegistrationMode::Fail(reason) => return Err(TransportError::Rejected(reason)),
            RegistrationMode::Stall => return std::future::pending().await,
        }

        let id = self
            .fixed_id
            .clone()
            .or(candidate)
            .unwrap_or_else(|| PeerId::new(new_short_id()));

        {
            let mut state = self.hub.lock();
            if state.endpoints.contains_key(&id) {
                return Err(TransportError::IdTaken(id));
            }
            state.endpoints.insert(id.clone(), sink);
        }
        self.set_local(Some(id.clone()));
        info!(peer = %id, "Registered on memory hub");
        Ok(id)
    }

    fn open_control_channel(&self, peer: &PeerId) -> Result<Box<dyn ControlChannel>, TransportError> {
        let mut state = self.hub.lock();
        let (local, id, open) = self.link_to(&mut state, peer, LinkKind::Control, None)?;
        let channel = ChannelId(id);

        let remote_half = MemoryControlChannel {
            id: channel,
            local: peer.clone(),
            peer: local.clone(),
            open: Arc::clone(&open),
            hub: self.hub.clone(),
        };
        state.emit(peer, TransportEvent::ConnectionRequest(Box::new(remote_half)));
        if state.deferred_open {
            state.pending_opens.push(id);
        } else {
            state.open_link(id);
        }

        Ok(Box::new(MemoryControlChannel {
            id: channel,
            local,
            peer: peer.clone(),
            open,
            hub: self.hub.clone(),
        }))
    }

    fn open_media_channel(
        &self,
        peer: &PeerId,
        source: &AudioSource,
    ) -> Result<Box<dyn MediaChannel>, TransportError> {
        let mut state = self.hub.lock();
        let stream = RemoteStream::new(source.id());
        let (local, id, open) = self.link_to(&mut state, peer, LinkKind::Media, Some(stream))?;
        let channel = ChannelId(id);

        let remote_half = MemoryMediaChannel {
            id: channel,
            local: peer.clone(),
            peer: local.clone(),
            open: Arc::clone(&open),
            hub: self.hub.clone(),
        };
        state.emit(peer, TransportEvent::MediaRequest(Box::new(remote_half)));

        Ok(Box::new(MemoryMediaChannel {
            id: channel,
            local,
            peer: peer.clone(),
            open,
            hub: self.hub.clone(),
        }))
    }

    fn answer_media(
        &self,
        call: &dyn MediaChannel,
        source: Option<&AudioSource>,
    ) -> Result<(), TransportError> {
        let local = self.require_local()?;
        let state = self.hub.lock();
        let id = call.id();
        let link = state
            .links
            .get(&id.0)
            .ok_or(TransportError::UnknownChannel(id))?;
        if !link.open.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelClosed(id));
        }

        let caller = link.caller.clone();
        if let Some(stream) = link.caller_stream.clone() {
            state.emit(
                &local,
                TransportEvent::MediaStream {
                    peer: caller.clone(),
                    channel: id,
                    stream,
                },
            );
        }
        if let Some(source) = source {
            state.emit(
                &caller,
                TransportEvent::MediaStream {
                    peer: local,
                    channel: id,
                    stream: RemoteStream::new(source.id()),
                },
            );
        }
        Ok(())
    }

    async fn reconnect(&self) -> Result<(), TransportError> {
        let local = self.require_local()?;
        let state = self.hub.lock();
        if state.fail_reconnect {
            return Err(TransportError::Backend("signaling server unreachable".into()));
        }
        if !state.endpoints.contains_key(&local) {
            return Err(TransportError::NotRegistered);
        }
        debug!(peer = %local, "Reconnected to memory hub");
        Ok(())
    }

    fn destroy(&self) {
        let Some(local) = self.local_id() else {
            return;
        };
        let mut state = self.hub.lock();
        let ids: Vec<u64> = state
            .links
            .iter()
            .filter(|(_, link)| link.caller == local || link.callee == local)
            .map(|(id, _)| *id)
            .collect();
        // Unregister first so this endpoint hears nothing about its own links.
        state.endpoints.remove(&local);
        for id in ids {
            state.close_link(id, None);
        }
        drop(state);
        self.set_local(None);
        info!(peer = %local, "Left memory hub");
    }
}

// ---------------------------------------------------------------------------
// Channel halves
// ---------------------------------------------------------------------------

/// One end of a control link.
#[derive(Debug)]
pub struct MemoryControlChannel {
    id: ChannelId,
    local: PeerId,
    peer: PeerId,
    open: Arc<AtomicBool>,
    hub: MemoryHub,
}

impl ControlChannel for MemoryControlChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn peer(&self) -> &PeerId {
        &self.peer
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send(&self, record: Value) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::ChannelClosed(self.id));
        }
        let mut state = self.hub.lock();
        if !state.endpoints.contains_key(&self.peer) {
            return Err(TransportError::PeerUnreachable(self.peer.clone()));
        }
        state.delivered.push(Delivery {
            from: self.local.clone(),
            to: self.peer.clone(),
            record: record.clone(),
        });
        state.emit(
            &self.peer,
            TransportEvent::ChannelData {
                peer: self.local.clone(),
                channel: self.id,
                record,
            },
        );
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        self.hub.lock().close_link(self.id.0, None);
        Ok(())
    }
}

/// One end of a media link.
#[derive(Debug)]
pub struct MemoryMediaChannel {
    id: ChannelId,
    local: PeerId,
    peer: PeerId,
    open: Arc<AtomicBool>,
    hub: MemoryHub,
}

impl MediaChannel for MemoryMediaChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn peer(&self) -> &PeerId {
        &self.peer
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&self) -> Result<(), TransportError> {
        self.hub.lock().close_link(self.id.0, None);
        Ok(())
    }
}
