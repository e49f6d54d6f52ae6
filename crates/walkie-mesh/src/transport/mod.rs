//! Transport provider capability the mesh is written against.
//!
//! A provider registers the local endpoint, opens control and media
//! channels to remote identifiers, and reports everything that happens on
//! those channels as `TransportEvent`s pushed through an `EventSink`.
//! ICE negotiation, relays and NAT traversal all live behind this seam.

pub mod memory;

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use walkie_common::{ChannelId, PeerId};

use crate::error::TransportError;
use crate::media::{AudioSource, RemoteStream};

// ---------------------------------------------------------------------------
// Channel handles
// ---------------------------------------------------------------------------

/// Reliable, ordered channel carrying control records to one peer.
pub trait ControlChannel: fmt::Debug + Send + Sync {
    fn id(&self) -> ChannelId;

    /// Remote end of this channel.
    fn peer(&self) -> &PeerId;

    fn is_open(&self) -> bool;

    /// Send one record as a single discrete unit.
    fn send(&self, record: serde_json::Value) -> Result<(), TransportError>;

    fn close(&self) -> Result<(), TransportError>;
}

/// Live audio stream to or from one peer.
pub trait MediaChannel: fmt::Debug + Send + Sync {
    fn id(&self) -> ChannelId;

    fn peer(&self) -> &PeerId;

    fn is_open(&self) -> bool;

    fn close(&self) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TransportProvider: Send + Sync {
    /// Register the local endpoint, optionally proposing an identifier.
    ///
    /// Inbound activity for this registration is pushed through `sink`
    /// until `destroy` is called.
    async fn register(
        &self,
        candidate: Option<PeerId>,
        sink: EventSink,
    ) -> Result<PeerId, TransportError>;

    fn open_control_channel(&self, peer: &PeerId) -> Result<Box<dyn ControlChannel>, TransportError>;

    fn open_media_channel(
        &self,
        peer: &PeerId,
        source: &AudioSource,
    ) -> Result<Box<dyn MediaChannel>, TransportError>;

    /// Accept an inbound media call, sending `source` back if present.
    fn answer_media(
        &self,
        call: &dyn MediaChannel,
        source: Option<&AudioSource>,
    ) -> Result<(), TransportError>;

    /// Re-establish the link to the signaling backend after it dropped.
    async fn reconnect(&self) -> Result<(), TransportError>;

    /// Tear down the registration and every channel it owns.
    fn destroy(&self);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Inbound activity reported by a transport provider.
#[derive(Debug)]
pub enum TransportEvent {
    /// A remote peer opened a control channel to us.
    ConnectionRequest(Box<dyn ControlChannel>),
    ChannelOpened {
        peer: PeerId,
        channel: ChannelId,
    },
    ChannelData {
        peer: PeerId,
        channel: ChannelId,
        record: serde_json::Value,
    },
    ChannelClosed {
        peer: PeerId,
        channel: ChannelId,
    },
    ChannelError {
        peer: PeerId,
        channel: ChannelId,
        detail: String,
    },
    /// A remote peer is calling us with audio.
    MediaRequest(Box<dyn MediaChannel>),
    /// A remote audio stream is flowing on a media channel.
    MediaStream {
        peer: PeerId,
        channel: ChannelId,
        stream: RemoteStream,
    },
    MediaClosed {
        peer: PeerId,
        channel: ChannelId,
    },
    MediaError {
        peer: PeerId,
        channel: ChannelId,
        detail: String,
    },
    /// The signaling backend dropped; peer channels may still be alive.
    BackendDisconnected {
        reason: String,
    },
}

/// A transport event tagged with the registration attempt it belongs to.
#[derive(Debug)]
pub struct Envelope {
    pub attempt: u64,
    pub event: TransportEvent,
}

/// Where a provider pushes events for one registration attempt.
#[derive(Debug, Clone)]
pub struct EventSink {
    attempt: u64,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl EventSink {
    pub fn new(attempt: u64, tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { attempt, tx }
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Deliver an event. Returns false once the receiving side is gone.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.tx
            .send(Envelope {
                attempt: self.attempt,
                event,
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_tags_events_with_attempt() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(7, tx);
        assert!(sink.emit(TransportEvent::BackendDisconnected {
            reason: "gone".into()
        }));

        let env = rx.try_recv().unwrap();
        assert_eq!(env.attempt, 7);
        assert!(matches!(
            env.event,
            TransportEvent::BackendDisconnected { ref reason } if reason == "gone"
        ));
    }

    #[test]
    fn emit_reports_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(1, tx);
        drop(rx);
        assert!(!sink.emit(TransportEvent::BackendDisconnected {
            reason: String::new()
        }));
    }
}
