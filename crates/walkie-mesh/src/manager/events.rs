//! Applying transport events to the mesh.

use serde_json::Value;
use tracing::{debug, info, trace, warn};
use walkie_common::{ChannelId, ErrorKind, PeerId};

use super::MeshManager;
use crate::media::{Cue, RemoteStream};
use crate::protocol::{self, ControlMessage, Decoded};
use crate::signaling;
use crate::transport::{ControlChannel, Envelope, MediaChannel, TransportEvent};

impl MeshManager {
    /// Wait for the next transport event and apply it.
    pub async fn process_next(&mut self) -> bool {
        match self.inbox_rx.recv().await {
            Some(envelope) => {
                self.handle_envelope(envelope).await;
                true
            }
            None => false,
        }
    }

    /// Apply every event already queued. Returns how many were handled.
    pub async fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.inbox_rx.try_recv() {
            self.handle_envelope(envelope).await;
            handled += 1;
        }
        handled
    }

    async fn handle_envelope(&mut self, envelope: Envelope) {
        if self.active_attempt != Some(envelope.attempt) {
            discard(envelope);
            return;
        }

        match envelope.event {
            TransportEvent::ConnectionRequest(channel) => self.on_connection_request(channel),
            TransportEvent::ChannelOpened { peer, channel } => self.on_channel_opened(&peer, channel),
            TransportEvent::ChannelData {
                peer,
                channel,
                record,
            } => self.on_channel_data(&peer, channel, &record),
            TransportEvent::ChannelClosed { peer, channel } => {
                self.on_channel_closed(&peer, channel, None)
            }
            TransportEvent::ChannelError {
                peer,
                channel,
                detail,
            } => self.on_channel_closed(&peer, channel, Some(detail)),
            TransportEvent::MediaRequest(call) => self.on_media_request(call),
            TransportEvent::MediaStream {
                peer,
                channel,
                stream,
            } => self.on_media_stream(&peer, channel, &stream),
            TransportEvent::MediaClosed { peer, channel } => {
                self.on_media_closed(&peer, channel, None)
            }
            TransportEvent::MediaError {
                peer,
                channel,
                detail,
            } => self.on_media_closed(&peer, channel, Some(detail)),
            TransportEvent::BackendDisconnected { reason } => {
                self.on_backend_disconnected(&reason).await
            }
        }
    }

    // -----------------------------------------------------------------------
    // Control channels
    // -----------------------------------------------------------------------

    fn on_connection_request(&mut self, channel: Box<dyn ControlChannel>) {
        let peer = channel.peer().clone();
        if self.local.is_local(&peer) {
            close_control(channel.as_ref());
            return;
        }

        let local_wins = self.local.identity.as_ref().is_some_and(|me| *me < peer);
        let session = self.registry.upsert(&peer);

        // Both sides dialled: keep the channel started by the smaller id,
        // whether or not either end has opened yet.
        let keep_existing =
            local_wins && session.control().is_some() && session.control_is_outbound();
        if keep_existing {
            debug!(peer = %peer, channel = %channel.id(), "Refusing duplicate control channel");
            close_control(channel.as_ref());
            return;
        }

        debug!(peer = %peer, channel = %channel.id(), "Inbound control channel");
        if let Some(old) = session.replace_control(channel, false) {
            close_control(old.as_ref());
        }
    }

    fn on_channel_opened(&mut self, peer: &PeerId, channel: ChannelId) {
        let Some(session) = self.registry.get_mut(peer) else {
            trace!(peer = %peer, "Channel opened for unknown peer");
            return;
        };
        if session.control_id() != Some(channel) {
            trace!(peer = %peer, channel = %channel, "Ignoring superseded channel");
            return;
        }
        if !session.mark_open() {
            return;
        }

        if let Some(control) = session.control() {
            let identity = ControlMessage::Identity {
                name: self.local.display_name.clone(),
            };
            if let Err(e) = signaling::send_message(control, &identity) {
                warn!(peer = %peer, error = %e, "Failed to announce identity");
            }
        }

        info!(peer = %peer, "Session open");
        self.events.log(format!("Connected to {peer}"));
        self.publish_presence();
    }

    fn on_channel_data(&mut self, peer: &PeerId, channel: ChannelId, record: &Value) {
        let Some(session) = self.registry.get(peer) else {
            return;
        };
        if session.control_id() != Some(channel) {
            trace!(peer = %peer, channel = %channel, "Ignoring data on superseded channel");
            return;
        }

        let message = match protocol::decode(record) {
            Ok(Decoded::Message(message)) => message,
            Ok(Decoded::Unknown(kind)) => {
                debug!(peer = %peer, kind = %kind, "Ignoring unknown message type");
                return;
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "Malformed control message");
                self.events
                    .error(ErrorKind::MalformedMessage, format!("{peer}: {e}"));
                return;
            }
        };

        let static_busy = self.local.is_talking || self.registry.any_talking_except(peer);
        let Some(session) = self.registry.get_mut(peer) else {
            return;
        };
        debug!(peer = %peer, kind = message.kind(), "Control message");
        let line = signaling::apply(session, message, &self.cues, static_busy);
        self.events.log(line);
        self.publish_presence();
    }

    fn on_channel_closed(&mut self, peer: &PeerId, channel: ChannelId, error: Option<String>) {
        let Some(session) = self.registry.get_mut(peer) else {
            return;
        };
        if session.control_id() != Some(channel) {
            trace!(peer = %peer, channel = %channel, "Ignoring close of superseded channel");
            return;
        }
        let was_talking = session.is_talking();
        session.begin_closing();
        self.registry.remove(peer);

        if was_talking && !self.local.is_talking && !self.registry.iter().any(|s| s.is_talking()) {
            self.cues.stop(Cue::Static);
        }
        match error {
            Some(detail) => {
                warn!(peer = %peer, error = %detail, "Control channel failed");
                self.events
                    .error(ErrorKind::ChannelError, format!("{peer}: {detail}"));
            }
            None => info!(peer = %peer, "Session closed"),
        }
        self.events.log(format!("{peer} left"));
        self.publish_presence();
    }

    // -----------------------------------------------------------------------
    // Media channels
    // -----------------------------------------------------------------------

    fn on_media_request(&mut self, call: Box<dyn MediaChannel>) {
        let peer = call.peer().clone();
        if let Err(e) = self.transport.answer_media(call.as_ref(), self.source.as_ref()) {
            warn!(peer = %peer, error = %e, "Failed to answer media call");
            self.events
                .error(ErrorKind::PeerUnreachable, format!("{peer} (media): {e}"));
            close_media(call.as_ref());
            return;
        }

        debug!(peer = %peer, channel = %call.id(), with_audio = self.source.is_some(), "Answered media call");
        let session = self.registry.upsert(&peer);
        if let Some(old) = session.set_media_in(call) {
            close_media(old.as_ref());
        }
    }

    fn on_media_stream(&mut self, peer: &PeerId, channel: ChannelId, stream: &RemoteStream) {
        let Some(session) = self.registry.get_mut(peer) else {
            return;
        };
        if !session.tracks_media(channel) || session.has_sink() {
            trace!(peer = %peer, channel = %channel, "Ignoring extra remote stream");
            return;
        }

        match self.media.create_sink(stream) {
            Ok(sink) => {
                if let Err(sink) = session.attach_sink(channel, sink) {
                    self.media.destroy_sink(sink);
                }
                debug!(peer = %peer, stream = stream.id(), "Playing remote stream");
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "Cannot play remote stream");
                self.events
                    .error(ErrorKind::PeerUnreachable, format!("{peer} (audio): {e}"));
            }
        }
    }

    fn on_media_closed(&mut self, peer: &PeerId, channel: ChannelId, error: Option<String>) {
        let Some(session) = self.registry.get_mut(peer) else {
            return;
        };
        if !session.detach_media(channel, self.media.as_ref()) {
            return;
        }
        if let Some(detail) = error {
            warn!(peer = %peer, error = %detail, "Media channel failed");
            self.events.log(format!("Audio with {peer} dropped: {detail}"));
        }
        if session.is_detached() {
            self.registry.remove(peer);
        }
    }

    // -----------------------------------------------------------------------
    // Backend
    // -----------------------------------------------------------------------

    async fn on_backend_disconnected(&mut self, reason: &str) {
        warn!(reason, "Signaling backend lost, reconnecting");
        self.events.log(format!("Signaling lost: {reason}"));
        match self.transport.reconnect().await {
            Ok(()) => {
                info!("Signaling backend restored");
                self.events.log("Signaling restored");
            }
            Err(e) => {
                warn!(error = %e, "Reconnect failed");
                self.events
                    .error(ErrorKind::RegistrationFailed, format!("reconnect: {e}"));
            }
        }
    }
}

/// Drop an event from an abandoned registration, closing any channel it
/// hands over.
fn discard(envelope: Envelope) {
    trace!(attempt = envelope.attempt, "Dropping stale transport event");
    match envelope.event {
        TransportEvent::ConnectionRequest(channel) => close_control(channel.as_ref()),
        TransportEvent::MediaRequest(call) => close_media(call.as_ref()),
        _ => {}
    }
}

fn close_control(channel: &dyn ControlChannel) {
    if let Err(e) = channel.close() {
        debug!(channel = %channel.id(), error = %e, "Close failed");
    }
}

fn close_media(channel: &dyn MediaChannel) {
    if let Err(e) = channel.close() {
        debug!(channel = %channel.id(), error = %e, "Close failed");
    }
}
