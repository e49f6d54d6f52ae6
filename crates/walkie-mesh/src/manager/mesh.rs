//! Operations invoked by UI glue.

use tracing::{debug, info, warn};
use walkie_common::{ErrorKind, Event, PeerId};

use super::MeshManager;
use crate::error::{ConnectError, MeshError};
use crate::media::Cue;
use crate::protocol::ControlMessage;
use crate::signaling;
use crate::transport::EventSink;

impl MeshManager {
    /// Register with the transport and start honouring its events.
    ///
    /// A missing microphone is not fatal: the manager connects in
    /// receive-only mode and reports `MediaAccessDenied`.
    pub async fn connect(&mut self) -> Result<PeerId, ConnectError> {
        if self.local.connected {
            return Err(ConnectError::AlreadyConnected);
        }

        let source = match self.media.acquire_local_audio_source().await {
            Ok(source) => Some(source),
            Err(e) => {
                warn!(error = %e, "No local audio source, continuing receive-only");
                self.events.error(ErrorKind::MediaAccessDenied, e.to_string());
                None
            }
        };

        self.attempts += 1;
        let attempt = self.attempts;
        let sink = EventSink::new(attempt, self.inbox_tx.clone());
        let candidate = PeerId::candidate(&self.config.channel_name);
        let limit = self.config.registration_timeout;
        debug!(attempt, candidate = %candidate, "Registering");

        let err = match tokio::time::timeout(limit, self.transport.register(Some(candidate), sink)).await {
            Ok(Ok(id)) => {
                self.local.receive_only = source.is_none();
                self.local.identity = Some(id.clone());
                self.local.connected = true;
                self.source = source;
                self.active_attempt = Some(attempt);

                info!(peer = %id, receive_only = self.local.receive_only, "Connected");
                self.events.publish(Event::ConnectedChanged(true));
                self.events.log(format!("Connected as {id}"));
                return Ok(id);
            }
            Ok(Err(e)) => ConnectError::RegistrationFailed {
                reason: e.to_string(),
            },
            Err(_) => {
                // The provider may still complete later; make sure it doesn't.
                self.transport.destroy();
                ConnectError::RegistrationTimeout { after: limit }
            }
        };

        if let Some(source) = source {
            self.media.release_local_audio_source(source);
        }
        warn!(error = %err, "Connect failed");
        if let Some(kind) = err.kind() {
            self.events.error(kind, err.to_string());
        }
        Err(err)
    }

    /// Leave the mesh. Safe to call at any time, any number of times.
    pub fn disconnect(&mut self) {
        let was_connected = self.local.connected;
        let was_talking = self.local.is_talking;
        let remote_talking = self.registry.iter().any(|s| s.is_talking());

        self.talk.reset();
        self.local.is_talking = false;
        if was_talking || remote_talking {
            self.cues.stop(Cue::Static);
        }

        self.registry.clear();
        if let Some(source) = self.source.take() {
            self.media.release_local_audio_source(source);
        }
        if was_connected {
            self.transport.destroy();
        }

        self.active_attempt = None;
        self.local.connected = false;
        self.local.receive_only = false;
        let identity = self.local.identity.take();

        if was_connected {
            info!(peer = ?identity, "Disconnected");
            if was_talking {
                self.events.publish(Event::LocalTalkingChanged(false));
            }
            self.publish_presence();
            self.events.publish(Event::ConnectedChanged(false));
            self.events.log("Disconnected");
        }
    }

    /// Open control (and, with a microphone, media) channels to `target`.
    pub fn dial_peer(&mut self, target: &PeerId) -> Result<(), MeshError> {
        if !self.local.connected {
            return Err(MeshError::NotConnected);
        }
        if self.local.is_local(target) {
            return Err(MeshError::SelfDial);
        }
        if self
            .registry
            .get(target)
            .and_then(|s| s.control())
            .is_some_and(|c| c.is_open())
        {
            return Err(MeshError::AlreadyConnectedTo(target.clone()));
        }

        let control = match self.transport.open_control_channel(target) {
            Ok(control) => control,
            Err(e) => {
                warn!(peer = %target, error = %e, "Dial failed");
                self.events
                    .error(ErrorKind::PeerUnreachable, format!("{target}: {e}"));
                return Err(MeshError::PeerUnreachable {
                    peer: target.clone(),
                    source: e,
                });
            }
        };
        let media = self
            .source
            .as_ref()
            .map(|source| self.transport.open_media_channel(target, source));

        let session = self.registry.upsert(target);
        if let Some(old) = session.replace_control(control, true) {
            if let Err(e) = old.close() {
                debug!(peer = %target, error = %e, "Superseded control channel already closed");
            }
        }
        match media {
            Some(Ok(channel)) => {
                if let Some(old) = session.set_media_out(channel) {
                    if let Err(e) = old.close() {
                        debug!(peer = %target, error = %e, "Superseded media channel already closed");
                    }
                }
            }
            Some(Err(e)) => {
                warn!(peer = %target, error = %e, "Media dial failed");
                self.events
                    .error(ErrorKind::PeerUnreachable, format!("{target} (media): {e}"));
            }
            None => {}
        }

        info!(peer = %target, "Dialling");
        self.events.log(format!("Dialling {target}"));
        Ok(())
    }

    /// Change the local display name, telling connected peers.
    pub fn set_display_name(&mut self, name: &str) -> Result<(), MeshError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MeshError::EmptyName);
        }
        if name == self.local.display_name {
            return Err(MeshError::UnchangedName);
        }
        let max = self.config.max_name_len;
        if name.chars().count() > max {
            return Err(MeshError::NameTooLong { max });
        }

        let old_name = std::mem::replace(&mut self.local.display_name, name.to_string());
        info!(old = %old_name, new = %name, "Display name changed");
        if self.local.connected {
            signaling::broadcast(
                &self.registry,
                &ControlMessage::NameChange {
                    old_name: old_name.clone(),
                    new_name: name.to_string(),
                },
            );
        }
        self.events.log(format!("{old_name} is now {name}"));
        Ok(())
    }

    /// Begin transmitting. `Ok(false)` when already talking.
    pub fn start_talking(&mut self) -> Result<bool, MeshError> {
        if !self.local.connected {
            return Err(MeshError::NotConnected);
        }
        let Some(source) = self.source.as_ref() else {
            return Err(MeshError::ReceiveOnly);
        };

        let Some(report) = self.talk.start(
            &mut self.local,
            &mut self.registry,
            self.transport.as_ref(),
            source,
            &self.cues,
        ) else {
            return Ok(false);
        };

        for (peer, e) in &report.dial_failures {
            self.events
                .error(ErrorKind::PeerUnreachable, format!("{peer} (media): {e}"));
        }
        self.events.publish(Event::LocalTalkingChanged(true));
        Ok(true)
    }

    /// Stop transmitting. Returns false when not talking.
    pub fn stop_talking(&mut self) -> bool {
        let remote_talking = self.registry.iter().any(|s| s.is_talking());
        if self
            .talk
            .stop(&mut self.local, &self.registry, &self.cues, remote_talking)
            .is_none()
        {
            return false;
        }
        self.events.publish(Event::LocalTalkingChanged(false));
        true
    }
}
