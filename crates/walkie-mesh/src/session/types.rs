use walkie_common::{ChannelId, Participant, PeerId};

use tracing::warn;

use crate::cues::ScheduledCue;
use crate::media::{AudioSink, MediaCapability};
use crate::transport::{ControlChannel, MediaChannel};

/// Lifecycle of a session. Only `Pending`, `Open` and `Closing` sessions
/// live in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Pending,
    Open,
    Closing,
    Closed,
}

/// Everything known about one remote peer.
#[derive(Debug)]
pub struct Session {
    peer_id: PeerId,
    control: Option<Box<dyn ControlChannel>>,
    control_outbound: bool,
    media_out: Option<Box<dyn MediaChannel>>,
    media_in: Option<Box<dyn MediaChannel>>,
    sink: Option<(ChannelId, AudioSink)>,
    display_name: String,
    is_talking: bool,
    phase: SessionPhase,
    static_cue: Option<ScheduledCue>,
}

impl Session {
    pub(crate) fn new(peer_id: PeerId, placeholder_name: &str) -> Self {
        Self {
            peer_id,
            control: None,
            control_outbound: false,
            media_out: None,
            media_in: None,
            sink: None,
            display_name: placeholder_name.to_string(),
            is_talking: false,
            phase: SessionPhase::Pending,
            static_cue: None,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_talking(&self) -> bool {
        self.is_talking
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn control(&self) -> Option<&dyn ControlChannel> {
        self.control.as_deref()
    }

    pub fn control_id(&self) -> Option<ChannelId> {
        self.control.as_ref().map(|c| c.id())
    }

    /// Whether the tracked control channel was dialled by this side.
    pub fn control_is_outbound(&self) -> bool {
        self.control.is_some() && self.control_outbound
    }

    pub fn has_open_control(&self) -> bool {
        self.phase == SessionPhase::Open && self.control.as_ref().is_some_and(|c| c.is_open())
    }

    pub fn has_media_out(&self) -> bool {
        self.media_out.is_some()
    }

    pub fn has_media_in(&self) -> bool {
        self.media_in.is_some()
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// No channel of any kind is tracked.
    pub fn is_detached(&self) -> bool {
        self.control.is_none() && self.media_out.is_none() && self.media_in.is_none()
    }

    pub fn participant(&self) -> Participant {
        Participant {
            peer_id: self.peer_id.clone(),
            display_name: self.display_name.clone(),
            is_talking: self.is_talking,
        }
    }

    // -----------------------------------------------------------------------
    // Mutation, crate-internal
    // -----------------------------------------------------------------------

    /// Track `channel` as the control channel, handing back the one it
    /// supersedes. The session drops back to `Pending` until it opens.
    pub(crate) fn replace_control(
        &mut self,
        channel: Box<dyn ControlChannel>,
        outbound: bool,
    ) -> Option<Box<dyn ControlChannel>> {
        self.control_outbound = outbound;
        if self.phase == SessionPhase::Open {
            self.phase = SessionPhase::Pending;
        }
        self.control.replace(channel)
    }

    pub(crate) fn set_media_out(&mut self, channel: Box<dyn MediaChannel>) -> Option<Box<dyn MediaChannel>> {
        self.media_out.replace(channel)
    }

    pub(crate) fn set_media_in(&mut self, channel: Box<dyn MediaChannel>) -> Option<Box<dyn MediaChannel>> {
        self.media_in.replace(channel)
    }

    /// Whether `channel` is one of the tracked media channels.
    pub(crate) fn tracks_media(&self, channel: ChannelId) -> bool {
        self.media_out.as_ref().is_some_and(|m| m.id() == channel)
            || self.media_in.as_ref().is_some_and(|m| m.id() == channel)
    }

    /// Forget the media channel with this id and destroy its sink.
    /// Returns false if the channel was not tracked.
    pub(crate) fn detach_media(&mut self, channel: ChannelId, media: &dyn MediaCapability) -> bool {
        let detached = if self.media_out.as_ref().is_some_and(|m| m.id() == channel) {
            self.media_out.take()
        } else if self.media_in.as_ref().is_some_and(|m| m.id() == channel) {
            self.media_in.take()
        } else {
            None
        };
        let Some(detached) = detached else {
            return false;
        };
        if let Err(e) = detached.close() {
            warn!(peer = %self.peer_id, channel = %channel, error = %e, "Failed to close media channel");
        }
        if self.sink.as_ref().is_some_and(|(id, _)| *id == channel) {
            if let Some((_, sink)) = self.sink.take() {
                media.destroy_sink(sink);
            }
        }
        true
    }

    /// Attach a sink for a stream on `channel`. Returns the sink back if
    /// this session already has one.
    pub(crate) fn attach_sink(&mut self, channel: ChannelId, sink: AudioSink) -> Result<(), AudioSink> {
        if self.sink.is_some() {
            return Err(sink);
        }
        self.sink = Some((channel, sink));
        Ok(())
    }

    /// `Pending -> Open`. Returns false from any other phase.
    pub(crate) fn mark_open(&mut self) -> bool {
        if self.phase != SessionPhase::Pending {
            return false;
        }
        self.phase = SessionPhase::Open;
        true
    }

    pub(crate) fn begin_closing(&mut self) {
        if self.phase != SessionPhase::Closed {
            self.phase = SessionPhase::Closing;
        }
    }

    pub(crate) fn set_display_name(&mut self, name: String) {
        self.display_name = name;
    }

    /// Record the remote talking flag, swapping the remote static cue.
    pub(crate) fn set_talking(&mut self, talking: bool, static_cue: Option<ScheduledCue>) {
        self.is_talking = talking;
        self.static_cue = static_cue;
    }

    /// Close every channel, destroy the sink and drop any pending cue.
    /// Close failures are logged and do not stop the teardown.
    pub(crate) fn teardown(&mut self, media: &dyn MediaCapability) {
        self.begin_closing();
        self.static_cue = None;

        if let Some(control) = self.control.take() {
            if let Err(e) = control.close() {
                warn!(peer = %self.peer_id, error = %e, "Failed to close control channel");
            }
        }
        for channel in [self.media_out.take(), self.media_in.take()].into_iter().flatten() {
            if let Err(e) = channel.close() {
                warn!(peer = %self.peer_id, error = %e, "Failed to close media channel");
            }
        }
        if let Some((_, sink)) = self.sink.take() {
            media.destroy_sink(sink);
        }

        self.is_talking = false;
        self.phase = SessionPhase::Closed;
    }
}
