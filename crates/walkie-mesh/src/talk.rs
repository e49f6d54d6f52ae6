//! Local push-to-talk state.
//!
//! Start and stop strictly alternate; a redundant call returns `None` and
//! touches nothing.

use tracing::{info, warn};
use walkie_common::PeerId;

use crate::cues::{Cues, ScheduledCue};
use crate::error::TransportError;
use crate::manager::LocalState;
use crate::media::{AudioSource, Cue};
use crate::protocol::ControlMessage;
use crate::session::Registry;
use crate::signaling::{self, BroadcastReport};
use crate::transport::TransportProvider;

/// What a `start` did beyond flipping the flag.
#[derive(Debug, Default)]
pub struct TalkReport {
    pub broadcast: BroadcastReport,
    /// Peers that got a fresh outbound media channel.
    pub dialled: Vec<PeerId>,
    pub dial_failures: Vec<(PeerId, TransportError)>,
}

#[derive(Debug, Default)]
pub(crate) struct TalkCoordinator {
    static_cue: Option<ScheduledCue>,
}

impl TalkCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(
        &mut self,
        local: &mut LocalState,
        registry: &mut Registry,
        transport: &dyn TransportProvider,
        source: &AudioSource,
        cues: &Cues,
    ) -> Option<TalkReport> {
        if local.is_talking {
            return None;
        }
        local.is_talking = true;
        cues.play(Cue::StartTone);
        self.static_cue = cues.schedule_static();

        let mut report = TalkReport {
            broadcast: signaling::broadcast(
                registry,
                &ControlMessage::TalkStart {
                    name: local.display_name.clone(),
                },
            ),
            ..TalkReport::default()
        };

        // Lazy dial: every open session without our stream gets one now.
        for session in registry.iter_mut() {
            if !session.has_open_control() || session.has_media_out() {
                continue;
            }
            let peer = session.peer_id().clone();
            match transport.open_media_channel(&peer, source) {
                Ok(channel) => {
                    session.set_media_out(channel);
                    report.dialled.push(peer);
                }
                Err(e) => {
                    warn!(peer = %peer, error = %e, "Lazy media dial failed");
                    report.dial_failures.push((peer, e));
                }
            }
        }

        info!(
            peers = report.broadcast.delivered,
            dialled = report.dialled.len(),
            "Started talking"
        );
        Some(report)
    }

    /// `static_busy` is set when a remote peer is still transmitting.
    pub(crate) fn stop(
        &mut self,
        local: &mut LocalState,
        registry: &Registry,
        cues: &Cues,
        static_busy: bool,
    ) -> Option<BroadcastReport> {
        if !local.is_talking {
            return None;
        }
        local.is_talking = false;
        self.static_cue = None;
        if !static_busy {
            cues.stop(Cue::Static);
        }
        cues.play(Cue::EndTone);

        let report = signaling::broadcast(
            registry,
            &ControlMessage::TalkStop {
                name: local.display_name.clone(),
            },
        );
        info!(peers = report.delivered, "Stopped talking");
        Some(report)
    }

    /// Drop any pending cue without broadcasting.
    pub(crate) fn reset(&mut self) {
        self.static_cue = None;
    }
}
