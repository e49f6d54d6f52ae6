//! Sending control messages and applying received ones to a session.

use tracing::{debug, warn};
use walkie_common::PeerId;

use crate::cues::Cues;
use crate::error::{MeshError, TransportError};
use crate::media::Cue;
use crate::protocol::{self, ControlMessage};
use crate::session::{Registry, Session};
use crate::transport::ControlChannel;

pub fn send_message(channel: &dyn ControlChannel, message: &ControlMessage) -> Result<(), MeshError> {
    let record = protocol::encode(message)?;
    channel.send(record)?;
    Ok(())
}

/// Result of a fan-out to every session.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Sessions without an open control channel.
    pub skipped: usize,
    pub failed: Vec<(PeerId, TransportError)>,
}

/// Send `message` to every session whose control channel reports open.
///
/// A failed send is logged and recorded; it never stops the fan-out.
pub fn broadcast(registry: &Registry, message: &ControlMessage) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    let record = match protocol::encode(message) {
        Ok(record) => record,
        Err(e) => {
            warn!(kind = message.kind(), error = %e, "Failed to encode broadcast");
            return report;
        }
    };

    for session in registry.iter() {
        let Some(control) = session.control().filter(|c| c.is_open()) else {
            report.skipped += 1;
            continue;
        };
        match control.send(record.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(peer = %session.peer_id(), kind = message.kind(), error = %e, "Broadcast send failed");
                report.failed.push((session.peer_id().clone(), e));
            }
        }
    }

    debug!(
        kind = message.kind(),
        delivered = report.delivered,
        skipped = report.skipped,
        failed = report.failed.len(),
        "Broadcast"
    );
    report
}

/// Apply a received message to the sender's session and return a line
/// for the event log.
///
/// `static_busy` is set when someone else still needs the static cue, in
/// which case a `talk-stop` leaves it running.
pub(crate) fn apply(session: &mut Session, message: ControlMessage, cues: &Cues, static_busy: bool) -> String {
    match message {
        ControlMessage::Identity { name } => {
            let line = format!("{} joined as {name}", session.peer_id());
            session.set_display_name(name);
            line
        }
        ControlMessage::NameChange { old_name, new_name } => {
            let line = format!("{old_name} is now {new_name}");
            session.set_display_name(new_name);
            line
        }
        ControlMessage::TalkStart { name } => {
            if !session.is_talking() {
                cues.play(Cue::StartTone);
                session.set_talking(true, cues.schedule_static());
            }
            format!("{name} is talking")
        }
        ControlMessage::TalkStop { name } => {
            if session.is_talking() {
                session.set_talking(false, None);
                if !static_busy {
                    cues.stop(Cue::Static);
                }
                cues.play(Cue::EndTone);
            }
            format!("{name} stopped talking")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::media::memory::{CueAction, MemoryMedia, RecordingCues};
    use crate::transport::memory::MemoryHub;
    use crate::transport::{EventSink, TransportProvider};
    use tokio::sync::mpsc;

    fn cues(player: &Arc<RecordingCues>) -> Cues {
        Cues::new(player.clone(), true, Duration::from_millis(300))
    }

    #[tokio::test(start_paused = true)]
    async fn talk_start_then_stop_before_delay_never_plays_static() {
        let player = Arc::new(RecordingCues::new());
        let cues = cues(&player);
        let mut session = Session::new(PeerId::from("p2"), "Usuario");

        apply(&mut session, ControlMessage::TalkStart { name: "Ana".into() }, &cues, false);
        assert!(session.is_talking());
        tokio::time::sleep(Duration::from_millis(100)).await;

        apply(&mut session, ControlMessage::TalkStop { name: "Ana".into() }, &cues, false);
        assert!(!session.is_talking());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(player.count(CueAction::Play(Cue::Static)), 0);
        assert_eq!(
            player.actions(),
            vec![
                CueAction::Play(Cue::StartTone),
                CueAction::Stop(Cue::Static),
                CueAction::Play(Cue::EndTone),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn static_loops_after_delay_and_stops_on_talk_stop() {
        let player = Arc::new(RecordingCues::new());
        let cues = cues(&player);
        let mut session = Session::new(PeerId::from("p2"), "Usuario");

        apply(&mut session, ControlMessage::TalkStart { name: "Ana".into() }, &cues, false);
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(player.is_playing(Cue::Static));

        apply(&mut session, ControlMessage::TalkStop { name: "Ana".into() }, &cues, false);
        assert!(!player.is_playing(Cue::Static));
    }

    #[tokio::test(start_paused = true)]
    async fn busy_static_survives_talk_stop() {
        let player = Arc::new(RecordingCues::new());
        let cues = cues(&player);
        let mut session = Session::new(PeerId::from("p2"), "Usuario");

        apply(&mut session, ControlMessage::TalkStart { name: "Ana".into() }, &cues, false);
        tokio::time::sleep(Duration::from_millis(400)).await;
        apply(&mut session, ControlMessage::TalkStop { name: "Ana".into() }, &cues, true);
        assert!(player.is_playing(Cue::Static));
    }

    #[test]
    fn identity_and_rename_update_display_name() {
        let player = Arc::new(RecordingCues::new());
        let cues = Cues::new(player.clone(), false, Duration::ZERO);
        let mut session = Session::new(PeerId::from("p2"), "Usuario");

        let line = apply(&mut session, ControlMessage::Identity { name: "Carlos".into() }, &cues, false);
        assert_eq!(session.display_name(), "Carlos");
        assert_eq!(line, "p2 joined as Carlos");

        apply(
            &mut session,
            ControlMessage::NameChange {
                old_name: "Carlos".into(),
                new_name: "Charly".into(),
            },
            &cues,
            false,
        );
        assert_eq!(session.display_name(), "Charly");
    }

    #[tokio::test]
    async fn broadcast_skips_sessions_without_open_control() {
        let hub = MemoryHub::new();
        let a = hub.endpoint_with_id("a");
        let b = hub.endpoint_with_id("b");
        let (tx, _rx) = mpsc::unbounded_channel();
        a.register(None, EventSink::new(1, tx.clone())).await.unwrap();
        b.register(None, EventSink::new(1, tx)).await.unwrap();

        let mut registry = Registry::new("Usuario", Arc::new(MemoryMedia::new()));
        let b_id = PeerId::from("b");
        let session = registry.upsert(&b_id);
        session.replace_control(a.open_control_channel(&b_id).unwrap(), true);
        session.mark_open();
        registry.upsert(&PeerId::from("c"));

        let report = broadcast(&registry, &ControlMessage::TalkStart { name: "A".into() });
        assert_eq!(report.delivered, 1);
        assert_eq!(report.skipped, 1);
        assert!(report.failed.is_empty());
        assert_eq!(hub.sent_by(&PeerId::from("a"), "talk-start").len(), 1);
    }

    #[derive(Debug)]
    struct RefusingChannel(PeerId);

    impl ControlChannel for RefusingChannel {
        fn id(&self) -> walkie_common::ChannelId {
            walkie_common::ChannelId(99)
        }
        fn peer(&self) -> &PeerId {
            &self.0
        }
        fn is_open(&self) -> bool {
            true
        }
        fn send(&self, _record: serde_json::Value) -> Result<(), TransportError> {
            Err(TransportError::PeerUnreachable(self.0.clone()))
        }
        fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn broadcast_continues_past_failures() {
        let hub = MemoryHub::new();
        let a = hub.endpoint_with_id("a");
        let c = hub.endpoint_with_id("c");
        let (tx, _rx) = mpsc::unbounded_channel();
        a.register(None, EventSink::new(1, tx.clone())).await.unwrap();
        c.register(None, EventSink::new(1, tx)).await.unwrap();

        let mut registry = Registry::new("Usuario", Arc::new(MemoryMedia::new()));
        let b_id = PeerId::from("b");
        let session = registry.upsert(&b_id);
        session.replace_control(Box::new(RefusingChannel(b_id.clone())), true);
        session.mark_open();

        let c_id = PeerId::from("c");
        let session = registry.upsert(&c_id);
        session.replace_control(a.open_control_channel(&c_id).unwrap(), true);
        session.mark_open();

        let report = broadcast(&registry, &ControlMessage::TalkStop { name: "A".into() });
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, b_id);
        assert_eq!(hub.sent_by(&PeerId::from("a"), "talk-stop").len(), 1);
    }
}
