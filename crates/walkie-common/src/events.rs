use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::errors::ErrorKind;
use crate::id::PeerId;

/// One remote participant as shown in the participant list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub peer_id: PeerId,
    pub display_name: String,
    pub is_talking: bool,
}

/// Observable events raised by the mesh for UI glue and log sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    ConnectedChanged(bool),
    PresenceChanged(Vec<Participant>),
    LocalTalkingChanged(bool),
    /// Diagnostic trail entry.
    Log(String),
    Error {
        kind: ErrorKind,
        detail: String,
    },
    #[serde(other)]
    Unknown,
}

pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Publish to all current subscribers. Returns how many received it.
    pub fn publish(&self, event: Event) -> usize {
        match self.sender.send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(?event, "event dropped, no subscribers");
                0
            }
        }
    }

    pub fn log(&self, message: impl Into<String>) -> usize {
        self.publish(Event::Log(message.into()))
    }

    pub fn error(&self, kind: ErrorKind, detail: impl Into<String>) -> usize {
        self.publish(Event::Error {
            kind,
            detail: detail.into(),
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(Event::ConnectedChanged(true));

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::ConnectedChanged(true)));
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(Event::LocalTalkingChanged(false));

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert!(matches!(e1, Event::LocalTalkingChanged(false)));
        assert!(matches!(e2, Event::LocalTalkingChanged(false)));
    }

    #[tokio::test]
    async fn presence_log_and_error_events() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(Event::PresenceChanged(vec![Participant {
            peer_id: PeerId::from("p2"),
            display_name: "Carlos".into(),
            is_talking: true,
        }]));
        bus.log("dialing p3");
        bus.error(ErrorKind::PeerUnreachable, "p3 did not answer");

        let e1 = rx.recv().await.unwrap();
        assert!(
            matches!(e1, Event::PresenceChanged(ref list) if list.len() == 1 && list[0].display_name == "Carlos")
        );

        let e2 = rx.recv().await.unwrap();
        assert!(matches!(e2, Event::Log(ref msg) if msg == "dialing p3"));

        let e3 = rx.recv().await.unwrap();
        assert!(matches!(
            e3,
            Event::Error { kind: ErrorKind::PeerUnreachable, ref detail } if detail == "p3 did not answer"
        ));
    }

    #[test]
    fn publish_returns_zero_with_no_subscribers() {
        let bus = EventBus::new(16);
        let count = bus.publish(Event::ConnectedChanged(false));
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn publish_returns_subscriber_count() {
        let bus = EventBus::new(16);
        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        let _rx3 = bus.subscribe();

        let count = bus.log("hello");
        assert_eq!(count, 3);
    }

    #[test]
    fn unknown_event_deserializes() {
        let json = r#"{"type":"SomeNewEventWeNeverHeardOf","data":null}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(matches!(event, Event::Unknown));
    }

    #[test]
    fn error_event_serializes_kind_in_snake_case() {
        let event = Event::Error {
            kind: ErrorKind::MalformedMessage,
            detail: "missing type".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"malformed_message\""));
        assert!(json.contains("\"type\":\"Error\""));
    }
}
