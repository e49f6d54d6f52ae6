//! Forwards mesh events to `tracing`.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use walkie_common::Event;

/// Spawn a task that logs every event from `rx` under `label` until the
/// bus closes.
pub fn spawn_log_sink(label: impl Into<String>, mut rx: broadcast::Receiver<Event>) -> JoinHandle<()> {
    let label = label.into();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&label, &event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(peer = %label, skipped, "Log sink lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!(peer = %label, "Log sink stopped");
    })
}

fn log_event(label: &str, event: &Event) {
    match event {
        Event::Log(line) => info!(peer = %label, "{line}"),
        Event::Error { kind, detail } => warn!(peer = %label, %kind, "{detail}"),
        Event::ConnectedChanged(connected) => debug!(peer = %label, connected, "Connection state"),
        Event::LocalTalkingChanged(talking) => debug!(peer = %label, talking, "Local talk state"),
        Event::PresenceChanged(list) => debug!(peer = %label, participants = list.len(), "Presence"),
        Event::Unknown => {}
    }
}
