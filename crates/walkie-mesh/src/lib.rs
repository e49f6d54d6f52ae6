//! Peer-mesh session manager for half-duplex voice channels.
//!
//! Keeps one session per remote peer over an abstract transport, speaks a
//! small JSON signaling vocabulary on each control channel, and enforces
//! push-to-talk semantics across the mesh. Media capture, playback, and
//! NAT traversal live behind the `TransportProvider`, `MediaCapability`
//! and `CuePlayer` traits.

pub mod config;
pub mod cues;
pub mod error;
pub mod log_sink;
pub mod manager;
pub mod media;
pub mod protocol;
pub mod session;
pub mod signaling;
pub mod talk;
pub mod transport;

pub use config::MeshConfig;
pub use error::{ConnectError, MediaError, MeshError, ProtocolError, TransportError};
pub use log_sink::spawn_log_sink;
pub use manager::{LocalState, MeshManager};
pub use media::{AudioSink, AudioSource, Cue, CuePlayer, MediaCapability, RemoteStream};
pub use protocol::{ControlMessage, Decoded};
pub use session::{Registry, Session, SessionPhase};
pub use transport::{
    ControlChannel, Envelope, EventSink, MediaChannel, TransportEvent, TransportProvider,
};

pub use walkie_common::{ChannelId, ErrorKind, Event, Participant, PeerId};
