//! Error types for the mesh, its collaborators, and the wire protocol.

use std::time::Duration;

use walkie_common::{ChannelId, ErrorKind, PeerId, WalkieError};

/// Failures reported by a `TransportProvider` or one of its channels.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("not registered with the transport")]
    NotRegistered,

    #[error("registration rejected: {0}")]
    Rejected(String),

    #[error("identifier {0} is already taken")]
    IdTaken(PeerId),

    #[error("peer {0} is unreachable")]
    PeerUnreachable(PeerId),

    #[error("channel {0} is closed")]
    ChannelClosed(ChannelId),

    #[error("unknown channel {0}")]
    UnknownChannel(ChannelId),

    #[error("backend unavailable: {0}")]
    Backend(String),
}

/// Failures reported by a `MediaCapability`.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("microphone access denied")]
    AccessDenied,

    #[error("no audio device: {0}")]
    NoDevice(String),

    #[error("cannot play remote stream: {0}")]
    Sink(String),
}

/// Control payloads that could not be decoded or encoded.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("control record is not an object")]
    NotAnObject,

    #[error("control record has no string `type` field")]
    MissingType,

    #[error("invalid fields for `{kind}` message: {source}")]
    InvalidFields {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode control message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure of `MeshManager::connect`.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("already connected")]
    AlreadyConnected,

    #[error("registration failed: {reason}")]
    RegistrationFailed { reason: String },

    #[error("registration timed out after {after:?}")]
    RegistrationTimeout { after: Duration },
}

impl ConnectError {
    /// Kind reported on the event bus, if this failure is reported at all.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ConnectError::AlreadyConnected => None,
            ConnectError::RegistrationFailed { .. } => Some(ErrorKind::RegistrationFailed),
            ConnectError::RegistrationTimeout { .. } => Some(ErrorKind::RegistrationTimeout),
        }
    }
}

/// Rejections and failures of the other `MeshManager` operations.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("not connected")]
    NotConnected,

    #[error("cannot dial the local endpoint")]
    SelfDial,

    #[error("already connected to {0}")]
    AlreadyConnectedTo(PeerId),

    #[error("peer {peer} is unreachable: {source}")]
    PeerUnreachable {
        peer: PeerId,
        #[source]
        source: TransportError,
    },

    #[error("display name must not be empty")]
    EmptyName,

    #[error("display name is unchanged")]
    UnchangedName,

    #[error("display name is longer than {max} characters")]
    NameTooLong { max: usize },

    #[error("no local audio source, receive-only mode")]
    ReceiveOnly,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<MeshError> for WalkieError {
    fn from(err: MeshError) -> Self {
        WalkieError::Mesh(err.to_string())
    }
}

impl From<ConnectError> for WalkieError {
    fn from(err: ConnectError) -> Self {
        WalkieError::Mesh(err.to_string())
    }
}
