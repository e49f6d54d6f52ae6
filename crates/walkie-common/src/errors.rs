use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("config write error: {0}")]
    WriteError(String),
}

/// Failure categories reported to the UI through `Event::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Local audio source unavailable; the session continues receive-only.
    MediaAccessDenied,
    RegistrationFailed,
    RegistrationTimeout,
    /// A dial or media call to one peer failed.
    PeerUnreachable,
    /// Mid-session fault on one peer's channel.
    ChannelError,
    /// Control payload that could not be decoded.
    MalformedMessage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MediaAccessDenied => "media_access_denied",
            ErrorKind::RegistrationFailed => "registration_failed",
            ErrorKind::RegistrationTimeout => "registration_timeout",
            ErrorKind::PeerUnreachable => "peer_unreachable",
            ErrorKind::ChannelError => "channel_error",
            ErrorKind::MalformedMessage => "malformed_message",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WalkieError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("mesh error: {0}")]
    Mesh(String),
}
