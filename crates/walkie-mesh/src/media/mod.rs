//! Media capability: local capture, remote playback and radio cues.
//!
//! Handles are opaque ids minted by the capability. `AudioSource` and
//! `AudioSink` are deliberately not `Clone`: releasing or destroying one
//! consumes it, so each is given back exactly once.

pub mod memory;

use async_trait::async_trait;

use crate::error::MediaError;

/// Local microphone capture.
#[derive(Debug, PartialEq, Eq)]
pub struct AudioSource {
    id: u64,
}

impl AudioSource {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Playback of one remote stream.
#[derive(Debug, PartialEq, Eq)]
pub struct AudioSink {
    id: u64,
}

impl AudioSink {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A remote audio stream as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    id: u64,
}

impl RemoteStream {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

#[async_trait]
pub trait MediaCapability: Send + Sync {
    async fn acquire_local_audio_source(&self) -> Result<AudioSource, MediaError>;

    /// Stop hardware capture.
    fn release_local_audio_source(&self, source: AudioSource);

    fn create_sink(&self, stream: &RemoteStream) -> Result<AudioSink, MediaError>;

    fn destroy_sink(&self, sink: AudioSink);
}

// ---------------------------------------------------------------------------
// Cues
// ---------------------------------------------------------------------------

/// Radio sound effects played around a transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    StartTone,
    /// Looping background noise while someone transmits.
    Static,
    EndTone,
}

pub trait CuePlayer: Send + Sync {
    fn play(&self, cue: Cue);

    fn stop(&self, cue: Cue);
}
