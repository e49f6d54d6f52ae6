//! In-process media capability and cue player.
//!
//! No audio is captured or played; handles are bookkept so callers can
//! check that every source and sink is given back.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::error::MediaError;

use super::{AudioSink, AudioSource, Cue, CuePlayer, MediaCapability, RemoteStream};

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MediaState {
    next_id: u64,
    deny_access: bool,
    live_sources: HashSet<u64>,
    released: Vec<u64>,
    live_sinks: HashSet<u64>,
    fail_sinks: bool,
}

/// Bookkeeping media capability for tests and the demo binary.
#[derive(Default)]
pub struct MemoryMedia {
    state: Mutex<MediaState>,
}

impl MemoryMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capability whose microphone is never available.
    pub fn denied() -> Self {
        let media = Self::default();
        media.set_deny_access(true);
        media
    }

    pub fn set_deny_access(&self, deny: bool) {
        self.lock().deny_access = deny;
    }

    pub fn set_fail_sinks(&self, fail: bool) {
        self.lock().fail_sinks = fail;
    }

    /// Sources acquired and not yet released.
    pub fn live_sources(&self) -> usize {
        self.lock().live_sources.len()
    }

    /// Every release, in order, including double releases.
    pub fn released(&self) -> Vec<u64> {
        self.lock().released.clone()
    }

    pub fn live_sinks(&self) -> usize {
        self.lock().live_sinks.len()
    }

    fn lock(&self) -> MutexGuard<'_, MediaState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MediaCapability for MemoryMedia {
    async fn acquire_local_audio_source(&self) -> Result<AudioSource, MediaError> {
        let mut state = self.lock();
        if state.deny_access {
            return Err(MediaError::AccessDenied);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.live_sources.insert(id);
        debug!(source = id, "Acquired local audio source");
        Ok(AudioSource::new(id))
    }

    fn release_local_audio_source(&self, source: AudioSource) {
        let mut state = self.lock();
        state.live_sources.remove(&source.id());
        state.released.push(source.id());
        debug!(source = source.id(), "Released local audio source");
    }

    fn create_sink(&self, stream: &RemoteStream) -> Result<AudioSink, MediaError> {
        let mut state = self.lock();
        if state.fail_sinks {
            return Err(MediaError::Sink(format!("stream {} rejected", stream.id())));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.live_sinks.insert(id);
        Ok(AudioSink::new(id))
    }

    fn destroy_sink(&self, sink: AudioSink) {
        self.lock().live_sinks.remove(&sink.id());
    }
}

// ---------------------------------------------------------------------------
// Cues
// ---------------------------------------------------------------------------

/// One call made on a `CuePlayer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueAction {
    Play(Cue),
    Stop(Cue),
}

/// Cue player that logs and records every call.
#[derive(Default)]
pub struct RecordingCues {
    actions: Mutex<Vec<CueAction>>,
}

impl RecordingCues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<CueAction> {
        self.lock().clone()
    }

    pub fn count(&self, action: CueAction) -> usize {
        self.lock().iter().filter(|a| **a == action).count()
    }

    /// Whether the last call for `cue` was a `play`.
    pub fn is_playing(&self, cue: Cue) -> bool {
        self.lock()
            .iter()
            .rev()
            .find_map(|a| match a {
                CueAction::Play(c) if *c == cue => Some(true),
                CueAction::Stop(c) if *c == cue => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CueAction>> {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CuePlayer for RecordingCues {
    fn play(&self, cue: Cue) {
        debug!(?cue, "cue play");
        self.lock().push(CueAction::Play(cue));
    }

    fn stop(&self, cue: Cue) {
        debug!(?cue, "cue stop");
        self.lock().push(CueAction::Stop(cue));
    }
}
