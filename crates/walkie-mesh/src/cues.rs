//! Delayed cue scheduling.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

use crate::media::{Cue, CuePlayer};

/// A cue that will play after a delay unless dropped first.
///
/// Dropping the guard aborts the pending task, so a cue can never fire
/// after the state that scheduled it has moved on.
pub struct ScheduledCue {
    cue: Cue,
    handle: JoinHandle<()>,
}

impl ScheduledCue {
    /// Spawn a task that plays `cue` on `player` after `delay`.
    pub fn after(delay: Duration, player: Arc<dyn CuePlayer>, cue: Cue) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            player.play(cue);
        });
        Self { cue, handle }
    }

    /// Whether the cue has already played.
    pub fn is_fired(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledCue {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            trace!(cue = ?self.cue, "Cancelling scheduled cue");
        }
        self.handle.abort();
    }
}

impl fmt::Debug for ScheduledCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledCue")
            .field("cue", &self.cue)
            .field("fired", &self.is_fired())
            .finish()
    }
}

/// The manager's view of the cue player: honours the enabled flag and the
/// static delay.
#[derive(Clone)]
pub(crate) struct Cues {
    player: Arc<dyn CuePlayer>,
    enabled: bool,
    static_delay: Duration,
}

impl Cues {
    pub(crate) fn new(player: Arc<dyn CuePlayer>, enabled: bool, static_delay: Duration) -> Self {
        Self {
            player,
            enabled,
            static_delay,
        }
    }

    pub(crate) fn play(&self, cue: Cue) {
        if self.enabled {
            self.player.play(cue);
        }
    }

    pub(crate) fn stop(&self, cue: Cue) {
        if self.enabled {
            self.player.stop(cue);
        }
    }

    /// Schedule the looping static after the configured delay.
    pub(crate) fn schedule_static(&self) -> Option<ScheduledCue> {
        self.enabled
            .then(|| ScheduledCue::after(self.static_delay, Arc::clone(&self.player), Cue::Static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::memory::{CueAction, RecordingCues};

    #[tokio::test(start_paused = true)]
    async fn scheduled_cue_fires_after_delay() {
        let player = Arc::new(RecordingCues::new());
        let scheduled = ScheduledCue::after(Duration::from_millis(300), player.clone(), Cue::Static);

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(player.actions().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(player.actions(), vec![CueAction::Play(Cue::Static)]);
        drop(scheduled);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels_cue() {
        let player = Arc::new(RecordingCues::new());
        let scheduled = ScheduledCue::after(Duration::from_millis(300), player.clone(), Cue::Static);
        drop(scheduled);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(player.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_cues_are_silent() {
        let player = Arc::new(RecordingCues::new());
        let cues = Cues::new(player.clone(), false, Duration::from_millis(300));
        cues.play(Cue::StartTone);
        cues.stop(Cue::Static);
        assert!(cues.schedule_static().is_none());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(player.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn enabled_cues_schedule_static() {
        let player = Arc::new(RecordingCues::new());
        let cues = Cues::new(player.clone(), true, Duration::from_millis(50));
        let scheduled = cues.schedule_static();
        assert!(scheduled.is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(player.is_playing(Cue::Static));
    }
}
