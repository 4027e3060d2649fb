//! Timed playback of the loaded sequence.
//!
//! Playback is a cancellable scheduled task: a `tokio::time::interval`
//! advances the session cursor by one per tick until it would pass the
//! last frame, the operator stops it, or a store mutation invalidates it.
//! At most one task is live per session; a generation counter makes sure
//! a stale task can never clobber a newer playback's state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use crate::events::{SessionEvent, StopReason};
use crate::session::SessionCore;

/// Whether the session is currently auto-advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Bookkeeping for the live playback task, stored in the session core.
#[derive(Debug)]
pub(crate) struct PlaybackTask {
    pub cancel: CancellationToken,
    pub generation: u64,
}

/// Spawn the tick task for playback generation `generation`.
///
/// The task exits when cancelled, when a newer generation has taken over,
/// or when the cursor reaches the last frame (auto-stop).
pub(crate) fn spawn_playback(
    core: Arc<RwLock<SessionCore>>,
    events: broadcast::Sender<SessionEvent>,
    tick: Duration,
    generation: u64,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        // First tick lands one full interval after start.
        let start = tokio::time::Instant::now() + tick;
        let mut ticker = tokio::time::interval_at(start, tick);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(generation, "Playback task cancelled");
                    return;
                }
                _ = ticker.tick() => {
                    let mut core = core.write().await;

                    // A newer playback owns the session now.
                    if core.playback.as_ref().map(|p| p.generation) != Some(generation) {
                        return;
                    }

                    let len = core.sequence.len();
                    if len == 0 || core.cursor + 1 >= len {
                        // Advancing would pass the last frame: auto-stop.
                        core.playback = None;
                        let _ = events.send(SessionEvent::PlaybackStopped {
                            reason: StopReason::EndOfSequence,
                        });
                        tracing::debug!(generation, cursor = core.cursor, "Playback reached end");
                        return;
                    }

                    core.cursor += 1;
                    let _ = events.send(SessionEvent::CursorMoved { index: core.cursor });
                }
            }
        }
    });
}
