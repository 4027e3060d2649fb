//! Session events broadcast to UI subscribers.
//!
//! Every state change the surrounding application might need to render
//! is published on a `tokio::sync::broadcast` channel. Publishing never
//! fails; with zero subscribers events are silently dropped.

use serde::Serialize;
use uuid::Uuid;

use embryoseq_core::phase::Phase;
use embryoseq_core::sequence::SequenceVersion;
use embryoseq_core::types::RecordId;

/// Why playback stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The operator stopped it.
    Explicit,
    /// The cursor reached the last frame.
    EndOfSequence,
    /// The sequence was reloaded or cleared underneath the timer.
    Invalidated,
}

/// Which frames an annotation change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnnotationScope {
    /// The active frame and everything after it.
    ForwardFrom { index: usize },
    /// Every frame in the sequence.
    All,
}

/// A state change in one annotation session.
#[derive(Debug, Clone, Serialize)]
pub enum SessionEvent {
    /// A sequence was loaded (fresh upload or hydrated record).
    SequenceLoaded {
        record_id: Option<RecordId>,
        frame_count: usize,
        version: SequenceVersion,
    },

    /// The session was reset to an empty draft.
    SequenceCleared,

    /// The visible frame changed (manual navigation or playback tick).
    CursorMoved { index: usize },

    /// Phase labels were (re)assigned.
    AnnotationChanged { scope: AnnotationScope, phase: Phase },

    PlaybackStarted,

    PlaybackStopped { reason: StopReason },

    /// An inference run was accepted and submitted.
    InferenceStarted { run_id: Uuid, window_size: usize },

    /// An inference run painted its results.
    InferenceCompleted {
        run_id: Uuid,
        window_count: usize,
        /// True when the service fell back to randomly generated scores;
        /// the overlay is painted but must be presented as low-confidence.
        degraded: bool,
    },

    /// An inference run failed; nothing was painted.
    InferenceFailed { run_id: Uuid, error: String },

    /// The record was persisted (created or updated).
    RecordSaved { record_id: RecordId, created: bool },

    /// A record was deleted from the persistence service.
    RecordDeleted { record_id: RecordId },
}
