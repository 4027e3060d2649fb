//! The in-memory frame-sequence store.
//!
//! One [`FrameSequence`] holds the ordered frames of a single record.
//! Membership only ever changes wholesale: [`load`](FrameSequence::load)
//! replaces everything and [`clear`](FrameSequence::clear) drops
//! everything. Both bump the [`SequenceVersion`] so that async work
//! started against an older sequence can be recognized and discarded.

use serde::Serialize;

use crate::error::CoreError;
use crate::frame::{Frame, SourceFrame};
use crate::ordering::natural_cmp;
use crate::phase::Phase;

/// Monotonically increasing identity of the current sequence membership.
///
/// Captured before a suspension point and compared afterwards; a mismatch
/// means the frames the async result describes are gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceVersion(u64);

/// A `(source_name, phase)` pair, the persisted form of one annotation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, Serialize)]
pub struct AnnotationEntry {
    pub source_name: String,
    pub phase: Phase,
}

/// Ordered frames of one record plus their annotation state.
#[derive(Debug, Default)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    version: u64,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole sequence.
    ///
    /// Frames are natural-sorted by `source_name`, indices reassigned
    /// `0..N`, every phase reset to "N/A" and every prediction dropped.
    /// Returns the new version.
    pub fn load(&mut self, sources: Vec<SourceFrame>) -> SequenceVersion {
        let mut sources = sources;
        sources.sort_by(|a, b| natural_cmp(&a.source_name, &b.source_name));

        self.frames = sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| Frame {
                index,
                source_name: source.source_name,
                location: source.location,
                phase: Phase::NotAvailable,
                predicted_transition: None,
            })
            .collect();
        self.version += 1;
        self.version()
    }

    /// Drop every frame, releasing any locally held payloads.
    ///
    /// Returns the new version.
    pub fn clear(&mut self) -> SequenceVersion {
        self.frames.clear();
        self.version += 1;
        self.version()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn version(&self) -> SequenceVersion {
        SequenceVersion(self.version)
    }

    /// Borrow a frame by index.
    pub fn get(&self, index: usize) -> Result<&Frame, CoreError> {
        self.frames.get(index).ok_or(CoreError::OutOfRange {
            index,
            len: self.frames.len(),
        })
    }

    /// Iterate the frames in order.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    // -----------------------------------------------------------------
    // Annotation propagation
    // -----------------------------------------------------------------

    /// Forward-fill: set `phase` on `from_index` and every later frame.
    ///
    /// A no-op on an empty sequence or an out-of-range index — that is the
    /// "no frames yet" UI state, not an error. The whole range is updated
    /// before this returns, so a reader never sees a partial fill.
    pub fn propagate_forward(&mut self, from_index: usize, phase: Phase) {
        if from_index >= self.frames.len() {
            return;
        }
        for frame in &mut self.frames[from_index..] {
            frame.phase = phase;
        }
    }

    /// Broadcast: set `phase` on every frame regardless of cursor.
    pub fn broadcast_all(&mut self, phase: Phase) {
        for frame in &mut self.frames {
            frame.phase = phase;
        }
    }

    // -----------------------------------------------------------------
    // Prediction overlay
    // -----------------------------------------------------------------

    /// Replace the transition overlay with one value per frame.
    ///
    /// The slice length must equal the sequence length; the aggregator
    /// computes a value for every frame before painting.
    pub fn set_predictions(&mut self, per_frame: &[bool]) -> Result<(), CoreError> {
        if per_frame.len() != self.frames.len() {
            return Err(CoreError::Validation(format!(
                "Prediction overlay has {} entries for {} frames",
                per_frame.len(),
                self.frames.len()
            )));
        }
        for (frame, value) in self.frames.iter_mut().zip(per_frame) {
            frame.predicted_transition = Some(*value);
        }
        Ok(())
    }

    /// Drop the transition overlay from every frame.
    pub fn clear_predictions(&mut self) {
        for frame in &mut self.frames {
            frame.predicted_transition = None;
        }
    }

    // -----------------------------------------------------------------
    // Persistence views
    // -----------------------------------------------------------------

    /// Snapshot the annotations for saving.
    pub fn annotations(&self) -> Vec<AnnotationEntry> {
        self.frames
            .iter()
            .map(|f| AnnotationEntry {
                source_name: f.source_name.clone(),
                phase: f.phase,
            })
            .collect()
    }

    /// Replay persisted annotations onto the loaded frames.
    ///
    /// Matches by `source_name`; frames without a persisted entry keep
    /// "N/A". Entries naming unknown frames are ignored.
    pub fn apply_annotations(&mut self, entries: &[AnnotationEntry]) {
        for frame in &mut self.frames {
            if let Some(entry) = entries.iter().find(|e| e.source_name == frame.source_name) {
                frame.phase = entry.phase;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
