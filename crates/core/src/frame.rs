//! A single image in a time-lapse sequence.

use std::sync::Arc;

use serde::Serialize;

use crate::phase::Phase;
use crate::types::RecordId;

/// Where a frame's image bytes live.
///
/// Index and `source_name` identify a frame; the location is only an
/// opaque retrieval handle and is never used as identity.
#[derive(Debug, Clone)]
pub enum FrameLocation {
    /// Payload from a fresh upload, held in memory until the sequence is
    /// cleared or reloaded. `Arc` so an inference run can borrow the bytes
    /// without copying the whole sequence.
    Local { bytes: Arc<Vec<u8>> },
    /// Image persisted by the records service, retrieved on demand by
    /// `(record_id, source_name)`.
    Remote { record_id: RecordId },
}

impl FrameLocation {
    /// True when the raw payload is available without a service round trip.
    pub fn is_local(&self) -> bool {
        matches!(self, FrameLocation::Local { .. })
    }
}

/// One frame of the sequence, with its annotation state.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    /// 0-based position, contiguous and stable within one load.
    pub index: usize,
    /// Original filename, the cross-referencing key for annotations.
    pub source_name: String,
    /// Retrieval handle for the image bytes.
    #[serde(skip)]
    pub location: FrameLocation,
    /// Operator-assigned developmental phase.
    pub phase: Phase,
    /// Transition indicator painted by the last inference run, if any.
    pub predicted_transition: Option<bool>,
}

/// Input to a wholesale sequence load.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub source_name: String,
    pub location: FrameLocation,
}

/// A freshly uploaded file, before it becomes a [`SourceFrame`].
#[derive(Debug, Clone)]
pub struct UploadFrame {
    pub source_name: String,
    pub bytes: Vec<u8>,
}

impl From<UploadFrame> for SourceFrame {
    fn from(upload: UploadFrame) -> Self {
        SourceFrame {
            source_name: upload.source_name,
            location: FrameLocation::Local {
                bytes: Arc::new(upload.bytes),
            },
        }
    }
}
