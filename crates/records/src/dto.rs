//! Wire DTOs for the record persistence service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use embryoseq_core::metadata::{KaryotypeResult, LiveBirthOutcome, RecordMetadata};
use embryoseq_core::types::RecordId;

pub use embryoseq_core::sequence::AnnotationEntry;

/// One row of the record listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSummary {
    pub record_id: RecordId,
    pub date: NaiveDate,
    pub contact: String,
    pub grade_components: [String; 3],
    pub karyotype: KaryotypeResult,
    pub live_birth: LiveBirthOutcome,
}

/// A fully persisted record as returned by the service.
///
/// `source_names` carries the frame identifiers in natural order; image
/// bytes are fetched separately per frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub metadata: RecordMetadata,
    pub source_names: Vec<String>,
    pub annotations: Vec<AnnotationEntry>,
}

/// Raw image payload for one frame of a create request.
#[derive(Debug, Clone)]
pub struct FramePayload {
    pub source_name: String,
    pub bytes: Vec<u8>,
}

/// A create request: metadata, the full frame payload set, and the
/// annotations keyed by `source_name`.
///
/// Only create transmits image bytes; updates carry metadata and
/// annotations alone.
#[derive(Debug)]
pub struct NewRecord {
    pub metadata: RecordMetadata,
    pub frames: Vec<FramePayload>,
    pub annotations: Vec<AnnotationEntry>,
}

/// Body of an update request.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordPatch {
    pub metadata: RecordMetadata,
    pub annotations: Vec<AnnotationEntry>,
}

/// Response to a successful create.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreatedRecord {
    pub record_id: RecordId,
}
