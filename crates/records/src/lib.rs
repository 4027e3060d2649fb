//! Client for the record persistence service.
//!
//! Records (metadata + frame identifiers + annotations) live behind an
//! external service; image bytes are immutable once created and are
//! retrieved separately by `(record_id, source_name)`. The
//! [`RecordStore`] trait is the seam the engine depends on; the HTTP
//! implementation talks to the real service and the in-memory one backs
//! tests and local development.

pub mod dto;
pub mod error;
pub mod http;
pub mod memory;
pub mod store;

pub use dto::{AnnotationEntry, FramePayload, NewRecord, PersistedRecord, RecordSummary};
pub use error::RecordStoreError;
pub use http::HttpRecordStore;
pub use memory::MemoryRecordStore;
pub use store::RecordStore;
