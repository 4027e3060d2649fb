//! The persistence seam the engine depends on.

use embryoseq_core::metadata::RecordMetadata;
use embryoseq_core::types::RecordId;

use crate::dto::{AnnotationEntry, NewRecord, PersistedRecord, RecordSummary};
use crate::error::RecordStoreError;

/// Abstract record persistence service.
///
/// Implementations: [`HttpRecordStore`](crate::http::HttpRecordStore)
/// against the real service, and
/// [`MemoryRecordStore`](crate::memory::MemoryRecordStore) for tests and
/// local development.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// All records visible to the current operator.
    async fn list_records(&self) -> Result<Vec<RecordSummary>, RecordStoreError>;

    /// Metadata, frame identifiers, and annotations for one record.
    async fn fetch_record(&self, id: RecordId) -> Result<PersistedRecord, RecordStoreError>;

    /// Persist a new record, including raw frame payloads.
    ///
    /// Returns the assigned id. Images are immutable from then on.
    async fn create_record(&self, record: &NewRecord) -> Result<RecordId, RecordStoreError>;

    /// Update metadata and annotations of an existing record.
    ///
    /// Never re-transmits image bytes.
    async fn update_record(
        &self,
        id: RecordId,
        metadata: &RecordMetadata,
        annotations: &[AnnotationEntry],
    ) -> Result<(), RecordStoreError>;

    /// Remove a record and, cascading, all of its image assets.
    /// Irreversible.
    async fn delete_record(&self, id: RecordId) -> Result<(), RecordStoreError>;

    /// Raw bytes of one persisted image.
    async fn fetch_image(
        &self,
        id: RecordId,
        source_name: &str,
    ) -> Result<Vec<u8>, RecordStoreError>;
}
