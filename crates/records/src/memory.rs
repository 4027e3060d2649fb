//! In-process implementation of [`RecordStore`].
//!
//! Backs the engine's integration tests and local development without a
//! running persistence service. Semantics mirror the real service:
//! sequential ids, immutable images after create, cascading delete.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::RwLock;

use embryoseq_core::metadata::RecordMetadata;
use embryoseq_core::types::RecordId;

use crate::dto::{AnnotationEntry, NewRecord, PersistedRecord, RecordSummary};
use crate::error::RecordStoreError;
use crate::store::RecordStore;

#[derive(Debug, Clone)]
struct StoredRecord {
    metadata: RecordMetadata,
    source_names: Vec<String>,
    annotations: Vec<AnnotationEntry>,
    images: HashMap<String, Vec<u8>>,
}

/// A [`RecordStore`] kept entirely in memory.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<RecordId, StoredRecord>>,
    next_id: AtomicI64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// True when no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list_records(&self) -> Result<Vec<RecordSummary>, RecordStoreError> {
        let records = self.records.read().await;
        let mut summaries: Vec<RecordSummary> = records
            .iter()
            .map(|(id, stored)| RecordSummary {
                record_id: *id,
                date: stored.metadata.date,
                contact: stored.metadata.contact.clone(),
                grade_components: stored.metadata.grade_components.clone(),
                karyotype: stored.metadata.karyotype,
                live_birth: stored.metadata.live_birth,
            })
            .collect();
        // Newest first, like the service's listing.
        summaries.sort_by(|a, b| b.record_id.cmp(&a.record_id));
        Ok(summaries)
    }

    async fn fetch_record(&self, id: RecordId) -> Result<PersistedRecord, RecordStoreError> {
        let records = self.records.read().await;
        let stored = records.get(&id).ok_or(RecordStoreError::NotFound(id))?;
        Ok(PersistedRecord {
            metadata: stored.metadata.clone(),
            source_names: stored.source_names.clone(),
            annotations: stored.annotations.clone(),
        })
    }

    async fn create_record(&self, record: &NewRecord) -> Result<RecordId, RecordStoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let mut metadata = record.metadata.clone();
        metadata.record_id = Some(id);

        let stored = StoredRecord {
            metadata,
            source_names: record.frames.iter().map(|f| f.source_name.clone()).collect(),
            annotations: record.annotations.clone(),
            images: record
                .frames
                .iter()
                .map(|f| (f.source_name.clone(), f.bytes.clone()))
                .collect(),
        };

        self.records.write().await.insert(id, stored);
        Ok(id)
    }

    async fn update_record(
        &self,
        id: RecordId,
        metadata: &RecordMetadata,
        annotations: &[AnnotationEntry],
    ) -> Result<(), RecordStoreError> {
        let mut records = self.records.write().await;
        let stored = records.get_mut(&id).ok_or(RecordStoreError::NotFound(id))?;
        // Images are immutable; only metadata and annotations move.
        let mut metadata = metadata.clone();
        metadata.record_id = Some(id);
        stored.metadata = metadata;
        stored.annotations = annotations.to_vec();
        Ok(())
    }

    async fn delete_record(&self, id: RecordId) -> Result<(), RecordStoreError> {
        let mut records = self.records.write().await;
        // Removing the record drops its image map with it (cascade).
        records
            .remove(&id)
            .map(|_| ())
            .ok_or(RecordStoreError::NotFound(id))
    }

    async fn fetch_image(
        &self,
        id: RecordId,
        source_name: &str,
    ) -> Result<Vec<u8>, RecordStoreError> {
        let records = self.records.read().await;
        let stored = records.get(&id).ok_or(RecordStoreError::NotFound(id))?;
        stored
            .images
            .get(source_name)
            .cloned()
            .ok_or_else(|| RecordStoreError::ImageNotFound {
                record_id: id,
                source_name: source_name.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
