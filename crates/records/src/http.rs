//! HTTP implementation of [`RecordStore`] using [`reqwest`].
//!
//! REST mapping:
//! - `GET    /records`                          — list
//! - `GET    /records/{id}`                     — metadata + annotations
//! - `POST   /records` (multipart)              — create with image files
//! - `PUT    /records/{id}` (JSON)              — update, no images
//! - `DELETE /records/{id}`                     — cascading delete
//! - `GET    /records/{id}/images/{name}`       — one image's bytes

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

use embryoseq_core::metadata::RecordMetadata;
use embryoseq_core::types::RecordId;

use crate::dto::{AnnotationEntry, CreatedRecord, NewRecord, PersistedRecord, RecordPatch, RecordSummary};
use crate::error::RecordStoreError;
use crate::store::RecordStore;

/// HTTP request timeout for record operations. Creates carry full image
/// sets, so this is more generous than a metadata round trip needs.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the record persistence service.
pub struct HttpRecordStore {
    client: reqwest::Client,
    api_url: String,
}

impl HttpRecordStore {
    /// Create a client for the service at `api_url` (e.g.
    /// `http://host:8600`).
    pub fn new(api_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// Ensure the response has a success status code. Maps 404 onto
    /// `NotFound` for the given record.
    async fn ensure_success(
        response: reqwest::Response,
        id: Option<RecordId>,
    ) -> Result<reqwest::Response, RecordStoreError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(RecordStoreError::NotFound(id));
            }
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RecordStoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        id: Option<RecordId>,
    ) -> Result<T, RecordStoreError> {
        let response = Self::ensure_success(response, id).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl RecordStore for HttpRecordStore {
    async fn list_records(&self) -> Result<Vec<RecordSummary>, RecordStoreError> {
        let response = self
            .client
            .get(format!("{}/records", self.api_url))
            .send()
            .await?;
        Self::parse_response(response, None).await
    }

    async fn fetch_record(&self, id: RecordId) -> Result<PersistedRecord, RecordStoreError> {
        let response = self
            .client
            .get(format!("{}/records/{id}", self.api_url))
            .send()
            .await?;
        Self::parse_response(response, Some(id)).await
    }

    async fn create_record(&self, record: &NewRecord) -> Result<RecordId, RecordStoreError> {
        let metadata_json = serde_json::to_string(&record.metadata)
            .map_err(|e| RecordStoreError::Decode(e.to_string()))?;
        let annotations_json = serde_json::to_string(&record.annotations)
            .map_err(|e| RecordStoreError::Decode(e.to_string()))?;

        let mut form = Form::new()
            .part("metadata", Part::text(metadata_json).mime_str("application/json")?)
            .part(
                "annotations",
                Part::text(annotations_json).mime_str("application/json")?,
            );
        for frame in &record.frames {
            form = form.part(
                "images",
                Part::bytes(frame.bytes.clone()).file_name(frame.source_name.clone()),
            );
        }

        tracing::info!(
            frame_count = record.frames.len(),
            "Creating record with image payloads",
        );

        let response = self
            .client
            .post(format!("{}/records", self.api_url))
            .multipart(form)
            .send()
            .await?;
        let created: CreatedRecord = Self::parse_response(response, None).await?;
        Ok(created.record_id)
    }

    async fn update_record(
        &self,
        id: RecordId,
        metadata: &RecordMetadata,
        annotations: &[AnnotationEntry],
    ) -> Result<(), RecordStoreError> {
        let patch = RecordPatch {
            metadata: metadata.clone(),
            annotations: annotations.to_vec(),
        };
        let response = self
            .client
            .put(format!("{}/records/{id}", self.api_url))
            .json(&patch)
            .send()
            .await?;
        Self::ensure_success(response, Some(id)).await?;
        Ok(())
    }

    async fn delete_record(&self, id: RecordId) -> Result<(), RecordStoreError> {
        let response = self
            .client
            .delete(format!("{}/records/{id}", self.api_url))
            .send()
            .await?;
        Self::ensure_success(response, Some(id)).await?;
        tracing::info!(record_id = id, "Record deleted");
        Ok(())
    }

    async fn fetch_image(
        &self,
        id: RecordId,
        source_name: &str,
    ) -> Result<Vec<u8>, RecordStoreError> {
        let response = self
            .client
            .get(format!("{}/records/{id}/images/{source_name}", self.api_url))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(RecordStoreError::ImageNotFound {
                record_id: id,
                source_name: source_name.to_string(),
            });
        }
        let response = Self::ensure_success(response, Some(id)).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
