//! Errors from the record persistence boundary.

use embryoseq_core::types::RecordId;

/// Errors surfaced by a [`RecordStore`](crate::store::RecordStore)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("Records service error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// No record exists with the given id.
    #[error("Record {0} not found")]
    NotFound(RecordId),

    /// No image with that source name exists on the record.
    #[error("Image '{source_name}' not found on record {record_id}")]
    ImageNotFound {
        record_id: RecordId,
        source_name: String,
    },

    /// A response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}
