//! Unified error type for session operations.

use embryoseq_core::CoreError;
use embryoseq_inference::InferenceError;
use embryoseq_records::RecordStoreError;

/// Any failure a session operation can surface.
///
/// Domain validation, inference-run failures, and persistence failures
/// keep their own taxonomies; this enum only composes them.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Records(#[from] RecordStoreError),
}
