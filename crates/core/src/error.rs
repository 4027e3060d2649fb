//! Error type shared by the domain modules.

/// Errors produced by the pure domain layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed a domain validation rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A frame index outside `[0, len)` was dereferenced.
    #[error("Frame index {index} out of range for sequence of length {len}")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// Sequence length at the time of the access.
        len: usize,
    },
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}
