//! Error taxonomy for the inference run lifecycle.

/// Errors from precondition checks, the HTTP call, or result handling.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The sequence is empty; nothing to score.
    #[error("No frames loaded")]
    NoFrames,

    /// The sequence is shorter than one window.
    #[error("Need at least {need} frames for prediction, got {have}")]
    InsufficientFrames {
        /// Frames currently loaded.
        have: usize,
        /// The requested window size.
        need: usize,
    },

    /// The window size selects a model; only 8 and 32 exist.
    #[error("Unsupported window size: {0}")]
    UnsupportedWindowSize(usize),

    /// A run is already in flight for this sequence.
    #[error("An inference run is already in progress")]
    Busy,

    /// The call exceeded the configured deadline. Nothing was painted.
    #[error("Inference request timed out after {0}s")]
    Timeout(u64),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("Inference service error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The service reported a failure in an otherwise valid response.
    #[error("Inference service rejected the request: {message}")]
    Service { message: String },

    /// The response carried the wrong number of window scores.
    #[error("Expected {expected} window scores, got {got}")]
    PredictionCountMismatch { expected: usize, got: usize },

    /// The sequence was reloaded or cleared while the run was in flight;
    /// the results describe frames that no longer exist.
    #[error("Sequence changed while the run was in flight; results discarded")]
    Superseded,

    /// A frame payload could not be decoded or re-encoded.
    #[error("Error processing image {index}: {reason}")]
    Encode { index: usize, reason: String },
}
