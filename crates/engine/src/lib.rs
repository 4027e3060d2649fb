//! Session orchestration for frame-sequence annotation and inference.
//!
//! An [`AnnotationSession`](session::AnnotationSession) owns the frame
//! sequence of one record under review: annotation propagation, cursor
//! navigation and timed playback, the inference run lifecycle, and
//! reconciliation against the record persistence service. Each operator
//! session is its own value — nothing here is process-global, so multiple
//! sessions (and tests) never share state.

pub mod config;
pub mod error;
pub mod events;
pub mod playback;
pub mod session;

pub use config::EngineConfig;
pub use error::EngineError;
pub use events::{AnnotationScope, SessionEvent, StopReason};
pub use playback::PlaybackState;
pub use session::{AnnotationSession, InferenceOutcome, SaveOutcome};
