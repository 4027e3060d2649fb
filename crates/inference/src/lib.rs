//! Client for the external transition-classification service.
//!
//! The service is a black box: it accepts every frame of the current
//! sequence (base64-encoded, 224x224) plus a window size, slides the
//! window itself, and returns one binary score per window. This crate owns
//! the request/response DTOs, the payload encoding, the precondition
//! checks, and the pure window math that maps per-window scores back onto
//! per-frame indicators.

pub mod api;
pub mod encode;
pub mod error;
pub mod window;

pub use api::{HttpPredictor, PredictRequest, PredictResponse, TransitionPredictor};
pub use error::InferenceError;
pub use window::{WINDOW_LONG, WINDOW_SHORT};
