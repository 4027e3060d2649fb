//! REST client for the transition-classification service.
//!
//! Wraps the service's single prediction endpoint using [`reqwest`].
//! The [`TransitionPredictor`] trait is the seam the engine depends on,
//! so tests and local development can swap in an in-process fake.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// Request body for the prediction endpoint.
///
/// Every frame of the sequence is sent, base64-encoded at 224x224; the
/// service slides the window itself.
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    /// Model-selecting window size (8 or 32).
    pub window_size: usize,
    /// Base64 JPEG payloads, in frame order.
    pub frames: Vec<String>,
}

/// Response from the prediction endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    /// False when the service rejected the request; see `message`.
    pub success: bool,
    /// One binary score per window, in window order.
    #[serde(default)]
    pub predictions: Vec<u8>,
    /// True when the model artifact was unavailable and the service fell
    /// back to randomly generated scores. Surfaced to the operator,
    /// never treated as authoritative.
    #[serde(default)]
    pub is_random: bool,
    /// Failure description when `success` is false.
    #[serde(default)]
    pub message: String,
}

impl PredictResponse {
    /// Window scores as booleans (any non-zero score is a transition).
    pub fn scores(&self) -> Vec<bool> {
        self.predictions.iter().map(|&p| p != 0).collect()
    }
}

/// The engine's view of the classification service.
#[async_trait::async_trait]
pub trait TransitionPredictor: Send + Sync {
    /// Submit one sequence for scoring and await the per-window results.
    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, InferenceError>;
}

/// HTTP implementation of [`TransitionPredictor`].
pub struct HttpPredictor {
    client: reqwest::Client,
    api_url: String,
    timeout: Duration,
}

impl HttpPredictor {
    /// Create a client for the service at `api_url` (e.g.
    /// `http://host:8500`), with a per-request `timeout`.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            api_url: api_url.into(),
            timeout,
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or the status and body text on
    /// failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, InferenceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl TransitionPredictor for HttpPredictor {
    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, InferenceError> {
        tracing::debug!(
            window_size = request.window_size,
            frame_count = request.frames.len(),
            "Submitting prediction request",
        );

        let response = self
            .client
            .post(format!("{}/predict", self.api_url))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout(self.timeout.as_secs())
                } else {
                    InferenceError::Request(e)
                }
            })?;

        let response = Self::ensure_success(response).await?;
        let parsed: PredictResponse = response.json().await?;

        if !parsed.success {
            return Err(InferenceError::Service {
                message: parsed.message,
            });
        }
        Ok(parsed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
