//! Shared fixtures for the engine integration tests.

// Each test binary compiles its own copy; not every binary uses every
// helper.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use embryoseq_core::frame::UploadFrame;
use embryoseq_core::metadata::{KaryotypeResult, LiveBirthOutcome, RecordMetadata};
use embryoseq_engine::EngineConfig;
use embryoseq_inference::api::{PredictRequest, PredictResponse, TransitionPredictor};
use embryoseq_inference::InferenceError;

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Engine config with a fast playback tick and default timeouts.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        playback_tick_ms: 100,
        ..EngineConfig::default()
    }
}

/// Valid metadata ready for a save.
pub fn filled_metadata() -> RecordMetadata {
    RecordMetadata {
        record_id: None,
        contact: "Dr. Imani".to_string(),
        date: chrono::NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
        grade_components: ["4".into(), "A".into(), "B".into()],
        karyotype: KaryotypeResult::Euploid,
        live_birth: LiveBirthOutcome::Unspecified,
    }
}

/// `n` uploads with decodable PNG payloads, for tests that run inference.
pub fn png_uploads(n: usize) -> Vec<UploadFrame> {
    (0..n)
        .map(|i| UploadFrame {
            source_name: format!("img_{i}.png"),
            bytes: tiny_png(i as u8),
        })
        .collect()
}

/// `n` uploads with opaque payloads, for tests that never encode them.
pub fn raw_uploads(n: usize) -> Vec<UploadFrame> {
    (0..n)
        .map(|i| UploadFrame {
            source_name: format!("img_{i}.png"),
            bytes: vec![i as u8; 8],
        })
        .collect()
}

fn tiny_png(seed: u8) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([seed, 128, 255 - seed]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("in-memory PNG encode");
    bytes
}

/// Scriptable in-process [`TransitionPredictor`].
///
/// Returns the scripted prediction vectors in order, repeating the last
/// one; counts calls so tests can assert a run never reached the service;
/// can be gated on a [`Notify`] to hold a call in flight.
pub struct FakePredictor {
    scripted: Mutex<VecDeque<Vec<u8>>>,
    is_random: bool,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl FakePredictor {
    pub fn returning(predictions: Vec<u8>) -> Self {
        Self {
            scripted: Mutex::new(VecDeque::from([predictions])),
            is_random: false,
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Queue another response after the current ones.
    pub fn then(self, predictions: Vec<u8>) -> Self {
        self.scripted.lock().unwrap().push_back(predictions);
        self
    }

    /// Mark every response as the random fallback.
    pub fn degraded(mut self) -> Self {
        self.is_random = true;
        self
    }

    /// Park every call until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransitionPredictor for FakePredictor {
    async fn predict(&self, _request: &PredictRequest) -> Result<PredictResponse, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let predictions = {
            let mut scripted = self.scripted.lock().unwrap();
            if scripted.len() > 1 {
                scripted.pop_front().unwrap_or_default()
            } else {
                scripted.front().cloned().unwrap_or_default()
            }
        };

        Ok(PredictResponse {
            success: true,
            predictions,
            is_random: self.is_random,
            message: String::new(),
        })
    }
}
