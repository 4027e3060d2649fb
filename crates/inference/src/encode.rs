//! Frame payload encoding for the inference request.
//!
//! The service expects every frame at a fixed 224x224 resolution,
//! JPEG-compressed and base64-encoded. Whatever the operator uploaded
//! (PNG, JPEG, any aspect ratio) is normalized here.

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::imageops::FilterType;

use crate::error::InferenceError;

/// Model input edge length, in pixels.
pub const INPUT_EDGE: u32 = 224;

/// JPEG quality for the transport payload.
const JPEG_QUALITY: u8 = 90;

/// Normalize one frame to a base64 transport payload.
///
/// `index` is only used to identify the offending frame in errors.
pub fn encode_frame(index: usize, bytes: &[u8]) -> Result<String, InferenceError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| InferenceError::Encode {
        index,
        reason: e.to_string(),
    })?;

    // JPEG has no alpha channel; normalize to RGB before encoding.
    let resized = decoded
        .resize_exact(INPUT_EDGE, INPUT_EDGE, FilterType::Triangle)
        .to_rgb8();

    let mut jpeg = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), JPEG_QUALITY);
    encoder
        .encode_image(&resized)
        .map_err(|e| InferenceError::Encode {
            index,
            reason: e.to_string(),
        })?;

    Ok(general_purpose::STANDARD.encode(&jpeg))
}

/// Encode a whole sequence in order.
///
/// Fails on the first bad frame; the run aborts with prior state intact.
pub fn encode_frames<B: AsRef<[u8]>>(payloads: &[B]) -> Result<Vec<String>, InferenceError> {
    payloads
        .iter()
        .enumerate()
        .map(|(index, bytes)| encode_frame(index, bytes.as_ref()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
