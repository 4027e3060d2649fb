//! Sliding-window math and the score-to-frame painting policy.
//!
//! The service scores overlapping windows of `window_size` consecutive
//! frames at stride 1. Window `i` covers frames `[i, i + window_size - 1]`,
//! so `N` frames yield `N - window_size + 1` windows.

use crate::error::InferenceError;

/// Window size served by the frame-pair CNN model.
pub const WINDOW_SHORT: usize = 8;

/// Window size served by the video-transformer model.
pub const WINDOW_LONG: usize = 32;

/// Number of windows a sequence of `n` frames produces.
pub fn window_count(n: usize, window_size: usize) -> usize {
    n.checked_sub(window_size).map(|d| d + 1).unwrap_or(0)
}

/// Validate a run before any encoding or network traffic.
///
/// Checked in order: an empty sequence, then an unknown window size, then
/// a sequence shorter than one window. Each failure is distinct so the
/// operator sees exactly what to fix.
pub fn check_preconditions(n: usize, window_size: usize) -> Result<(), InferenceError> {
    if n == 0 {
        return Err(InferenceError::NoFrames);
    }
    if window_size != WINDOW_SHORT && window_size != WINDOW_LONG {
        return Err(InferenceError::UnsupportedWindowSize(window_size));
    }
    if n < window_size {
        return Err(InferenceError::InsufficientFrames {
            have: n,
            need: window_size,
        });
    }
    Ok(())
}

/// Map per-window scores onto a per-frame transition overlay.
///
/// The first window paints every frame it covers; each subsequent window
/// paints only the one frame it newly slid onto, leaving earlier frames'
/// values untouched. With stride 1 this assigns exactly one value to each
/// of the `n` frames.
pub fn paint_transitions(
    n: usize,
    window_size: usize,
    scores: &[bool],
) -> Result<Vec<bool>, InferenceError> {
    let expected = window_count(n, window_size);
    if scores.len() != expected {
        return Err(InferenceError::PredictionCountMismatch {
            expected,
            got: scores.len(),
        });
    }

    let mut overlay = vec![false; n];
    for (i, &score) in scores.iter().enumerate() {
        if i == 0 {
            // First window colors all of its frames.
            for value in overlay.iter_mut().take(window_size) {
                *value = score;
            }
        } else {
            // Later windows color only the newly covered frame.
            overlay[i + window_size - 1] = score;
        }
    }
    Ok(overlay)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
