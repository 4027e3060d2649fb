//! Natural ordering for frame filenames.
//!
//! Time-lapse exports name frames like `Patient_3_Image_12.jpeg`; a plain
//! lexical sort would put `Image_12` before `Image_2`. Comparison here
//! splits a name into alternating text and digit runs: digit runs compare
//! by numeric magnitude, text runs compare case-insensitively.

use std::cmp::Ordering;

/// One segment of a split filename.
#[derive(Debug, PartialEq, Eq)]
enum Segment {
    /// A digit run, stored with leading zeros stripped. Magnitude
    /// comparison is length-then-lexical so arbitrarily long runs never
    /// overflow an integer type.
    Number(String),
    /// A non-digit run, lowercased.
    Text(String),
}

fn segments(name: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_is_digit: Option<bool> = None;

    for ch in name.chars() {
        let is_digit = ch.is_ascii_digit();
        if current_is_digit != Some(is_digit) && !current.is_empty() {
            out.push(finish(current, current_is_digit == Some(true)));
            current = String::new();
        }
        current_is_digit = Some(is_digit);
        current.push(ch);
    }
    if !current.is_empty() {
        out.push(finish(current, current_is_digit == Some(true)));
    }
    out
}

fn finish(run: String, is_digit: bool) -> Segment {
    if is_digit {
        let stripped = run.trim_start_matches('0');
        // All-zero runs normalize to "0".
        let normalized = if stripped.is_empty() { "0" } else { stripped };
        Segment::Number(normalized.to_string())
    } else {
        Segment::Text(run.to_lowercase())
    }
}

/// Compare two filenames in natural order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l, r) {
            (Segment::Number(x), Segment::Number(y)) => {
                x.len().cmp(&y.len()).then_with(|| x.cmp(y))
            }
            (Segment::Text(x), Segment::Text(y)) => x.cmp(y),
            // Digits sort before letters, as in a plain byte-wise sort.
            (Segment::Number(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Number(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
