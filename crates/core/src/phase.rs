//! Developmental-phase vocabulary for frame annotation.
//!
//! The 16 labels are fixed: "N/A" (the default for unannotated frames),
//! fourteen chronological morphokinetic stages from pronuclear appearance
//! through expanded blastocyst, and "Anomaly" for frames that do not fit
//! the normal timeline.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A developmental-phase label assignable to a single frame.
///
/// Ordered chronologically; [`Phase::NotAvailable`] sorts first and
/// [`Phase::Anomaly`] last so the enum's derived `Ord` matches the
/// annotation dropdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No annotation assigned yet.
    #[serde(rename = "N/A")]
    NotAvailable,
    /// Pronuclei appearance.
    #[serde(rename = "tPNa")]
    TPNa,
    /// Pronuclei fading.
    #[serde(rename = "tPNf")]
    TPNf,
    #[serde(rename = "t2")]
    T2,
    #[serde(rename = "t3")]
    T3,
    #[serde(rename = "t4")]
    T4,
    #[serde(rename = "t5")]
    T5,
    #[serde(rename = "t6")]
    T6,
    #[serde(rename = "t7")]
    T7,
    #[serde(rename = "t8")]
    T8,
    /// Nine or more cells.
    #[serde(rename = "t9+")]
    T9Plus,
    /// Morula.
    #[serde(rename = "tM")]
    TM,
    /// Start of blastulation.
    #[serde(rename = "tSB")]
    TSB,
    /// Full blastocyst.
    #[serde(rename = "tB")]
    TB,
    /// Expanded blastocyst.
    #[serde(rename = "tEB")]
    TEB,
    /// Developmental anomaly (fragmentation, direct cleavage, etc.).
    #[serde(rename = "Anomaly")]
    Anomaly,
}

/// Every phase label, in chronological/display order.
pub const ALL_PHASES: [Phase; 16] = [
    Phase::NotAvailable,
    Phase::TPNa,
    Phase::TPNf,
    Phase::T2,
    Phase::T3,
    Phase::T4,
    Phase::T5,
    Phase::T6,
    Phase::T7,
    Phase::T8,
    Phase::T9Plus,
    Phase::TM,
    Phase::TSB,
    Phase::TB,
    Phase::TEB,
    Phase::Anomaly,
];

impl Phase {
    /// Return the label as it appears on the wire and in annotation files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAvailable => "N/A",
            Self::TPNa => "tPNa",
            Self::TPNf => "tPNf",
            Self::T2 => "t2",
            Self::T3 => "t3",
            Self::T4 => "t4",
            Self::T5 => "t5",
            Self::T6 => "t6",
            Self::T7 => "t7",
            Self::T8 => "t8",
            Self::T9Plus => "t9+",
            Self::TM => "tM",
            Self::TSB => "tSB",
            Self::TB => "tB",
            Self::TEB => "tEB",
            Self::Anomaly => "Anomaly",
        }
    }

    /// Parse a phase from its wire label.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        ALL_PHASES
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid phase label '{s}'. Must be one of: {}",
                    ALL_PHASES.map(|p| p.as_str()).join(", ")
                ))
            })
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::NotAvailable
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
