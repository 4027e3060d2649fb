//! Record metadata and its save-time validation rules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::RecordId;

/// Chromosomal screening result for the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KaryotypeResult {
    Euploid,
    Aneuploid,
    /// Screening not performed or result not recorded.
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

/// Known live-birth outcome for the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LiveBirthOutcome {
    Yes,
    No,
    /// Outcome unknown or not yet recorded.
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

/// Operator-entered metadata for one record.
///
/// `record_id` is `None` for a draft that has never been saved; it is set
/// exactly once, when the persistence service assigns an id on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RecordMetadata {
    pub record_id: Option<RecordId>,

    /// Referring contact, required before save.
    #[validate(length(min = 1, max = 120, message = "contact is required"))]
    pub contact: String,

    /// Acquisition date of the time-lapse sequence.
    pub date: NaiveDate,

    /// The three grading slots (expansion, inner cell mass,
    /// trophectoderm), all required before save.
    pub grade_components: [String; 3],

    pub karyotype: KaryotypeResult,

    pub live_birth: LiveBirthOutcome,
}

impl RecordMetadata {
    /// An empty draft dated `date`.
    pub fn draft(date: NaiveDate) -> Self {
        Self {
            record_id: None,
            contact: String::new(),
            date,
            grade_components: Default::default(),
            karyotype: KaryotypeResult::Unspecified,
            live_birth: LiveBirthOutcome::Unspecified,
        }
    }

    /// True until the persistence service has assigned an id.
    pub fn is_draft(&self) -> bool {
        self.record_id.is_none()
    }

    /// Validate the fields a save requires.
    ///
    /// Karyotype and live-birth outcome may stay unspecified; contact and
    /// all three grade components may not.
    pub fn validate_for_save(&self) -> Result<(), CoreError> {
        self.validate()?;
        for (slot, component) in ["expansion", "inner cell mass", "trophectoderm"]
            .iter()
            .zip(&self.grade_components)
        {
            if component.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "Grade component '{slot}' is required"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
