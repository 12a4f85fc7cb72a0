//! Input validation utilities.
//!
//! The engines accept any well-formed case. These checks are for callers that want to reject
//! cases the engines would otherwise process leniently, and for the case store, which must not
//! turn an identifier into an arbitrary path.

use crate::case::{Case, ObservationCase};
use crate::{ReasoningError, ReasoningResult};

/// Rejects observation cases whose observation and diagnosis lists differ in length.
///
/// The engine pairs the lists up to the shorter one; call this first to make that an error.
pub fn validate_observation_pairs(case: &ObservationCase) -> ReasoningResult<()> {
    if case.observations.len() != case.diagnoses.len() {
        return Err(ReasoningError::InvalidInput(format!(
            "case {} has {} observations but {} diagnoses",
            case.patient_id,
            case.observations.len(),
            case.diagnoses.len()
        )));
    }
    Ok(())
}

/// Rejects cases with nothing to match on: a blank chief complaint, or no observations.
pub fn validate_case_has_content(case: &Case) -> ReasoningResult<()> {
    let has_content = match case {
        Case::Vignette(vignette) => !vignette.chief_complaint.trim().is_empty(),
        Case::Observations(case) => case.observations.iter().any(|o| !o.trim().is_empty()),
    };
    if !has_content {
        return Err(ReasoningError::InvalidInput(format!(
            "case {} has neither a chief complaint nor observations",
            case.id()
        )));
    }
    Ok(())
}

/// Validates that a case identifier can be used as a single file name.
///
/// - Rejects empty or whitespace-only identifiers
/// - Bounds the length to what common file systems accept
/// - Rejects path separators, `.`/`..` and control characters
pub fn validate_case_file_name(id: &str) -> ReasoningResult<()> {
    const MAX_FILE_NAME_LEN: usize = 250;

    if id.trim().is_empty() {
        return Err(ReasoningError::InvalidInput(
            "case identifier cannot be empty".into(),
        ));
    }

    if id.len() > MAX_FILE_NAME_LEN {
        return Err(ReasoningError::InvalidInput(format!(
            "case identifier exceeds maximum length of {} bytes",
            MAX_FILE_NAME_LEN
        )));
    }

    if id == "." || id == ".." {
        return Err(ReasoningError::InvalidInput(
            "case identifier cannot be a relative path component".into(),
        ));
    }

    if id.chars().any(|c| matches!(c, '/' | '\\') || c.is_control()) {
        return Err(ReasoningError::InvalidInput(
            "case identifier contains path separators or control characters".into(),
        ));
    }

    Ok(())
}
