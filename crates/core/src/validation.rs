//! Reference data validation.
//!
//! The diagnostic model indexes symptoms and conditions by position, and the screener keys its
//! tables by name. These checks run once when the reference payload is loaded so that an
//! inconsistent payload stops the process at startup instead of producing wrong answers later.

use crate::reference::ReferenceData;
use crate::{CoreError, CoreResult};
use std::collections::HashSet;

/// Validates a parsed reference payload.
///
/// Rejects:
/// - an empty symptom list or an empty condition list
/// - duplicate symptom, condition or allergy names
/// - training rows whose length differs from the symptom count, or that contain values other
///   than 0 and 1
/// - interaction rules that pair a medication with itself, or that repeat a pair already listed
///   (in either order)
///
/// # Errors
///
/// Returns `CoreError::InvalidReferenceData` describing the first problem found.
pub fn validate_reference_data(data: &ReferenceData) -> CoreResult<()> {
    if data.symptoms.is_empty() {
        return Err(CoreError::InvalidReferenceData(
            "symptom list cannot be empty".into(),
        ));
    }
    if data.conditions.is_empty() {
        return Err(CoreError::InvalidReferenceData(
            "condition list cannot be empty".into(),
        ));
    }

    let mut seen = HashSet::new();
    for symptom in &data.symptoms {
        if !seen.insert(symptom.as_str()) {
            return Err(CoreError::InvalidReferenceData(format!(
                "duplicate symptom: {symptom}"
            )));
        }
    }

    let width = data.symptoms.len();
    let mut seen = HashSet::new();
    for condition in &data.conditions {
        if !seen.insert(condition.name.as_str()) {
            return Err(CoreError::InvalidReferenceData(format!(
                "duplicate condition: {}",
                condition.name
            )));
        }
        if condition.training_row.len() != width {
            return Err(CoreError::InvalidReferenceData(format!(
                "training row for {} has {} values, expected {}",
                condition.name,
                condition.training_row.len(),
                width
            )));
        }
        if condition.training_row.iter().any(|&v| v > 1) {
            return Err(CoreError::InvalidReferenceData(format!(
                "training row for {} must contain only 0 or 1",
                condition.name
            )));
        }
    }

    let mut pairs = HashSet::new();
    for rule in &data.interactions {
        let [first, second] = &rule.medications;
        if first == second {
            return Err(CoreError::InvalidReferenceData(format!(
                "interaction pairs {first} with itself"
            )));
        }
        let key = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        if !pairs.insert(key) {
            return Err(CoreError::InvalidReferenceData(format!(
                "duplicate interaction: {first} / {second}"
            )));
        }
    }

    let mut seen = HashSet::new();
    for rule in &data.allergies {
        if !seen.insert(&rule.allergy) {
            return Err(CoreError::InvalidReferenceData(format!(
                "duplicate allergy: {}",
                rule.allergy
            )));
        }
    }

    Ok(())
}
