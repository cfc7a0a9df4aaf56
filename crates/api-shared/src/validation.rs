//! Request payload validation.
//!
//! Turns wire requests into core inputs, rejecting payloads that lack a required field. The
//! error message names the missing field so the caller can fix the request.

use crate::dto::{CheckInteractionReq, DiagnoseReq};
use medintel_core::SymptomObservation;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No {0} provided")]
    MissingField(&'static str),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Who a diagnosis should be recorded against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub patient_id: String,
    pub doctor_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisInput {
    pub observation: SymptomObservation,
    /// Present only when both a patient and a doctor were supplied.
    pub attribution: Option<Attribution>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreeningInput {
    pub medications: Vec<String>,
    pub allergies: Vec<String>,
}

impl DiagnoseReq {
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField("symptoms")` when no symptom mapping was sent.
    pub fn validate(self) -> ValidationResult<DiagnosisInput> {
        let symptoms = self
            .symptoms
            .ok_or(ValidationError::MissingField("symptoms"))?;

        let attribution = match (self.patient_id, self.doctor_id) {
            (Some(patient), Some(doctor)) if !patient.is_blank() && !doctor.is_blank() => {
                Some(Attribution {
                    patient_id: patient.to_string(),
                    doctor_id: doctor.to_string(),
                })
            }
            _ => None,
        };

        Ok(DiagnosisInput {
            observation: SymptomObservation::from_json_map(&symptoms),
            attribution,
        })
    }
}

impl CheckInteractionReq {
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField("medications")` when no medication list was sent.
    /// A missing allergy list is treated as empty.
    pub fn validate(self) -> ValidationResult<ScreeningInput> {
        let medications = self
            .medications
            .ok_or(ValidationError::MissingField("medications"))?;
        Ok(ScreeningInput {
            medications,
            allergies: self.allergies.unwrap_or_default(),
        })
    }
}
