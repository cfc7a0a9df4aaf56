//! Wire types for the MedIntel APIs.
//!
//! Field names follow the JSON contract the web frontend already speaks (`disease`,
//! `symptoms_detected`, `drug_interactions`, ...), which is why they differ from the core type
//! names in places.

use medintel_core::{
    AllergyFinding, DiagnosisRecord, DiagnosisResult, InteractionFinding, ReferenceData,
    ScreeningReport,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body returned for rejected or failed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Patient or doctor identifier.
///
/// The web frontend sends numeric ids; other clients may send strings. Both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartyId {
    Number(i64),
    Text(String),
}

impl PartyId {
    /// Zero and the empty string count as "not supplied".
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(n) => *n == 0,
            Self::Text(s) => s.trim().is_empty(),
        }
    }
}

impl std::fmt::Display for PartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiagnoseReq {
    /// Symptom name to presence flag. Values are read by truthiness.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub symptoms: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub patient_id: Option<PartyId>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub doctor_id: Option<PartyId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiagnoseRes {
    pub disease: String,
    pub confidence: f64,
    pub symptoms_detected: Vec<String>,
}

impl From<&DiagnosisResult> for DiagnoseRes {
    fn from(result: &DiagnosisResult) -> Self {
        Self {
            disease: result.condition.to_string(),
            confidence: result.confidence,
            symptoms_detected: result
                .detected_symptoms
                .iter()
                .map(|s| s.as_str().to_owned())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CheckInteractionReq {
    #[serde(default)]
    pub medications: Option<Vec<String>>,
    #[serde(default)]
    pub allergies: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InteractionWarning {
    pub medication1: String,
    pub medication2: String,
    pub warning: String,
    pub severity: String,
}

impl From<InteractionFinding> for InteractionWarning {
    fn from(finding: InteractionFinding) -> Self {
        Self {
            medication1: finding.medication1,
            medication2: finding.medication2,
            warning: finding.warning,
            severity: finding.severity.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AllergyWarning {
    pub allergy: String,
    pub medication: String,
    pub warning: String,
    pub severity: String,
}

impl From<AllergyFinding> for AllergyWarning {
    fn from(finding: AllergyFinding) -> Self {
        Self {
            allergy: finding.allergy,
            medication: finding.medication,
            warning: finding.warning,
            severity: finding.severity.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CheckInteractionRes {
    pub drug_interactions: Vec<InteractionWarning>,
    pub allergy_warnings: Vec<AllergyWarning>,
    pub medications_checked: Vec<String>,
}

impl From<ScreeningReport> for CheckInteractionRes {
    fn from(report: ScreeningReport) -> Self {
        Self {
            drug_interactions: report
                .drug_interactions
                .into_iter()
                .map(Into::into)
                .collect(),
            allergy_warnings: report.allergy_warnings.into_iter().map(Into::into).collect(),
            medications_checked: report.medications_checked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Diagnosis {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub diagnosis_text: String,
    /// RFC 3339 timestamp.
    pub diagnosis_date: String,
}

impl From<DiagnosisRecord> for Diagnosis {
    fn from(record: DiagnosisRecord) -> Self {
        Self {
            id: record.id.simple().to_string(),
            patient_id: record.patient_id,
            doctor_id: record.doctor_id,
            diagnosis_text: record.diagnosis_text,
            diagnosis_date: record.diagnosis_date.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListRecordsRes {
    pub diagnoses: Vec<Diagnosis>,
}

/// The vocabulary a client can use when building requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceRes {
    pub symptoms: Vec<String>,
    pub conditions: Vec<String>,
    pub allergies: Vec<String>,
}

impl From<&ReferenceData> for ReferenceRes {
    fn from(reference: &ReferenceData) -> Self {
        Self {
            symptoms: reference.symptom_names().map(str::to_owned).collect(),
            conditions: reference.condition_names().map(str::to_owned).collect(),
            allergies: reference
                .allergies
                .iter()
                .map(|a| a.allergy.as_str().to_owned())
                .collect(),
        }
    }
}
