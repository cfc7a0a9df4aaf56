//! Diagnosis summary records.
//!
//! When a diagnosis request names both a patient and a doctor, the request layer keeps a short
//! summary of the outcome. Where those summaries live is behind [`RecordStore`]; the service ships
//! with an in-memory store.

use crate::classifier::DiagnosisResult;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub id: Uuid,
    pub patient_id: String,
    pub doctor_id: String,
    pub diagnosis_text: String,
    pub diagnosis_date: DateTime<Utc>,
}

impl DiagnosisRecord {
    /// Summarises a diagnosis for the given patient and doctor.
    pub fn summarise(
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        result: &DiagnosisResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            diagnosis_text: format!(
                "Disease: {}, Confidence: {}%",
                result.condition,
                format_confidence(result.confidence)
            ),
            diagnosis_date: Utc::now(),
        }
    }
}

/// Whole percentages keep one decimal place (`78.0`), others print as-is (`42.5`).
fn format_confidence(confidence: f64) -> String {
    if confidence.fract() == 0.0 {
        format!("{confidence:.1}")
    } else {
        confidence.to_string()
    }
}

pub trait RecordStore: Send + Sync {
    fn append(&self, record: DiagnosisRecord) -> CoreResult<()>;

    /// All records, oldest first.
    fn list(&self) -> CoreResult<Vec<DiagnosisRecord>>;
}

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<DiagnosisRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn append(&self, record: DiagnosisRecord) -> CoreResult<()> {
        self.records
            .write()
            .map_err(|_| CoreError::RecordStore("lock poisoned".into()))?
            .push(record);
        Ok(())
    }

    fn list(&self) -> CoreResult<Vec<DiagnosisRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| CoreError::RecordStore("lock poisoned".into()))?;
        Ok(records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ConditionLabel;
    use medintel_types::NonEmptyText;

    fn result() -> DiagnosisResult {
        DiagnosisResult {
            condition: ConditionLabel::new(NonEmptyText::new("Influenza").unwrap()),
            confidence: 42.5,
            detected_symptoms: vec![NonEmptyText::new("fever").unwrap()],
        }
    }

    #[test]
    fn test_summary_text() {
        let record = DiagnosisRecord::summarise("1", "2", &result());
        assert_eq!(record.diagnosis_text, "Disease: Influenza, Confidence: 42.5%");
        assert_eq!(record.patient_id, "1");
        assert_eq!(record.doctor_id, "2");
    }

    #[test]
    fn test_summary_text_keeps_decimal_for_whole_confidence() {
        let mut whole = result();
        whole.confidence = 78.0;
        let record = DiagnosisRecord::summarise("1", "2", &whole);
        assert_eq!(record.diagnosis_text, "Disease: Influenza, Confidence: 78.0%");

        whole.confidence = 100.0;
        let record = DiagnosisRecord::summarise("1", "2", &whole);
        assert_eq!(record.diagnosis_text, "Disease: Influenza, Confidence: 100.0%");
    }

    #[test]
    fn test_in_memory_store_keeps_insertion_order() {
        let store = InMemoryRecordStore::new();
        assert!(store.list().unwrap().is_empty());

        let first = DiagnosisRecord::summarise("1", "2", &result());
        let second = DiagnosisRecord::summarise("3", "4", &result());
        store.append(first.clone()).unwrap();
        store.append(second.clone()).unwrap();

        assert_eq!(store.list().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = DiagnosisRecord::summarise("1", "2", &result());
        let b = DiagnosisRecord::summarise("1", "2", &result());
        assert_ne!(a.id, b.id);
    }
}
