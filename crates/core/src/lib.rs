//! # MedIntel Core
//!
//! Clinical decision logic for the MedIntel records backend:
//! - Symptom classification with a seeded random forest (`classifier`, `forest`)
//! - Model artifact persistence behind an injectable store (`storage`)
//! - Medication interaction and allergy screening (`screener`)
//! - Versioned reference data with startup validation (`reference`, `validation`)
//! - Diagnosis summary records (`records`)
//!
//! **No API concerns**: HTTP servers, request payloads and CLI parsing belong in `api-rest`,
//! `api-shared` and `medintel-cli`.

pub mod classifier;
pub mod config;
pub mod constants;
pub mod error;
pub mod forest;
pub mod records;
pub mod reference;
pub mod screener;
pub mod service;
pub mod storage;
pub mod symptoms;
pub mod validation;

pub use classifier::{ClassifierCell, ConditionLabel, DiagnosisResult, SymptomClassifier};
pub use config::CoreConfig;
pub use constants::DEFAULT_MODEL_PATH;
pub use error::{CoreError, CoreResult};
pub use forest::{ForestParams, RandomForest};
pub use records::{DiagnosisRecord, InMemoryRecordStore, RecordStore};
pub use reference::{ReferenceData, Severity};
pub use screener::{AllergyFinding, InteractionFinding, MedicationSafetyScreener, ScreeningReport};
pub use service::DecisionService;
pub use storage::{FileModelStore, InMemoryModelStore, ModelArtifact, ModelStore};
pub use symptoms::SymptomObservation;
