//! Static clinical reference data.
//!
//! The canonical symptom list, the condition labels with their training rows, and the medication
//! interaction and allergy tables are domain knowledge rather than code. They ship as a YAML
//! payload embedded in the binary and can be replaced at startup by a file on disk, so the tables
//! can be updated without recompiling.
//!
//! Every list is an ordered sequence. Symptom order defines the feature vector layout and
//! condition order defines the class indices of the diagnostic model.

use crate::constants::HIGH_SEVERITY;
use crate::validation::validate_reference_data;
use crate::{CoreError, CoreResult};
use medintel_types::{LookupKey, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::path::Path;

const EMBEDDED_REFERENCE_DATA: &str = include_str!("../data/reference_data.yaml");

/// Severity attached to interaction and allergy rules.
///
/// Only `high` exists today; the enum keeps room for a richer scale without changing the wire
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => HIGH_SEVERITY,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A condition label together with the illustrative symptom row used to train the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConditionProfile {
    pub name: NonEmptyText,
    pub training_row: Vec<u8>,
}

/// An unordered medication pair with its warning.
///
/// `medications` keeps the order written in the reference data; findings report that order
/// regardless of how the caller listed the drugs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InteractionRule {
    pub medications: [LookupKey; 2],
    pub warning: NonEmptyText,
    pub severity: Severity,
}

/// An allergen category and the medications unsafe for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AllergyRule {
    pub allergy: LookupKey,
    pub medications: Vec<LookupKey>,
}

/// The full reference payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferenceData {
    pub version: u32,
    pub symptoms: Vec<NonEmptyText>,
    pub conditions: Vec<ConditionProfile>,
    #[serde(default)]
    pub interactions: Vec<InteractionRule>,
    #[serde(default)]
    pub allergies: Vec<AllergyRule>,
}

impl ReferenceData {
    /// Parse and validate the payload compiled into the binary.
    pub fn embedded() -> CoreResult<Self> {
        Self::from_yaml_str(EMBEDDED_REFERENCE_DATA)
    }

    /// Parse and validate a YAML payload.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::YamlDeserialization` for malformed YAML and
    /// `CoreError::InvalidReferenceData` when the tables are inconsistent (see
    /// [`validate_reference_data`]).
    pub fn from_yaml_str(yaml: &str) -> CoreResult<Self> {
        let data: ReferenceData =
            serde_yaml::from_str(yaml).map_err(CoreError::YamlDeserialization)?;
        validate_reference_data(&data)?;
        Ok(data)
    }

    /// Read, parse and validate a payload from disk.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(CoreError::ReferenceRead)?;
        Self::from_yaml_str(&yaml)
    }

    /// Load the override file if one is configured, otherwise the embedded payload.
    pub fn load(override_path: Option<&Path>) -> CoreResult<Self> {
        match override_path {
            Some(path) => {
                tracing::info!("loading reference data from {}", path.display());
                Self::from_path(path)
            }
            None => Self::embedded(),
        }
    }

    /// Symptom names in feature order.
    pub fn symptom_names(&self) -> impl Iterator<Item = &str> {
        self.symptoms.iter().map(NonEmptyText::as_str)
    }

    /// Condition names in class order.
    pub fn condition_names(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|c| c.name.as_str())
    }
}
