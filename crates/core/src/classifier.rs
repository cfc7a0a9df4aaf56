//! Symptom classifier.
//!
//! Maps a [`SymptomObservation`] to the most likely condition and a confidence score using a
//! [`RandomForest`] fitted on the reference training rows.
//!
//! ## Startup
//!
//! [`SymptomClassifier::load_or_train`] reads the stored artifact and falls back to fitting a
//! fresh model (and saving it) when the artifact is missing, unreadable, or was trained against
//! different reference data. [`ClassifierCell`] wraps that in a single-initialisation guard so
//! concurrent callers share one model and never retrain twice.
//!
//! The embedded training set holds exactly one row per condition. Probabilities from such a model
//! are illustrative only; this is not a diagnostic-grade classifier.

use crate::constants::MODEL_FORMAT_VERSION;
use crate::forest::{ForestParams, RandomForest};
use crate::reference::ReferenceData;
use crate::storage::{ModelArtifact, ModelStore};
use crate::symptoms::SymptomObservation;
use crate::{CoreError, CoreResult};
use medintel_types::NonEmptyText;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// A condition the classifier can predict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConditionLabel(NonEmptyText);

impl ConditionLabel {
    pub fn new(name: NonEmptyText) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisResult {
    pub condition: ConditionLabel,
    /// Percentage in `[0, 100]`, rounded to two decimal places.
    pub confidence: f64,
    /// Canonical symptoms flagged present, in canonical order.
    pub detected_symptoms: Vec<NonEmptyText>,
}

/// Rounds a probability to a percentage with two decimal places.
pub fn confidence_percentage(probability: f64) -> f64 {
    let percent = (probability * 100.0).clamp(0.0, 100.0);
    (percent * 100.0).round() / 100.0
}

/// A fitted classifier bound to its symptom and condition layout.
#[derive(Debug, Clone)]
pub struct SymptomClassifier {
    symptoms: Vec<NonEmptyText>,
    conditions: Vec<ConditionLabel>,
    forest: RandomForest,
}

impl SymptomClassifier {
    /// Fits a new classifier on the reference training rows, one row per condition.
    pub fn train(reference: &ReferenceData, params: ForestParams) -> CoreResult<Self> {
        let rows: Vec<Vec<f64>> = reference
            .conditions
            .iter()
            .map(|c| c.training_row.iter().map(|&v| f64::from(v)).collect())
            .collect();
        let labels: Vec<usize> = (0..reference.conditions.len()).collect();

        let forest = RandomForest::fit(&rows, &labels, reference.conditions.len(), params)?;
        tracing::info!(
            "trained diagnostic model: {} trees, {} symptoms, {} conditions",
            params.n_estimators,
            reference.symptoms.len(),
            reference.conditions.len()
        );

        Ok(Self::assemble(reference, forest))
    }

    /// Rebuilds a classifier from a stored artifact.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ModelMismatch` if the artifact's format version, symptom list or
    /// condition list differ from `reference`, or if the forest is structurally invalid.
    pub fn from_artifact(reference: &ReferenceData, artifact: ModelArtifact) -> CoreResult<Self> {
        if artifact.format_version != MODEL_FORMAT_VERSION {
            return Err(CoreError::ModelMismatch(format!(
                "format version {} (expected {})",
                artifact.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if !artifact.symptoms.iter().map(String::as_str).eq(reference.symptom_names()) {
            return Err(CoreError::ModelMismatch("symptom list differs".into()));
        }
        if !artifact
            .conditions
            .iter()
            .map(String::as_str)
            .eq(reference.condition_names())
        {
            return Err(CoreError::ModelMismatch("condition list differs".into()));
        }
        let forest = artifact.forest;
        if forest.n_features() != reference.symptoms.len()
            || forest.n_classes() != reference.conditions.len()
            || !forest.is_well_formed()
        {
            return Err(CoreError::ModelMismatch("forest shape is invalid".into()));
        }

        Ok(Self::assemble(reference, forest))
    }

    fn assemble(reference: &ReferenceData, forest: RandomForest) -> Self {
        Self {
            symptoms: reference.symptoms.clone(),
            conditions: reference
                .conditions
                .iter()
                .map(|c| ConditionLabel::new(c.name.clone()))
                .collect(),
            forest,
        }
    }

    /// Loads the stored model, or fits and stores a new one.
    ///
    /// A missing, unreadable or mismatched artifact is not an error: it is logged and replaced.
    ///
    /// # Errors
    ///
    /// Returns an error only if fitting fails or the freshly fitted model cannot be saved.
    pub fn load_or_train(
        reference: &ReferenceData,
        params: ForestParams,
        store: &dyn ModelStore,
    ) -> CoreResult<Self> {
        match store.load() {
            Ok(Some(artifact)) => match Self::from_artifact(reference, artifact) {
                Ok(classifier) => {
                    tracing::info!("loaded diagnostic model from {}", store.describe());
                    return Ok(classifier);
                }
                Err(e) => {
                    tracing::warn!("discarding stored model at {}: {}", store.describe(), e);
                }
            },
            Ok(None) => {
                tracing::info!("no diagnostic model at {}, training", store.describe());
            }
            Err(e) => {
                tracing::warn!("failed to load model from {}: {}", store.describe(), e);
            }
        }

        Self::train_and_save(reference, params, store)
    }

    /// Fits a new model and overwrites whatever the store holds.
    pub fn train_and_save(
        reference: &ReferenceData,
        params: ForestParams,
        store: &dyn ModelStore,
    ) -> CoreResult<Self> {
        let classifier = Self::train(reference, params)?;
        store.save(&classifier.to_artifact())?;
        tracing::info!("saved diagnostic model to {}", store.describe());
        Ok(classifier)
    }

    pub fn to_artifact(&self) -> ModelArtifact {
        ModelArtifact::new(
            self.symptoms.iter().map(|s| s.as_str().to_owned()).collect(),
            self.conditions.iter().map(|c| c.as_str().to_owned()).collect(),
            self.forest.clone(),
        )
    }

    /// Encodes an observation as a feature vector in canonical symptom order.
    pub fn encode(&self, observation: &SymptomObservation) -> Vec<f64> {
        self.symptoms
            .iter()
            .map(|s| if observation.is_present(s.as_str()) { 1.0 } else { 0.0 })
            .collect()
    }

    /// Classifies an observation.
    pub fn predict(&self, observation: &SymptomObservation) -> DiagnosisResult {
        let features = self.encode(observation);
        let (index, probability) = self.forest.predict(&features);

        let detected_symptoms = self
            .symptoms
            .iter()
            .zip(&features)
            .filter(|&(_, &v)| v > 0.0)
            .map(|(s, _)| s.clone())
            .collect();

        DiagnosisResult {
            condition: self.conditions[index].clone(),
            confidence: confidence_percentage(probability),
            detected_symptoms,
        }
    }

    /// Class probabilities for an observation, in condition order.
    pub fn probabilities(&self, observation: &SymptomObservation) -> Vec<f64> {
        self.forest.predict_proba(&self.encode(observation))
    }

    pub fn symptoms(&self) -> &[NonEmptyText] {
        &self.symptoms
    }

    pub fn conditions(&self) -> &[ConditionLabel] {
        &self.conditions
    }
}

/// Loads or trains the classifier at most once and hands out shared references to it.
#[derive(Debug, Default)]
pub struct ClassifierCell {
    slot: Mutex<Option<Arc<SymptomClassifier>>>,
}

impl ClassifierCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the published classifier, initialising it first if needed.
    ///
    /// Callers that arrive while initialisation is running wait for it and receive the same
    /// instance. A failed initialisation publishes nothing, so the next call tries again.
    pub fn get_or_init(
        &self,
        reference: &ReferenceData,
        params: ForestParams,
        store: &dyn ModelStore,
    ) -> CoreResult<Arc<SymptomClassifier>> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| CoreError::ClassifierLockPoisoned)?;
        if let Some(classifier) = slot.as_ref() {
            return Ok(Arc::clone(classifier));
        }

        let classifier = Arc::new(SymptomClassifier::load_or_train(reference, params, store)?);
        *slot = Some(Arc::clone(&classifier));
        Ok(classifier)
    }

    /// Replaces the published classifier.
    pub fn publish(&self, classifier: SymptomClassifier) -> CoreResult<Arc<SymptomClassifier>> {
        let classifier = Arc::new(classifier);
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| CoreError::ClassifierLockPoisoned)?;
        *slot = Some(Arc::clone(&classifier));
        Ok(classifier)
    }

    /// The published classifier, if initialisation has completed.
    pub fn get(&self) -> Option<Arc<SymptomClassifier>> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}
