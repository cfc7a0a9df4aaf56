//! Decision service.
//!
//! Bundles the reference data, the screener and the lazily initialised classifier behind one
//! cloneable handle. API crates hold a `DecisionService` in their state and call it from request
//! handlers; the CLI uses it directly.

use crate::classifier::{ClassifierCell, DiagnosisResult, SymptomClassifier};
use crate::config::CoreConfig;
use crate::forest::ForestParams;
use crate::reference::ReferenceData;
use crate::screener::{MedicationSafetyScreener, ScreeningReport};
use crate::storage::{FileModelStore, ModelStore};
use crate::symptoms::SymptomObservation;
use crate::CoreResult;
use std::sync::Arc;

#[derive(Clone)]
pub struct DecisionService {
    reference: Arc<ReferenceData>,
    screener: Arc<MedicationSafetyScreener>,
    classifier: Arc<ClassifierCell>,
    store: Arc<dyn ModelStore>,
    params: ForestParams,
}

impl DecisionService {
    /// Builds the service from startup configuration.
    ///
    /// Loads the reference data and prepares a file-backed model store. The model itself is
    /// loaded on first use or by [`DecisionService::initialise`].
    pub fn new(cfg: &CoreConfig) -> CoreResult<Self> {
        let reference = ReferenceData::load(cfg.reference_data_path())?;
        let store = Arc::new(FileModelStore::new(cfg.model_path()));
        Ok(Self::with_store(Arc::new(reference), cfg.forest(), store))
    }

    /// Builds the service around an explicit model store.
    pub fn with_store(
        reference: Arc<ReferenceData>,
        params: ForestParams,
        store: Arc<dyn ModelStore>,
    ) -> Self {
        let screener = Arc::new(MedicationSafetyScreener::from_reference(&reference));
        Self {
            reference,
            screener,
            classifier: Arc::new(ClassifierCell::new()),
            store,
            params,
        }
    }

    /// Loads or trains the classifier now rather than on the first diagnosis.
    pub fn initialise(&self) -> CoreResult<Arc<SymptomClassifier>> {
        self.classifier()
    }

    /// The shared classifier, initialised on first call.
    pub fn classifier(&self) -> CoreResult<Arc<SymptomClassifier>> {
        self.classifier
            .get_or_init(&self.reference, self.params, self.store.as_ref())
    }

    /// Fits a fresh model, overwrites the stored artifact and publishes the new model.
    pub fn retrain(&self) -> CoreResult<Arc<SymptomClassifier>> {
        let classifier =
            SymptomClassifier::train_and_save(&self.reference, self.params, self.store.as_ref())?;
        self.classifier.publish(classifier)
    }

    pub fn diagnose(&self, observation: &SymptomObservation) -> CoreResult<DiagnosisResult> {
        Ok(self.classifier()?.predict(observation))
    }

    pub fn screen<M: AsRef<str>, A: AsRef<str>>(
        &self,
        medications: &[M],
        allergies: &[A],
    ) -> ScreeningReport {
        self.screener.screen(medications, allergies)
    }

    pub fn screener(&self) -> &MedicationSafetyScreener {
        &self.screener
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }
}
