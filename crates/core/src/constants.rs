//! Constants used throughout the MedIntel core crate.
//!
//! Default paths and model parameters live here so the binaries, the CLI and the tests all agree
//! on them.

/// Default location of the persisted diagnostic model artifact.
pub const DEFAULT_MODEL_PATH: &str = "models/diagnostic_model.json";

/// Default seed for fitting the random forest.
pub const DEFAULT_MODEL_SEED: u64 = 42;

/// Default number of trees in the random forest.
pub const DEFAULT_TREE_COUNT: usize = 100;

/// Version written into model artifacts. Artifacts with another version are retrained.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Severity label used by every rule in the reference data.
pub const HIGH_SEVERITY: &str = "high";
