//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Nothing
//! in this crate reads environment variables; binaries read them and hand the raw values to the
//! `*_from_env_value` helpers below.

use crate::constants::{DEFAULT_MODEL_PATH, DEFAULT_MODEL_SEED, DEFAULT_TREE_COUNT};
use crate::forest::ForestParams;
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    model_path: PathBuf,
    reference_data_path: Option<PathBuf>,
    forest: ForestParams,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Configuration` if the model path is empty, the forest has no trees, or
    /// a reference data override is given that is not a file.
    pub fn new(
        model_path: PathBuf,
        reference_data_path: Option<PathBuf>,
        forest: ForestParams,
    ) -> CoreResult<Self> {
        if model_path.as_os_str().is_empty() {
            return Err(CoreError::Configuration(
                "model path cannot be empty".into(),
            ));
        }
        if forest.n_estimators == 0 {
            return Err(CoreError::Configuration(
                "tree count must be at least 1".into(),
            ));
        }
        if let Some(path) = &reference_data_path {
            if !path.is_file() {
                return Err(CoreError::Configuration(format!(
                    "reference data file does not exist: {}",
                    path.display()
                )));
            }
        }

        Ok(Self {
            model_path,
            reference_data_path,
            forest,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn reference_data_path(&self) -> Option<&Path> {
        self.reference_data_path.as_deref()
    }

    pub fn forest(&self) -> ForestParams {
        self.forest
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            reference_data_path: None,
            forest: ForestParams::default(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Model path from an optional value, falling back to the default.
pub fn model_path_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
}

/// Reference data override from an optional value. Blank means "use the embedded payload".
pub fn reference_data_path_from_env_value(value: Option<String>) -> Option<PathBuf> {
    non_blank(value).map(PathBuf::from)
}

/// Forest seed from an optional value.
///
/// If `value` is `None` or empty/whitespace, returns the default seed.
pub fn seed_from_env_value(value: Option<String>) -> CoreResult<u64> {
    match non_blank(value) {
        Some(v) => v
            .parse()
            .map_err(|_| CoreError::Configuration(format!("invalid model seed: {v}"))),
        None => Ok(DEFAULT_MODEL_SEED),
    }
}

/// Tree count from an optional value.
///
/// If `value` is `None` or empty/whitespace, returns the default count. Zero is rejected.
pub fn tree_count_from_env_value(value: Option<String>) -> CoreResult<usize> {
    match non_blank(value) {
        Some(v) => match v.parse::<usize>() {
            Ok(0) | Err(_) => Err(CoreError::Configuration(format!(
                "invalid tree count: {v} (expected a positive integer)"
            ))),
            Ok(n) => Ok(n),
        },
        None => Ok(DEFAULT_TREE_COUNT),
    }
}
