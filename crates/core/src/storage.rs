//! Model artifact storage.
//!
//! The diagnostic model is fitted once and then reused across restarts. Where it lives is an
//! injected dependency: [`FileModelStore`] for the running service and [`InMemoryModelStore`] for
//! tests and one-off tools.

use crate::constants::MODEL_FORMAT_VERSION;
use crate::forest::RandomForest;
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A persisted diagnostic model together with the label layout it was trained against.
///
/// Storing the symptom and condition names lets a loader detect an artifact left over from
/// different reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub symptoms: Vec<String>,
    pub conditions: Vec<String>,
    pub forest: RandomForest,
}

impl ModelArtifact {
    pub fn new(symptoms: Vec<String>, conditions: Vec<String>, forest: RandomForest) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            symptoms,
            conditions,
            forest,
        }
    }
}

/// Load/save interface for model artifacts.
pub trait ModelStore: Send + Sync {
    /// Load the stored artifact.
    ///
    /// # Returns
    /// `Ok(None)` if nothing has been stored yet.
    ///
    /// # Errors
    /// Returns an error if an artifact exists but cannot be read or decoded.
    fn load(&self) -> CoreResult<Option<ModelArtifact>>;

    /// Store an artifact, replacing any previous one.
    fn save(&self, artifact: &ModelArtifact) -> CoreResult<()>;

    /// Human-readable location, used in log messages.
    fn describe(&self) -> String;
}

/// Stores the artifact as a JSON file.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ModelStore for FileModelStore {
    fn load(&self) -> CoreResult<Option<ModelArtifact>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoreError::ModelRead(e)),
        };
        let artifact = serde_json::from_slice(&bytes).map_err(CoreError::ModelDecode)?;
        Ok(Some(artifact))
    }

    fn save(&self, artifact: &ModelArtifact) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(CoreError::ModelWrite)?;
            }
        }

        let json = serde_json::to_vec(artifact).map_err(CoreError::ModelEncode)?;

        // Write then rename so a crash never leaves a half-written artifact behind.
        let temp = self.temp_path();
        std::fs::write(&temp, json).map_err(CoreError::ModelWrite)?;
        std::fs::rename(&temp, &self.path).map_err(CoreError::ModelWrite)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps the artifact in memory. Counts saves so tests can check how often training happened.
#[derive(Debug, Default)]
pub struct InMemoryModelStore {
    artifact: Mutex<Option<ModelArtifact>>,
    saves: Mutex<usize>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(artifact: ModelArtifact) -> Self {
        Self {
            artifact: Mutex::new(Some(artifact)),
            saves: Mutex::new(0),
        }
    }

    /// Number of times [`ModelStore::save`] has been called.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

impl ModelStore for InMemoryModelStore {
    fn load(&self) -> CoreResult<Option<ModelArtifact>> {
        let slot = self
            .artifact
            .lock()
            .map_err(|_| CoreError::ModelRead(std::io::Error::other("model store lock poisoned")))?;
        Ok(slot.clone())
    }

    fn save(&self, artifact: &ModelArtifact) -> CoreResult<()> {
        let mut slot = self
            .artifact
            .lock()
            .map_err(|_| CoreError::ModelWrite(std::io::Error::other("model store lock poisoned")))?;
        *slot = Some(artifact.clone());
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".into()
    }
}
