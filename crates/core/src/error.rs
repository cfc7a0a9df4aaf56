#[allow(clippy::single_component_path_imports)]
use serde_yaml;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("invalid reference data: {0}")]
    InvalidReferenceData(String),
    #[error("failed to read reference data: {0}")]
    ReferenceRead(std::io::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("failed to train model: {0}")]
    Training(String),
    #[error("failed to read model artifact: {0}")]
    ModelRead(std::io::Error),
    #[error("failed to write model artifact: {0}")]
    ModelWrite(std::io::Error),
    #[error("failed to decode model artifact: {0}")]
    ModelDecode(serde_json::Error),
    #[error("failed to encode model artifact: {0}")]
    ModelEncode(serde_json::Error),
    #[error("model artifact does not match reference data: {0}")]
    ModelMismatch(String),
    #[error("classifier initialisation lock poisoned")]
    ClassifierLockPoisoned,

    #[error("record store unavailable: {0}")]
    RecordStore(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
