use crate::validation::ValidationError;

/// Errors raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage quota exceeded writing {key} ({size} bytes, limit {limit})")]
    QuotaExceeded {
        key: String,
        size: usize,
        limit: usize,
    },
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to serialize registry: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize registry: {0}")]
    Deserialization(serde_json::Error),
    #[error("registry schema mismatch at {path}: {message}")]
    Schema { path: String, message: String },
    #[error("patient not found: {0}")]
    PatientNotFound(String),
    #[error("failed to write CSV export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to finish export: {0}")]
    Export(String),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("invalid text: {0}")]
    Text(#[from] tcth_types::TextError),
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
