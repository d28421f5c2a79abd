use std::path::PathBuf;
use thiserror::Error;

/// Result type for key-value store operations
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed store contents: {0}")]
    Json(#[from] serde_json::Error),
}

/// String-keyed, string-valued persistent store
///
/// Transcripts are saved under their name with a JSON value. Implementations:
/// - JSON file on disk (the application default)
/// - In-memory map for tests
pub trait KeyValueStore: Send + Sync {
    /// Read a value; a missing key is `Ok(None)`, not an error
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Create or overwrite a value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a value, returning whether it existed
    fn remove(&self, key: &str) -> StorageResult<bool>;

    /// All keys, sorted
    fn keys(&self) -> StorageResult<Vec<String>>;
}
