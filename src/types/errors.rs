//! Error types for lrustore.
//!
//! Three layers:
//!
//! - [`BackendError`]: what a durable store reports when it cannot be
//!   accessed or decoded.
//! - [`StoreError`]: what [`CacheBackedStore`](crate::store::CacheBackedStore)
//!   surfaces to its caller, tagged with the failing key and direction.
//! - [`LruStoreError`]: crate-level error for configuration, construction and
//!   the CLI.

use thiserror::Error;

/// Default result type for lrustore.
pub type LruStoreResult<T> = Result<T, LruStoreError>;

/// Failures raised by a durable store implementation.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Creates an `Unavailable` error.
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Failures at the durable-store boundary of a `CacheBackedStore`.
///
/// Whenever one of these is returned the cache was left exactly as it was
/// before the call.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to persist key '{key}': {source}")]
    PersistFailed {
        key: String,
        #[source]
        source: BackendError,
    },

    #[error("failed to read key '{key}': {source}")]
    ReadFailed {
        key: String,
        #[source]
        source: BackendError,
    },
}

impl StoreError {
    /// Key of the operation that failed.
    pub fn key(&self) -> &str {
        match self {
            StoreError::PersistFailed { key, .. } | StoreError::ReadFailed { key, .. } => key,
        }
    }

    /// Underlying backend failure.
    pub fn backend(&self) -> &BackendError {
        match self {
            StoreError::PersistFailed { source, .. } | StoreError::ReadFailed { source, .. } => {
                source
            }
        }
    }
}

/// Crate-level errors.
#[derive(Error, Debug)]
pub enum LruStoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid cache capacity {0}: must be zero or positive")]
    InvalidCapacity(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("{0}")]
    Other(String),
}

impl LruStoreError {
    /// Creates a generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
