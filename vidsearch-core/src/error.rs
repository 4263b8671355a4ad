//! Error types for vidsearch-core

use thiserror::Error;

/// Errors that can occur while building or searching a video index
#[derive(Debug, Error)]
pub enum SearchError {
    /// Query text is empty or unusable after normalization
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A raw record could not be indexed
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Two records in one build share a video id
    #[error("Duplicate video id in batch: {0}")]
    DuplicateVideoId(String),

    /// Vector length differs from the index or model dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Index was built with a different embedding model than the one serving queries
    #[error("Model mismatch: index built with '{index}', engine uses '{engine}'")]
    ModelMismatch { index: String, engine: String },

    /// Index artifact failed validation
    #[error("Corrupt index artifact: {0}")]
    CorruptArtifact(String),

    /// Configuration value out of range or unparsable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No index has been loaded yet
    #[error("Index not ready: {0}")]
    NotReady(String),

    /// Model loading error
    #[error("Model error: {0}")]
    Model(String),

    /// Embedding generation error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// RocksDB error
    #[error("Storage error: {0}")]
    Storage(#[from] rocksdb::Error),

    /// Serialization error (bincode)
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Create an invalid query error
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create an invalid record error
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    /// Create a corrupt artifact error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptArtifact(msg.into())
    }

    /// Create an invalid configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a not-ready error
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create an embedding error
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Caller input was rejected; retrying the same request cannot succeed
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidQuery(_) | Self::InvalidRecord(_))
    }

    /// Failure of a dependency or readiness state that may clear on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Model(_) | Self::Embedding(_) | Self::NotReady(_))
    }
}

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
