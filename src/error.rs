//! Error types for the collaborators around the orchestrator.

use thiserror::Error;

/// Document store / analysis table failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid stored value: {0}")]
    InvalidValue(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Search index failures. All of them are non-fatal to an analysis.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The index has not been created or populated yet.
    #[error("search index not ready: {0}")]
    NotReady(String),

    #[error("search query failed: {0}")]
    Query(String),

    #[error("unsupported search column: {0}")]
    UnsupportedColumn(String),
}

/// Generative model service failures.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to model service at {0}")]
    Connect(String),

    #[error("model service error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to send request: {0}")]
    Request(#[from] reqwest::Error),
}

/// Document provider failures. Never propagated past the provider runner.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid document file {path}: {source}")]
    InvalidFile {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document directory not found: {0}")]
    MissingDirectory(String),
}
