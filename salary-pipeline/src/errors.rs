//! Unified error types for the crate.
//!
//! One enum per stage so each stage can turn its own failures into a
//! skip/continue decision; [`EtlError`] is what crosses the crate boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for pipeline runs and startup.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Invalid configuration values.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The loader failed; nothing downstream ran.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Errors raised while reading the input file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input path does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A column required downstream is absent from the header.
    #[error("required column `{0}` not found in the dataset")]
    Schema(&'static str),

    /// A numeric cell could not be parsed.
    #[error("row {row}: column `{column}` has non-numeric value {value:?}")]
    Parse {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// Malformed CSV (ragged records, invalid UTF-8, ...).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the embedding stage.
///
/// `Init` aborts the whole phase; every other variant only skips one batch.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The provider could not be reached or the model could not be loaded.
    #[error("embedding service initialization failed: {0}")]
    Init(String),

    /// The provider call for a batch failed.
    #[error("embedding request failed: {0}")]
    Request(String),

    /// The provider returned a different number of vectors than texts sent.
    #[error("embedding response has {got} vectors for {want} texts")]
    CountMismatch { got: usize, want: usize },

    /// The provider returned a zero-length vector.
    #[error("embedding response contains an empty vector")]
    EmptyVector,

    /// Mismatch in vector dimensionality across the run.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// `embed_batch` was called before a successful `initialize`.
    #[error("embedding provider used before initialization")]
    NotInitialized,
}

impl EmbeddingError {
    /// `true` for errors that abort the whole embedding phase.
    pub fn is_init(&self) -> bool {
        matches!(self, Self::Init(_))
    }
}

/// Errors raised by the sink stage.
#[derive(Debug, Error)]
pub enum SinkError {
    /// No connection string configured; the stage is skipped.
    #[error("MONGODB_URI not found in environment variables")]
    Config,

    /// The store could not be reached.
    #[error("connection error: {0}")]
    Connect(String),

    /// Clearing or inserting failed mid-stage.
    #[error("write error: {0}")]
    Write(String),
}

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A number failed to parse.
    #[error("invalid number in {var}: {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    /// A batch size of zero would never make progress.
    #[error("{0} must be > 0")]
    ZeroBatchSize(&'static str),

    /// Embedding provider settings were rejected.
    #[error(transparent)]
    Embedding(#[from] embedding_service::ConfigError),
}
