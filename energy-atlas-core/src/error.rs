//! Error types for the Energy Atlas core library.
//!
//! Uses `thiserror` for public API error types. The taxonomy keeps transport
//! failures, source schema drift, bad values, and storage failures apart so an
//! operator can tell "the source changed shape" from "the source sent bad data".

use std::path::PathBuf;

use crate::dataset::DatasetKind;

/// Top-level error type for the Energy Atlas core library.
#[derive(Debug, thiserror::Error)]
pub enum EnergyError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Schema mismatch in {dataset} source: missing column(s) {}", .missing.join(", "))]
    SchemaMismatch {
        dataset: DatasetKind,
        missing: Vec<String>,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid query parameter '{param}': {reason}")]
    QueryValidation { param: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ingestion of table '{}' failed: {source}", .dataset.table_name())]
    Ingest {
        dataset: DatasetKind,
        #[source]
        source: Box<EnergyError>,
    },
}

impl EnergyError {
    /// Wrap an error with the dataset whose pipeline produced it.
    pub fn ingest(dataset: DatasetKind, source: EnergyError) -> Self {
        Self::Ingest {
            dataset,
            source: Box::new(source),
        }
    }

    pub fn query_validation(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::QueryValidation {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// The dataset this error is attributed to, if any.
    pub fn dataset(&self) -> Option<DatasetKind> {
        match self {
            Self::Ingest { dataset, .. } | Self::SchemaMismatch { dataset, .. } => Some(*dataset),
            Self::Parse(e) => Some(e.dataset()),
            _ => None,
        }
    }
}

/// Errors from retrieving a remote CSV source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("GET {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("No source registered for dataset '{dataset}'")]
    UnknownSource { dataset: DatasetKind },
}

impl FetchError {
    /// Transient failures worth another attempt. Client errors are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::UnknownSource { .. } => false,
        }
    }
}

/// Errors from converting a CSV record into a typed row.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{dataset} line {line}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        dataset: DatasetKind,
        line: u64,
        column: String,
        value: String,
    },

    #[error("{dataset} line {line}: malformed CSV record: {message}")]
    MalformedRecord {
        dataset: DatasetKind,
        line: u64,
        message: String,
    },
}

impl ParseError {
    pub fn dataset(&self) -> DatasetKind {
        match self {
            Self::InvalidNumber { dataset, .. }
            | Self::MalformedRecord { dataset, .. } => *dataset,
        }
    }

    pub fn line(&self) -> u64 {
        match self {
            Self::InvalidNumber { line, .. }
            | Self::MalformedRecord { line, .. } => *line,
        }
    }
}

/// Errors from the relational store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to open database {path}: {message}")]
    Unavailable { path: PathBuf, message: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage task failed: {message}")]
    Task { message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Convenience type alias for results using EnergyError.
pub type Result<T> = std::result::Result<T, EnergyError>;

impl From<rusqlite::Error> for EnergyError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Sqlite(err))
    }
}
