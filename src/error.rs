//! Error types for the lakehouse pipeline
//!
//! Stage functions return `Result<T, PipelineError>`. "Nothing to recommend"
//! is not an error: see `PrescriptiveEngine::calc_scores`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the Bronze/Silver/Gold stages
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source file is unreadable or not valid tabular text
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Source file has no header line
    #[error("Failed to parse {}: file is empty", path.display())]
    EmptySource { path: PathBuf },

    /// One or more required columns are absent
    #[error("Missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Serializing or deserializing an in-memory table
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Persistence failures, propagated unchanged
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// True for the two "bad input file" failures
    pub fn is_parse_error(&self) -> bool {
        matches!(self, PipelineError::Parse { .. } | PipelineError::EmptySource { .. })
    }

    /// Missing columns if this is a schema failure
    pub fn missing_columns(&self) -> Option<&[String]> {
        match self {
            PipelineError::Schema { missing } => Some(missing),
            _ => None,
        }
    }
}

/// Errors from a `BlobStore` backend
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote store answered with a non-success status
    #[error("{operation} {object} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        object: String,
        status: u16,
        body: String,
    },

    #[error("Invalid storage response: {0}")]
    InvalidResponse(String),

    #[error("Request signing failed: {0}")]
    Signing(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors while building a `Config`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid scoring weight {name}: {value} (must be finite and >= 0)")]
    InvalidWeight { name: &'static str, value: f64 },
}

/// Convenience Result type for the library
pub type Result<T> = std::result::Result<T, PipelineError>;
