//! Ingestion error taxonomy
//!
//! Every variant aborts the whole experiment import. Nothing is retried.

use std::path::PathBuf;

use bioserver_common::types::SpeciesId;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// The experiment directory does not follow `<experiment>/<taxon>/<species file>`
    #[error("Unexpected layout at {}: {reason}", path.display())]
    StructuralViolation { path: PathBuf, reason: String },

    /// A species file name does not encode a parseable id
    #[error("Malformed species identifier in '{name}': {reason}")]
    MalformedIdentifier { name: String, reason: String },

    /// Duplicate experiment name or tile triple
    #[error("{0}")]
    UniqueConstraintViolation(String),

    /// Strict mode only: species id already recorded under another taxon
    #[error("Species {id} is recorded as '{recorded}' but was asserted as '{asserted}'")]
    TaxaMismatch {
        id: SpeciesId,
        recorded: String,
        asserted: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub fn structural(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::StructuralViolation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Map a database error, recognising unique constraint violations
    pub fn from_db(err: sqlx::Error, what: impl FnOnce() -> String) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::UniqueConstraintViolation(what());
            }
        }
        Self::Database(err)
    }

    /// True for the I/O and database failures grouped as storage errors
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Database(_) | Self::Io { .. })
    }
}

impl From<sqlx::Error> for IngestError {
    fn from(err: sqlx::Error) -> Self {
        Self::from_db(err, || "Unique constraint violated".to_string())
    }
}

impl From<parquet::errors::ParquetError> for IngestError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        Self::Storage(format!("Parquet: {}", err))
    }
}

impl From<arrow::error::ArrowError> for IngestError {
    fn from(err: arrow::error::ArrowError) -> Self {
        Self::Storage(format!("Arrow: {}", err))
    }
}
