//! Error types shared across the bioserver workspace

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, BioError>;

/// Errors raised outside the ingestion and query paths
#[derive(Error, Debug)]
pub enum BioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid species identifier: {0}")]
    InvalidSpeciesId(String),
}

impl BioError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = BioError::config("PSERVER_DSN not set");
        assert_eq!(err.to_string(), "Configuration error: PSERVER_DSN not set");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BioError = io.into();
        assert!(matches!(err, BioError::Io(_)));
    }
}
