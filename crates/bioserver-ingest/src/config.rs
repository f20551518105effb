//! Importer configuration

use bioserver_common::BioError;
use serde::{Deserialize, Serialize};

use crate::source::DEFAULT_BATCH_SIZE;

/// Four bind parameters per tile row; Postgres allows 65535 per statement.
pub const MAX_BATCH_SIZE: usize = 16_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// PostgreSQL connection string (PSERVER_IMPORT_DSN, then DATABASE_URL)
    pub database_url: Option<String>,
    /// Rows per bulk insert
    pub batch_size: usize,
    /// Fail on a species id already recorded under a different taxon
    pub strict_taxa: bool,
    /// Walk and validate against an in-memory store, write nothing
    pub dry_run: bool,
    /// Apply pending migrations before importing
    pub run_migrations: bool,
    /// Maximum pool connections; the import itself uses one
    pub max_connections: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            batch_size: DEFAULT_BATCH_SIZE,
            strict_taxa: false,
            dry_run: false,
            run_migrations: true,
            max_connections: 2,
        }
    }
}

impl ImportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BioError> {
        let mut config = Self {
            database_url: std::env::var("PSERVER_IMPORT_DSN")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .ok(),
            ..Self::default()
        };

        if let Ok(size) = std::env::var("PSERVER_IMPORT_BATCH_SIZE") {
            config.batch_size = size
                .parse()
                .map_err(|_| BioError::config(format!("Invalid PSERVER_IMPORT_BATCH_SIZE: {}", size)))?;
        }

        Ok(config)
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_strict_taxa(mut self, strict: bool) -> Self {
        self.strict_taxa = strict;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn validate(&self) -> Result<(), BioError> {
        if self.batch_size == 0 {
            return Err(BioError::config("Batch size must be greater than 0"));
        }
        if self.batch_size > MAX_BATCH_SIZE {
            return Err(BioError::config(format!(
                "Batch size {} exceeds the maximum of {}",
                self.batch_size, MAX_BATCH_SIZE
            )));
        }
        if !self.dry_run && self.database_url.is_none() {
            return Err(BioError::config(
                "No database configured: set PSERVER_IMPORT_DSN or DATABASE_URL",
            ));
        }
        if self.max_connections == 0 {
            return Err(BioError::config("Max connections must be greater than 0"));
        }
        Ok(())
    }
}
