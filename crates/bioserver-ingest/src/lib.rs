//! Experiment importer
//!
//! Loads per-species tile areas from an experiment directory into the
//! database. The expected layout is
//!
//! ```text
//! <experiment>/
//!     <taxon>/
//!         res_<species id>_7.parquet
//! ```
//!
//! where each species file has a `cell` (tile code) and an `area` column.
//! Rows with zero area are dropped; everything else becomes one tile row
//! tagged with the species and experiment.
//!
//! # Example
//!
//! ```no_run
//! use bioserver_ingest::{ImportPipeline, MemoryStore};
//! use std::path::Path;
//!
//! # async fn example() -> bioserver_ingest::IngestResult<()> {
//! let store = MemoryStore::new();
//! let stats = ImportPipeline::default()
//!     .run(store.begin(), Path::new("/data/run-2023-08"), None)
//!     .await?;
//! println!("{}", stats.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod pipeline;
pub mod source;
pub mod store;

pub use config::ImportConfig;
pub use error::{IngestError, IngestResult};
pub use identity::resolve_species_id;
pub use pipeline::{ImportPipeline, ImportStats};
pub use source::{TileRow, TileRowSource};
pub use store::{ImportScope, MemoryStore, PgImportScope};
