//! Reference entity store
//!
//! The pipeline writes through an [`ImportScope`]: a write scope that is begun
//! once per experiment, threaded through the whole walk, and then either
//! committed or rolled back as a unit. Nothing written inside a scope is
//! visible to readers until [`ImportScope::commit`] succeeds.
//!
//! Two implementations are provided:
//!
//! - [`PgImportScope`] wraps a PostgreSQL transaction
//! - [`MemoryScope`] works against a [`MemoryStore`], used by tests and by the
//!   importer's dry-run mode

mod memory;
mod postgres;

pub use memory::{MemoryScope, MemoryStore};
pub use postgres::{run_migrations, PgImportScope};

use async_trait::async_trait;
use bioserver_common::types::{Experiment, NewTile, Species};

use crate::error::IngestResult;

#[async_trait]
pub trait ImportScope: Send {
    /// Insert a new experiment.
    ///
    /// Fails with `UniqueConstraintViolation` if the name is taken.
    async fn create_experiment(&mut self, name: &str) -> IngestResult<Experiment>;

    /// Insert the species if its id is unknown.
    ///
    /// Returns the stored record, which for an existing id carries the taxa
    /// it was first recorded with, not the one passed in.
    async fn upsert_species(&mut self, species: &Species) -> IngestResult<Species>;

    /// Bulk insert one batch of tiles, returning the number of rows written
    async fn insert_tiles(&mut self, tiles: &[NewTile]) -> IngestResult<u64>;

    async fn commit(self) -> IngestResult<()>
    where
        Self: Sized;

    async fn rollback(self) -> IngestResult<()>
    where
        Self: Sized;
}
