//! Fixtures for importer integration tests
//!
//! Builds experiment directories on disk with real Parquet species files:
//!
//! ```no_run
//! let exp = ExperimentDir::new("run-1");
//! exp.species("AVES", 22679, &[("8a1", 0.0), ("8a2", 3.5)]);
//! ```

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bioserver_common::types::{Experiment, NewTile, Species};
use bioserver_ingest::{ImportScope, IngestError, IngestResult};
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

/// Write a species file with `cell` and `area` columns
pub fn write_species_file(path: &Path, rows: &[(&str, f64)]) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("cell", DataType::Utf8, false),
        Field::new("area", DataType::Float64, false),
    ]));
    let cells: Vec<&str> = rows.iter().map(|(c, _)| *c).collect();
    let areas: Vec<f64> = rows.iter().map(|(_, a)| *a).collect();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(cells)) as ArrayRef,
            Arc::new(Float64Array::from(areas)) as ArrayRef,
        ],
    )
    .expect("Failed to build record batch");

    let file = std::fs::File::create(path).expect("Failed to create species file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

/// A temporary `<experiment>/<taxon>/<species file>` tree
pub struct ExperimentDir {
    _tmp: TempDir,
    root: PathBuf,
}

impl ExperimentDir {
    pub fn new(name: &str) -> Self {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let root = tmp.path().join(name);
        std::fs::create_dir(&root).expect("Failed to create experiment dir");
        Self { _tmp: tmp, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn taxon(&self, taxa: &str) -> PathBuf {
        let dir = self.root.join(taxa);
        std::fs::create_dir_all(&dir).expect("Failed to create taxon dir");
        dir
    }

    /// Add `res_<id>_7.parquet` under `taxa`
    pub fn species(&self, taxa: &str, id: i64, rows: &[(&str, f64)]) -> PathBuf {
        let path = self.taxon(taxa).join(format!("res_{}_7.parquet", id));
        write_species_file(&path, rows);
        path
    }

    /// Add an arbitrary file, bypassing the naming convention
    pub fn file(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("Failed to write file");
        path
    }
}

/// Delegating scope that fails the `fail_on`-th species upsert (1-based)
///
/// Tiles written through it are counted in a shared counter that outlives
/// the scope, so a test can check work was done before the failure.
pub struct FailingScope<S> {
    inner: S,
    fail_on: usize,
    upserts: usize,
    tiles_written: Arc<AtomicU64>,
}

impl<S: ImportScope> FailingScope<S> {
    pub fn new(inner: S, fail_on: usize) -> (Self, Arc<AtomicU64>) {
        let tiles_written = Arc::new(AtomicU64::new(0));
        let scope = Self {
            inner,
            fail_on,
            upserts: 0,
            tiles_written: tiles_written.clone(),
        };
        (scope, tiles_written)
    }
}

#[async_trait]
impl<S: ImportScope> ImportScope for FailingScope<S> {
    async fn create_experiment(&mut self, name: &str) -> IngestResult<Experiment> {
        self.inner.create_experiment(name).await
    }

    async fn upsert_species(&mut self, species: &Species) -> IngestResult<Species> {
        self.upserts += 1;
        if self.upserts == self.fail_on {
            return Err(IngestError::Storage(format!(
                "species {} could not be recorded",
                species.id
            )));
        }
        self.inner.upsert_species(species).await
    }

    async fn insert_tiles(&mut self, tiles: &[NewTile]) -> IngestResult<u64> {
        let written = self.inner.insert_tiles(tiles).await?;
        self.tiles_written.fetch_add(written, Ordering::SeqCst);
        Ok(written)
    }

    async fn commit(self) -> IngestResult<()> {
        self.inner.commit().await
    }

    async fn rollback(self) -> IngestResult<()> {
        self.inner.rollback().await
    }
}
