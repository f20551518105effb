//! Experiment import pipeline
//!
//! Walks `<experiment>/<taxon>/<species file>` and persists every non-zero
//! tile row under a freshly created experiment. The whole walk runs inside
//! one [`ImportScope`]: it is committed if every species file imports
//! cleanly and rolled back on the first error, so an experiment is either
//! fully present or absent.

use std::path::{Path, PathBuf};

use bioserver_common::types::{NewTile, Species, SpeciesId};
use tracing::{debug, info, warn};

use crate::config::ImportConfig;
use crate::error::{IngestError, IngestResult};
use crate::identity::resolve_species_id;
use crate::source::{TileRowSource, DEFAULT_BATCH_SIZE};
use crate::store::ImportScope;

/// Import statistics for one experiment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportStats {
    pub experiment_id: i64,
    pub experiment_name: String,
    pub taxa: usize,
    pub species: usize,
    pub rows_read: usize,
    pub zero_area_skipped: usize,
    pub tiles_inserted: u64,
    pub batches: usize,
}

impl ImportStats {
    pub fn summary(&self) -> String {
        format!(
            "Imported experiment '{}' (id {}): {} taxa, {} species, {} tiles from {} rows ({} zero-area rows skipped, {} batches)",
            self.experiment_name,
            self.experiment_id,
            self.taxa,
            self.species,
            self.tiles_inserted,
            self.rows_read,
            self.zero_area_skipped,
            self.batches
        )
    }
}

/// Experiment name implied by the experiment directory
pub fn experiment_name(root: &Path) -> IngestResult<String> {
    let name = match root.file_name() {
        Some(name) => Some(name.to_os_string()),
        None => root
            .canonicalize()
            .map_err(|e| IngestError::io(root, e))?
            .file_name()
            .map(|n| n.to_os_string()),
    };

    name.and_then(|n| n.into_string().ok())
        .ok_or_else(|| IngestError::structural(root, "cannot derive an experiment name"))
}

/// Entries of `dir` in the order the filesystem returns them
fn list_dir(dir: &Path) -> IngestResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))?;
    entries
        .map(|entry| entry.map(|e| e.path()).map_err(|e| IngestError::io(dir, e)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct ImportPipeline {
    batch_size: usize,
    strict_taxa: bool,
}

impl Default for ImportPipeline {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            strict_taxa: false,
        }
    }
}

impl ImportPipeline {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            strict_taxa: config.strict_taxa,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_strict_taxa(mut self, strict: bool) -> Self {
        self.strict_taxa = strict;
        self
    }

    /// Import the experiment rooted at `root`, then commit or roll back `scope`.
    ///
    /// `name` overrides the experiment name, which otherwise is the base name
    /// of `root`.
    #[tracing::instrument(skip(self, scope), fields(root = %root.display()))]
    pub async fn run<S: ImportScope>(
        &self,
        mut scope: S,
        root: &Path,
        name: Option<&str>,
    ) -> IngestResult<ImportStats> {
        match self.walk_experiment(&mut scope, root, name).await {
            Ok(stats) => {
                scope.commit().await?;
                info!(
                    experiment_id = stats.experiment_id,
                    tiles = stats.tiles_inserted,
                    "Import committed"
                );
                Ok(stats)
            },
            Err(e) => {
                warn!(error = %e, "Import failed, rolling back");
                if let Err(rollback_err) = scope.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            },
        }
    }

    async fn walk_experiment<S: ImportScope>(
        &self,
        scope: &mut S,
        root: &Path,
        name: Option<&str>,
    ) -> IngestResult<ImportStats> {
        let name = match name {
            Some(n) => n.to_string(),
            None => experiment_name(root)?,
        };

        info!("Phase 1: Listing experiment directory");
        let entries = list_dir(root)?;

        info!("Phase 2: Creating experiment");
        let experiment = scope.create_experiment(&name).await?;
        info!(experiment_id = experiment.id, name = %experiment.name, "Created experiment");

        let mut stats = ImportStats {
            experiment_id: experiment.id,
            experiment_name: experiment.name,
            ..ImportStats::default()
        };

        info!("Phase 3: Importing taxa");
        for entry in entries {
            if !entry.is_dir() {
                return Err(IngestError::structural(&entry, "not a directory"));
            }
            let taxa = entry
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| IngestError::structural(&entry, "taxon name is not UTF-8"))?
                .to_string();

            info!(taxa = %taxa, "Importing taxon");
            self.import_taxon(scope, &entry, &taxa, stats.experiment_id, &mut stats)
                .await?;
            stats.taxa += 1;
        }

        info!(
            taxa = stats.taxa,
            species = stats.species,
            tiles = stats.tiles_inserted,
            "Experiment walk completed"
        );
        Ok(stats)
    }

    async fn import_taxon<S: ImportScope>(
        &self,
        scope: &mut S,
        dir: &Path,
        taxa: &str,
        experiment_id: i64,
        stats: &mut ImportStats,
    ) -> IngestResult<()> {
        for path in list_dir(dir)? {
            self.import_species(scope, &path, taxa, experiment_id, stats)
                .await?;
            stats.species += 1;
        }
        Ok(())
    }

    async fn import_species<S: ImportScope>(
        &self,
        scope: &mut S,
        path: &Path,
        taxa: &str,
        experiment_id: i64,
        stats: &mut ImportStats,
    ) -> IngestResult<()> {
        let species_id = resolve_species_id(path)?;
        self.record_species(scope, species_id, taxa).await?;

        let source = TileRowSource::open(path, self.batch_size)?;
        let mut inserted = 0u64;
        for batch in source {
            let batch = batch?;
            let read = batch.len();

            let tiles: Vec<NewTile> = batch
                .into_iter()
                .filter(|row| row.area != 0.0)
                .map(|row| NewTile::new(row.cell, species_id, row.area, experiment_id))
                .collect();

            stats.rows_read += read;
            stats.zero_area_skipped += read - tiles.len();
            if tiles.is_empty() {
                continue;
            }

            inserted += scope.insert_tiles(&tiles).await?;
            stats.batches += 1;
            debug!(species_id = %species_id, rows = tiles.len(), "Inserted batch");
        }

        stats.tiles_inserted += inserted;
        debug!(species_id = %species_id, tiles = inserted, "Imported species");
        Ok(())
    }

    async fn record_species<S: ImportScope>(
        &self,
        scope: &mut S,
        id: SpeciesId,
        taxa: &str,
    ) -> IngestResult<Species> {
        let stored = scope.upsert_species(&Species::new(id, taxa)).await?;
        if stored.taxa != taxa {
            if self.strict_taxa {
                return Err(IngestError::TaxaMismatch {
                    id,
                    recorded: stored.taxa,
                    asserted: taxa.to_string(),
                });
            }
            debug!(species_id = %id, recorded = %stored.taxa, asserted = %taxa, "Species already recorded under another taxon");
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_name_from_base_name() {
        assert_eq!(experiment_name(Path::new("/data/run-1")).unwrap(), "run-1");
        assert_eq!(experiment_name(Path::new("/data/run-1/")).unwrap(), "run-1");
        assert_eq!(experiment_name(Path::new("run-2")).unwrap(), "run-2");
    }

    #[test]
    fn test_experiment_name_resolves_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("baseline").join("sub")).unwrap();
        let root = dir.path().join("baseline").join("sub").join("..");

        assert_eq!(experiment_name(&root).unwrap(), "baseline");
    }

    #[test]
    fn test_stats_summary() {
        let stats = ImportStats {
            experiment_id: 3,
            experiment_name: "run-1".to_string(),
            taxa: 2,
            species: 5,
            rows_read: 10,
            zero_area_skipped: 4,
            tiles_inserted: 6,
            batches: 5,
        };
        assert_eq!(
            stats.summary(),
            "Imported experiment 'run-1' (id 3): 2 taxa, 5 species, 6 tiles from 10 rows (4 zero-area rows skipped, 5 batches)"
        );
    }
}
