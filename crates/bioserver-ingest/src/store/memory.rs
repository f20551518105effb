//! In-memory store
//!
//! Mirrors the PostgreSQL schema's constraints (unique experiment names,
//! unique tile triples, insert-or-ignore species) closely enough that the
//! pipeline cannot tell the difference. A scope works on a private copy of
//! the state and publishes it on commit.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bioserver_common::types::{summarize_tiles, Experiment, NewTile, Species, SpeciesId, Tile, TileSummary};
use chrono::Utc;

use super::ImportScope;
use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    experiments: Vec<Experiment>,
    species: Vec<Species>,
    species_index: HashMap<SpeciesId, usize>,
    tiles: Vec<NewTile>,
    tile_keys: HashSet<(String, SpeciesId, i64)>,
    next_experiment_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a write scope over a snapshot of the committed state
    pub fn begin(&self) -> MemoryScope {
        MemoryScope {
            store: self.clone(),
            working: self.lock().clone(),
        }
    }

    pub fn experiments(&self) -> Vec<Experiment> {
        self.lock().experiments.clone()
    }

    pub fn species(&self) -> Vec<Species> {
        self.lock().species.clone()
    }

    /// Committed tiles, ids assigned in insertion order starting at 1
    pub fn tiles(&self) -> Vec<Tile> {
        self.lock()
            .tiles
            .iter()
            .zip(1..)
            .map(|(t, id)| Tile {
                id,
                tile_code: t.tile_code.clone(),
                species_id: t.species_id,
                area: t.area,
                experiment_id: t.experiment_id,
            })
            .collect()
    }

    pub fn tile_count(&self) -> usize {
        self.lock().tiles.len()
    }

    pub fn tile_summaries(&self, experiment_id: i64) -> Vec<TileSummary> {
        summarize_tiles(experiment_id, &self.lock().tiles)
    }
}

/// Write scope over a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryScope {
    store: MemoryStore,
    working: MemoryState,
}

#[async_trait]
impl ImportScope for MemoryScope {
    async fn create_experiment(&mut self, name: &str) -> IngestResult<Experiment> {
        let state = &mut self.working;
        if state.experiments.iter().any(|e| e.name == name) {
            return Err(IngestError::UniqueConstraintViolation(format!(
                "Experiment '{}' already exists",
                name
            )));
        }

        state.next_experiment_id += 1;
        let experiment = Experiment {
            id: state.next_experiment_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.experiments.push(experiment.clone());
        Ok(experiment)
    }

    async fn upsert_species(&mut self, species: &Species) -> IngestResult<Species> {
        let state = &mut self.working;
        if let Some(&pos) = state.species_index.get(&species.id) {
            return Ok(state.species[pos].clone());
        }

        state.species_index.insert(species.id, state.species.len());
        state.species.push(species.clone());
        Ok(species.clone())
    }

    async fn insert_tiles(&mut self, tiles: &[NewTile]) -> IngestResult<u64> {
        let state = &mut self.working;
        let mut keys = Vec::with_capacity(tiles.len());
        for tile in tiles {
            let key = (tile.tile_code.clone(), tile.species_id, tile.experiment_id);
            if state.tile_keys.contains(&key) || keys.contains(&key) {
                return Err(IngestError::UniqueConstraintViolation(format!(
                    "Duplicate tile '{}' for species {} in experiment {}",
                    tile.tile_code, tile.species_id, tile.experiment_id
                )));
            }
            keys.push(key);
        }

        state.tile_keys.extend(keys);
        state.tiles.extend_from_slice(tiles);
        Ok(tiles.len() as u64)
    }

    async fn commit(self) -> IngestResult<()> {
        *self.store.lock() = self.working;
        Ok(())
    }

    async fn rollback(self) -> IngestResult<()> {
        Ok(())
    }
}
