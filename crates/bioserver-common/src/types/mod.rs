//! Domain types shared by the importer and the query server

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BioError;

/// Externally supplied species identity.
///
/// Species ids come from the source file names, never from a database
/// sequence, so they are kept apart from storage surrogate keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(i64);

impl SpeciesId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SpeciesId {
    type Err = BioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(SpeciesId)
            .map_err(|e| BioError::InvalidSpeciesId(format!("{}: {}", s, e)))
    }
}

/// One import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A species as first recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub taxa: String,
}

impl Species {
    pub fn new(id: SpeciesId, taxa: impl Into<String>) -> Self {
        Self {
            id,
            taxa: taxa.into(),
        }
    }
}

/// A tile row waiting to be persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTile {
    pub tile_code: String,
    pub species_id: SpeciesId,
    pub area: f64,
    pub experiment_id: i64,
}

impl NewTile {
    pub fn new(
        tile_code: impl Into<String>,
        species_id: SpeciesId,
        area: f64,
        experiment_id: i64,
    ) -> Self {
        Self {
            tile_code: tile_code.into(),
            species_id,
            area,
            experiment_id,
        }
    }
}

/// A persisted tile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: i64,
    pub tile_code: String,
    pub species_id: SpeciesId,
    pub area: f64,
    pub experiment_id: i64,
}

/// Per-tile statistics for one experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSummary {
    pub tile_code: String,
    pub species_count: i64,
    pub total_area: f64,
}

/// Group the tiles of `experiment_id` by tile code.
///
/// Tiles tagged with any other experiment are ignored. Output order follows
/// the first appearance of each tile code.
pub fn summarize_tiles<'a, I>(experiment_id: i64, tiles: I) -> Vec<TileSummary>
where
    I: IntoIterator<Item = &'a NewTile>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<TileSummary> = Vec::new();

    for tile in tiles {
        if tile.experiment_id != experiment_id {
            continue;
        }
        match index.get(tile.tile_code.as_str()) {
            Some(&pos) => {
                summaries[pos].species_count += 1;
                summaries[pos].total_area += tile.area;
            },
            None => {
                index.insert(tile.tile_code.as_str(), summaries.len());
                summaries.push(TileSummary {
                    tile_code: tile.tile_code.clone(),
                    species_count: 1,
                    total_area: tile.area,
                });
            },
        }
    }

    summaries
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_species_id_from_str() {
        assert_eq!("1234".parse::<SpeciesId>().unwrap(), SpeciesId::new(1234));
        assert!("12a".parse::<SpeciesId>().is_err());
        assert!("".parse::<SpeciesId>().is_err());
    }

    #[test]
    fn test_species_id_serializes_as_integer() {
        let species = Species::new(SpeciesId::new(22679), "AVES");
        let json = serde_json::to_value(&species).unwrap();
        assert_eq!(json["id"], 22679);
        assert_eq!(json["taxa"], "AVES");
    }

    #[test]
    fn test_summarize_tiles_groups_by_code() {
        let s1 = SpeciesId::new(1);
        let s2 = SpeciesId::new(2);
        let tiles = vec![
            NewTile::new("t1", s1, 2.0, 1),
            NewTile::new("t1", s2, 3.0, 1),
            NewTile::new("t2", s1, 1.0, 1),
        ];

        let summaries = summarize_tiles(1, &tiles);

        assert_eq!(
            summaries,
            vec![
                TileSummary {
                    tile_code: "t1".to_string(),
                    species_count: 2,
                    total_area: 5.0,
                },
                TileSummary {
                    tile_code: "t2".to_string(),
                    species_count: 1,
                    total_area: 1.0,
                },
            ]
        );
    }

    #[test]
    fn test_summarize_tiles_scopes_to_experiment() {
        let s1 = SpeciesId::new(1);
        let tiles = vec![
            NewTile::new("t1", s1, 2.0, 1),
            NewTile::new("t1", s1, 7.0, 2),
        ];

        let summaries = summarize_tiles(2, &tiles);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_area, 7.0);

        assert!(summarize_tiles(3, &tiles).is_empty());
    }
}
