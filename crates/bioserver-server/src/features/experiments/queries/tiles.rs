//! Per-tile statistics for one experiment
//!
//! Groups the experiment's tile rows by tile code, counting rows (one per
//! species) and summing area. Unknown experiments yield an empty list.

use bioserver_common::types::TileSummary;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentTilesQuery {
    pub experiment_id: i64,
}

/// Wire form of [`TileSummary`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExperimentTileItem {
    #[serde(rename = "h3")]
    pub tile_code: String,
    #[serde(rename = "species")]
    pub species_count: i64,
    pub total_area: f64,
}

impl From<TileSummary> for ExperimentTileItem {
    fn from(summary: TileSummary) -> Self {
        Self {
            tile_code: summary.tile_code,
            species_count: summary.species_count,
            total_area: summary.total_area,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExperimentTilesError {
    #[error("Invalid experiment id '{0}': expected an integer")]
    InvalidExperimentId(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ExperimentTilesQuery {
    pub fn new(experiment_id: i64) -> Self {
        Self { experiment_id }
    }

    /// Build the query from a raw path segment
    pub fn parse(raw: &str) -> Result<Self, ExperimentTilesError> {
        raw.trim()
            .parse()
            .map(Self::new)
            .map_err(|_| ExperimentTilesError::InvalidExperimentId(raw.to_string()))
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ExperimentTilesQuery,
) -> Result<Vec<ExperimentTileItem>, ExperimentTilesError> {
    let items = sqlx::query_as::<_, ExperimentTileItem>(
        r#"
        SELECT
            tile_code,
            COUNT(species_id) AS species_count,
            SUM(area) AS total_area
        FROM tiles
        WHERE experiment_id = $1
        GROUP BY tile_code
        "#,
    )
    .bind(query.experiment_id)
    .fetch_all(&pool)
    .await?;

    tracing::debug!(tiles = items.len(), "Aggregated experiment tiles");
    Ok(items)
}
