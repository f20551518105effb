//! PostgreSQL-backed import scope

use async_trait::async_trait;
use bioserver_common::types::{Experiment, NewTile, Species, SpeciesId};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, info};

use super::ImportScope;
use crate::error::{IngestError, IngestResult};

/// Apply the embedded migrations
pub async fn run_migrations(pool: &PgPool) -> IngestResult<()> {
    info!("Running database migrations");
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| IngestError::Storage(format!("Migration failed: {}", e)))?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct ExperimentRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<ExperimentRow> for Experiment {
    fn from(row: ExperimentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SpeciesRow {
    id: i64,
    taxa: String,
}

impl From<SpeciesRow> for Species {
    fn from(row: SpeciesRow) -> Self {
        Species::new(SpeciesId::new(row.id), row.taxa)
    }
}

/// One transaction spanning a whole experiment import
pub struct PgImportScope {
    tx: Transaction<'static, Postgres>,
}

impl PgImportScope {
    pub async fn begin(pool: &PgPool) -> IngestResult<Self> {
        let tx = pool.begin().await?;
        Ok(Self { tx })
    }
}

#[async_trait]
impl ImportScope for PgImportScope {
    async fn create_experiment(&mut self, name: &str) -> IngestResult<Experiment> {
        let row = sqlx::query_as::<_, ExperimentRow>(
            r#"
            INSERT INTO experiments (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| IngestError::from_db(e, || format!("Experiment '{}' already exists", name)))?;

        Ok(row.into())
    }

    async fn upsert_species(&mut self, species: &Species) -> IngestResult<Species> {
        sqlx::query(
            r#"
            INSERT INTO species (id, taxa)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(species.id.get())
        .bind(&species.taxa)
        .execute(&mut *self.tx)
        .await?;

        let row = sqlx::query_as::<_, SpeciesRow>("SELECT id, taxa FROM species WHERE id = $1")
            .bind(species.id.get())
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(row.into())
    }

    async fn insert_tiles(&mut self, tiles: &[NewTile]) -> IngestResult<u64> {
        if tiles.is_empty() {
            return Ok(0);
        }

        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO tiles (tile_code, species_id, area, experiment_id) ");

        query_builder.push_values(tiles, |mut b, tile| {
            b.push_bind(&tile.tile_code)
                .push_bind(tile.species_id.get())
                .push_bind(tile.area)
                .push_bind(tile.experiment_id);
        });

        let result = query_builder
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                IngestError::from_db(e, || {
                    format!(
                        "Duplicate tile for species {} in experiment {}",
                        tiles[0].species_id, tiles[0].experiment_id
                    )
                })
            })?;

        debug!(rows = result.rows_affected(), "Inserted tile batch");
        Ok(result.rows_affected())
    }

    async fn commit(self) -> IngestResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> IngestResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
