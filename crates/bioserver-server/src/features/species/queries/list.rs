use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSpeciesQuery {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SpeciesListItem {
    pub id: i64,
    pub taxa: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ListSpeciesError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    _query: ListSpeciesQuery,
) -> Result<Vec<SpeciesListItem>, ListSpeciesError> {
    let items = sqlx::query_as::<_, SpeciesListItem>("SELECT id, taxa FROM species ORDER BY id")
        .fetch_all(&pool)
        .await?;

    Ok(items)
}
