use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// List every experiment; no filters or pagination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListExperimentsQuery {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExperimentListItem {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ListExperimentsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    _query: ListExperimentsQuery,
) -> Result<Vec<ExperimentListItem>, ListExperimentsError> {
    let items = sqlx::query_as::<_, ExperimentListItem>(
        r#"
        SELECT id, name
        FROM experiments
        ORDER BY id
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(items)
}
