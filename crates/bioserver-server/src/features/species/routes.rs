//! Species API routes
//!
//! - `GET /api/species/` - List species with the taxon each was first recorded under

use crate::api::response::{ApiResponse, ErrorResponse};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use sqlx::PgPool;

use super::queries::{ListSpeciesError, ListSpeciesQuery};

pub fn species_routes() -> Router<PgPool> {
    Router::new()
        .route("/species", get(list_species))
        .route("/species/", get(list_species))
}

#[tracing::instrument(skip(pool))]
async fn list_species(State(pool): State<PgPool>) -> Result<Response, ListSpeciesError> {
    let items = super::queries::list::handle(pool, ListSpeciesQuery::default()).await?;

    tracing::debug!(count = items.len(), "Species listed via API");

    Ok(ApiResponse::success(items).into_response())
}

impl IntoResponse for ListSpeciesError {
    fn into_response(self) -> Response {
        match self {
            ListSpeciesError::Database(e) => ErrorResponse::internal(&e),
        }
    }
}
