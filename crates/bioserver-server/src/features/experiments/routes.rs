//! Experiment API routes
//!
//! - `GET /api/experiments/` - List experiments
//! - `GET /api/experiments/:experiment_id/tiles/` - Per-tile statistics for one experiment

use crate::api::response::{ApiResponse, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sqlx::PgPool;

use super::queries::{
    ExperimentTilesError, ExperimentTilesQuery, ListExperimentsError, ListExperimentsQuery,
};

pub fn experiments_routes() -> Router<PgPool> {
    Router::new()
        .route("/experiments", get(list_experiments))
        .route("/experiments/", get(list_experiments))
        .route("/experiments/:experiment_id/tiles", get(get_experiment_tiles))
        .route("/experiments/:experiment_id/tiles/", get(get_experiment_tiles))
}

/// List all experiments
///
/// # Response
///
/// - `200 OK` - `{"data": [{"id": 1, "name": "run-2023-08"}]}`
/// - `500 Internal Server Error` - Database error
#[tracing::instrument(skip(pool))]
async fn list_experiments(State(pool): State<PgPool>) -> Result<Response, ExperimentApiError> {
    let items = super::queries::list::handle(pool, ListExperimentsQuery::default()).await?;

    tracing::debug!(count = items.len(), "Experiments listed via API");

    Ok(ApiResponse::success(items).into_response())
}

/// Per-tile statistics for one experiment
///
/// # Response
///
/// - `200 OK` - `[{"h3": "871f1d489ffffff", "species": 2, "total_area": 5.0}]`
/// - `400 Bad Request` - Experiment id is not an integer
/// - `500 Internal Server Error` - Database error
#[tracing::instrument(skip(pool))]
async fn get_experiment_tiles(
    State(pool): State<PgPool>,
    Path(experiment_id): Path<String>,
) -> Result<Response, ExperimentApiError> {
    let query = ExperimentTilesQuery::parse(&experiment_id)?;
    let items = super::queries::tiles::handle(pool, query).await?;

    Ok((StatusCode::OK, Json(items)).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum ExperimentApiError {
    List(ListExperimentsError),
    Tiles(ExperimentTilesError),
}

impl From<ListExperimentsError> for ExperimentApiError {
    fn from(err: ListExperimentsError) -> Self {
        Self::List(err)
    }
}

impl From<ExperimentTilesError> for ExperimentApiError {
    fn from(err: ExperimentTilesError) -> Self {
        Self::Tiles(err)
    }
}

impl IntoResponse for ExperimentApiError {
    fn into_response(self) -> Response {
        match self {
            ExperimentApiError::Tiles(err @ ExperimentTilesError::InvalidExperimentId(_)) => {
                ErrorResponse::new("VALIDATION_ERROR", err.to_string())
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            ExperimentApiError::Tiles(ExperimentTilesError::Database(e))
            | ExperimentApiError::List(ListExperimentsError::Database(e)) => {
                ErrorResponse::internal(&e)
            },
        }
    }
}
