//! Feature modules implementing the query API
//!
//! Each feature is a vertical slice with its own queries and routes:
//!
//! - `queries/` - Read operations, one module per query with a `handle` function
//! - `routes.rs` - HTTP route definitions and error mapping
//!
//! # Features
//!
//! - **experiments**: experiment listing and per-tile aggregation
//! - **species**: species listing
//!
//! The API is read-only; all writes happen through the importer.

pub mod experiments;
pub mod species;

use axum::Router;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool for database operations
    pub db: sqlx::PgPool,
}

/// Creates the API router with all feature routes mounted
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .merge(experiments::experiments_routes())
        .merge(species::species_routes())
        .with_state(state.db)
}
