//! Bioserver query server
//!
//! Read-only HTTP API over imported experiments:
//!
//! - `GET /api/experiments/` - experiment listing
//! - `GET /api/experiments/:experiment_id/tiles/` - per-tile species count and total area
//! - `GET /api/species/` - species listing
//! - `GET /health` - database connectivity
//!
//! Data is written only by the importer (`bioserver-ingest`); both binaries
//! apply the same migrations on startup.
//!
//! # Example
//!
//! ```no_run
//! use bioserver_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let app = api::create_router(api::AppState { db: pool }, &config);
//!     let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod middleware;
