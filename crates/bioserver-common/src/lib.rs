//! Bioserver Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the bioserver workspace.
//!
//! # Overview
//!
//! This crate provides functionality used by both the importer and the server:
//!
//! - **Error Handling**: Shared error and result types
//! - **Logging**: Centralized `tracing` subscriber setup
//! - **Types**: Experiment, species and tile records, plus per-tile aggregation
//!
//! # Example
//!
//! ```
//! use bioserver_common::types::{summarize_tiles, NewTile, SpeciesId};
//!
//! let tiles = vec![
//!     NewTile::new("8a2", SpeciesId::new(12), 3.5, 1),
//!     NewTile::new("8a2", SpeciesId::new(13), 1.5, 1),
//! ];
//! let summaries = summarize_tiles(1, &tiles);
//! assert_eq!(summaries[0].species_count, 2);
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{BioError, Result};
