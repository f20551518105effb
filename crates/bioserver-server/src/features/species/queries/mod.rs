pub mod list;

pub use list::{ListSpeciesError, ListSpeciesQuery, SpeciesListItem};
