pub mod queries;
pub mod routes;

pub use queries::{ListSpeciesError, ListSpeciesQuery, SpeciesListItem};

pub use routes::species_routes;
