pub mod queries;
pub mod routes;

pub use queries::{
    ExperimentListItem, ExperimentTileItem, ExperimentTilesError, ExperimentTilesQuery,
    ListExperimentsError, ListExperimentsQuery,
};

pub use routes::experiments_routes;
