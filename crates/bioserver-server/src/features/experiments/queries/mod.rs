pub mod list;
pub mod tiles;

pub use list::{ExperimentListItem, ListExperimentsError, ListExperimentsQuery};
pub use tiles::{ExperimentTileItem, ExperimentTilesError, ExperimentTilesQuery};
