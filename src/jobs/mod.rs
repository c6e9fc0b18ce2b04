mod grid_search;

pub use grid_search::{ConfigArtifacts, GridSearchJob};
