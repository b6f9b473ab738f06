//! Data module - source fetching, parsing, and the merge core

mod fetch;
mod loader;
mod merge;
mod model;

pub use fetch::{fetch_sources_blocking, FetchConfig, SourceLocation};
pub use loader::{load_incidents, load_intersections, ColumnAliases};
pub use merge::{merge_intersections, MergeOutcome, MergeWarning};
pub use model::{Coordinates, MergedIntersection};
