//! Longest-flow-path computation over D8 flow-direction rasters.
//!
//! A flow-direction grid gives every cell at most one downstream neighbour,
//! so the upstream set of an outlet cell forms a tree rooted at that outlet.
//! This crate finds the deepest leaf of that tree (the source of the longest
//! flow path, measured in cell-to-cell hops) with seven interchangeable
//! algorithm variants sharing one deterministic tie-break contract.

pub mod algorithms;
pub mod direction;
pub mod error;
pub mod grid;
pub mod outlets;
pub mod raster;

pub use algorithms::AlgorithmKind;
pub use error::Error;
pub use grid::{CellLocation, FlowGrid, GeoReference};
