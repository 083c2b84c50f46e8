//! Error kinds shared across the workspace.
//!
//! Every error is fatal for the invocation: the algorithms never recover and
//! partial results are never emitted.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load flow direction raster {path}: {reason}")]
    GridLoad { path: String, reason: String },

    #[error("outlet file line {line}: expected `row col label`, got {content:?}")]
    OutletParse { line: usize, content: String },

    #[error("outlet at row {row}, column {col} is outside the {height}x{width} grid")]
    OutletOutOfBounds {
        row: u32,
        col: u32,
        height: usize,
        width: usize,
    },

    #[error("flow direction grid contains a cycle; D8 grids must be acyclic")]
    GridMalformed,

    #[error("unknown algorithm index {0} (valid indices: 1..=7)")]
    AlgorithmUnknown(u32),
}

pub type Result<T> = std::result::Result<T, Error>;
