//! Longest-flow-path algorithm variants and their dispatcher.
//!
//! Seven variants share one contract: given an outlet, return the cell that
//! begins the longest flow path draining into it, with ties resolved
//! deterministically (see [`crate::direction::UPSTREAM_SCAN`]). The
//! top-down family additionally computes many outlets in a single grid
//! pass.

mod double_drop;
mod recursive;
mod top_down;

use crate::error::{Error, Result};
use crate::grid::{CellLocation, FlowGrid};

/// The seven algorithm variants, tagged with their parameters. Indices
/// 1..=7 match the command-line numbering of the measurement runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    RecursiveSeq,
    RecursiveTask { task_limit: u32 },
    TopDownMaxSeq,
    TopDownSingleSeq,
    TopDownSinglePar,
    DoubleDropSeq,
    DoubleDropPar,
}

impl AlgorithmKind {
    /// Map a CLI algorithm index and optional parameter to a variant.
    ///
    /// The parameter is overloaded for compatibility with the original
    /// front-end: for algorithm 2 it is the task-creation depth cutoff; for
    /// algorithms 3..=5 a non-zero value selects multi-outlet mode (the
    /// caller checks `supports_multi`); otherwise it is ignored.
    pub fn from_index(index: u32, parameter: Option<u32>) -> Result<Self> {
        match index {
            1 => Ok(Self::RecursiveSeq),
            2 => Ok(Self::RecursiveTask {
                task_limit: parameter.unwrap_or(0),
            }),
            3 => Ok(Self::TopDownMaxSeq),
            4 => Ok(Self::TopDownSingleSeq),
            5 => Ok(Self::TopDownSinglePar),
            6 => Ok(Self::DoubleDropSeq),
            7 => Ok(Self::DoubleDropPar),
            other => Err(Error::AlgorithmUnknown(other)),
        }
    }

    /// Human-readable label, matching the measurement runner's report.
    pub fn label(self) -> &'static str {
        match self {
            Self::RecursiveSeq => "recursive (sequential)",
            Self::RecursiveTask { .. } => "recursive (task-based parallel)",
            Self::TopDownMaxSeq => "top-down: maximum length (sequential)",
            Self::TopDownSingleSeq => "top-down: single update (sequential)",
            Self::TopDownSinglePar => "top-down: single update (parallel)",
            Self::DoubleDropSeq => "double drop (sequential)",
            Self::DoubleDropPar => "double drop (parallel)",
        }
    }

    /// Whether `multi` shares a single traversal across outlets (the
    /// top-down family). Other variants dispatch `single` per outlet.
    pub fn supports_multi(self) -> bool {
        matches!(
            self,
            Self::TopDownMaxSeq | Self::TopDownSingleSeq | Self::TopDownSinglePar
        )
    }

    /// Source of the longest flow path draining to `outlet`.
    pub fn single(self, grid: &FlowGrid, outlet: CellLocation) -> Result<CellLocation> {
        check_outlets(grid, std::slice::from_ref(&outlet))?;
        match self {
            Self::RecursiveSeq => recursive::deepest_source(grid, outlet),
            Self::RecursiveTask { task_limit } => {
                recursive::deepest_source_tasked(grid, outlet, task_limit)
            }
            Self::TopDownMaxSeq => {
                top_down::max_distance_sources(grid, &[outlet]).map(|mut s| s.remove(0))
            }
            Self::TopDownSingleSeq => {
                top_down::single_update_sources(grid, &[outlet]).map(|mut s| s.remove(0))
            }
            Self::TopDownSinglePar => {
                top_down::single_update_sources_par(grid, &[outlet]).map(|mut s| s.remove(0))
            }
            Self::DoubleDropSeq => double_drop::drop_source(grid, outlet),
            Self::DoubleDropPar => double_drop::drop_source_par(grid, outlet),
        }
    }

    /// Sources for many outlets, in input order.
    pub fn multi(self, grid: &FlowGrid, outlets: &[CellLocation]) -> Result<Vec<CellLocation>> {
        check_outlets(grid, outlets)?;
        match self {
            Self::TopDownMaxSeq => top_down::max_distance_sources(grid, outlets),
            Self::TopDownSingleSeq => top_down::single_update_sources(grid, outlets),
            Self::TopDownSinglePar => top_down::single_update_sources_par(grid, outlets),
            _ => outlets.iter().map(|&o| self.single(grid, o)).collect(),
        }
    }
}

/// Distance labelling from `outlet` over the inverted tree: hop distance per
/// cell in row-major order, `u32::MAX` for unreached cells. Used by the
/// diagnostic tooling.
pub fn distance_field(grid: &FlowGrid, outlet: CellLocation) -> Result<Vec<u32>> {
    check_outlets(grid, std::slice::from_ref(&outlet))?;
    top_down::label_distances(grid, &[(outlet, 0)]).map(|labelling| labelling.dist)
}

fn check_outlets(grid: &FlowGrid, outlets: &[CellLocation]) -> Result<()> {
    for &outlet in outlets {
        if !grid.in_bounds(outlet) {
            return Err(Error::OutletOutOfBounds {
                row: outlet.row,
                col: outlet.col,
                height: grid.height,
                width: grid.width,
            });
        }
    }
    Ok(())
}
