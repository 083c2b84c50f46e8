//! Depth-first inversion of the flow tree, sequential and task-parallel.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::grid::{CellLocation, FlowGrid};

/// Longest-path record for the subtree rooted at `root`: hop depth below the
/// root and the leaf that realises it. Among children of equal maximal
/// depth the FIRST in upstream-enumeration order wins.
///
/// The traversal keeps an explicit stack, so host stack depth is independent
/// of flow-path length. Revisiting a cell is only possible when the grid
/// carries a flow cycle, which is fatal.
pub(crate) fn deepest_leaf(grid: &FlowGrid, root: CellLocation) -> Result<(u32, CellLocation)> {
    // Discovery pass. Parents are pushed before their children, so the
    // reverse of the discovery order visits every child before its parent.
    let mut order = Vec::new();
    let mut stack = vec![root];
    let mut seen = HashSet::new();
    while let Some(cell) = stack.pop() {
        if !seen.insert(cell) {
            return Err(Error::GridMalformed);
        }
        order.push(cell);
        stack.extend(grid.upstream_neighbours(cell));
    }

    // Reduction pass in reverse discovery order.
    let mut best: HashMap<CellLocation, (u32, CellLocation)> =
        HashMap::with_capacity(order.len());
    for &cell in order.iter().rev() {
        let mut record = (0u32, cell);
        for upstream in grid.upstream_neighbours(cell) {
            let (depth, leaf) = best[&upstream];
            // Strict comparison keeps the first maximal child.
            if depth + 1 > record.0 {
                record = (depth + 1, leaf);
            }
        }
        best.insert(cell, record);
    }
    Ok(best[&root])
}

/// Sequential depth-first variant: source of the longest flow path.
pub(crate) fn deepest_source(grid: &FlowGrid, outlet: CellLocation) -> Result<CellLocation> {
    deepest_leaf(grid, outlet).map(|(_, leaf)| leaf)
}

/// Task-parallel variant. While the recursion depth is within `task_limit`,
/// each child subtree is dispatched as an independent rayon task; deeper
/// subtrees run the sequential routine. Subresults are reduced in
/// child-index order, so the result is identical to [`deepest_source`] for
/// any worker count.
pub(crate) fn deepest_source_tasked(
    grid: &FlowGrid,
    outlet: CellLocation,
    task_limit: u32,
) -> Result<CellLocation> {
    descend(grid, outlet, 0, task_limit).map(|(_, leaf)| leaf)
}

fn descend(
    grid: &FlowGrid,
    cell: CellLocation,
    depth: u32,
    task_limit: u32,
) -> Result<(u32, CellLocation)> {
    let children: Vec<CellLocation> = grid.upstream_neighbours(cell).collect();
    if children.is_empty() {
        return Ok((0, cell));
    }

    // A depth beyond the cell count is only possible on a cyclic grid; the
    // sequential routine below the cutoff reports the cycle.
    let spawn = depth < task_limit && (depth as usize) < grid.cell_count();
    let subresults: Vec<Result<(u32, CellLocation)>> = if spawn {
        children
            .par_iter()
            .map(|&child| descend(grid, child, depth + 1, task_limit))
            .collect()
    } else {
        children
            .iter()
            .map(|&child| deepest_leaf(grid, child))
            .collect()
    };

    let mut record: Option<(u32, CellLocation)> = None;
    for subresult in subresults {
        let (sub_depth, leaf) = subresult?;
        // Strict comparison keeps the first maximal child.
        if record.map_or(true, |best| sub_depth + 1 > best.0) {
            record = Some((sub_depth + 1, leaf));
        }
    }
    Ok(record.unwrap_or((0, cell)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u32, col: u32) -> CellLocation {
        CellLocation::new(row, col)
    }

    /// 1x5 westward chain: every cell drains one step west.
    fn chain_grid() -> FlowGrid {
        FlowGrid::from_codes(5, 1, vec![16, 16, 16, 16, 0])
    }

    /// Y-junction with equal arms meeting at (2,2), draining south to (3,2).
    fn junction_grid() -> FlowGrid {
        let mut grid = FlowGrid::new(3, 3, 0);
        grid.set_code(cell(1, 1), 2); // SE into (2,2)
        grid.set_code(cell(1, 3), 8); // SW into (2,2)
        grid.set_code(cell(2, 2), 4); // S into (3,2)
        grid.set_code(cell(3, 1), 1); // E into (3,2)
        grid.set_code(cell(3, 3), 16); // W into (3,2)
        grid
    }

    /// Two cells draining into each other.
    fn cyclic_grid() -> FlowGrid {
        FlowGrid::from_codes(2, 1, vec![1, 16])
    }

    #[test]
    fn chain_source_is_the_far_end() {
        let grid = chain_grid();
        assert_eq!(deepest_leaf(&grid, cell(1, 5)).unwrap(), (4, cell(1, 1)));
    }

    #[test]
    fn junction_tie_breaks_to_the_first_enumerated_arm() {
        // Both arms of the junction have depth 2; the NW arm leaf (1,1) is
        // enumerated before the NE arm leaf (1,3) at the branching cell.
        let grid = junction_grid();
        assert_eq!(deepest_leaf(&grid, cell(3, 2)).unwrap(), (2, cell(1, 1)));
    }

    #[test]
    fn outlet_without_upstream_is_its_own_source() {
        let grid = FlowGrid::new(3, 3, 0);
        assert_eq!(deepest_leaf(&grid, cell(2, 2)).unwrap(), (0, cell(2, 2)));
    }

    #[test]
    fn cycle_is_grid_malformed() {
        let grid = cyclic_grid();
        assert!(matches!(
            deepest_source(&grid, cell(1, 1)),
            Err(Error::GridMalformed)
        ));
    }

    #[test]
    fn tasked_matches_sequential_for_any_cutoff() {
        let grid = junction_grid();
        let sequential = deepest_source(&grid, cell(3, 2)).unwrap();
        for task_limit in [0, 1, 2, 8] {
            assert_eq!(
                deepest_source_tasked(&grid, cell(3, 2), task_limit).unwrap(),
                sequential
            );
        }
    }

    #[test]
    fn tasked_detects_cycles_below_the_cutoff() {
        let grid = cyclic_grid();
        for task_limit in [0, 4, u32::MAX] {
            assert!(matches!(
                deepest_source_tasked(&grid, cell(1, 1), task_limit),
                Err(Error::GridMalformed)
            ));
        }
    }
}
