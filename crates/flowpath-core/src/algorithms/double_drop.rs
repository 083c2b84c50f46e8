//! Two-pass "double drop".
//!
//! Pass 1 ("drop"): every leaf of the inverted tree walks its flow path
//! downstream, incrementing a hop counter and keeping the maximum counter
//! seen at each visited cell; the settled maximum at a cell is the height of
//! the subtree above it, independent of walk order. Pass 2 ("report")
//! ascends from the outlet along the recorded counters, taking the first
//! upstream neighbour in enumeration order that attains each remaining
//! depth, so ties resolve exactly as they do in the other variants.

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::grid::{CellLocation, FlowGrid};

/// Row-major enumeration of the walk starting points: every in-bounds cell
/// with no upstream neighbour.
fn leaves(grid: &FlowGrid) -> Vec<CellLocation> {
    (0..grid.cell_count())
        .map(|index| grid.location_at(index))
        .filter(|&cell| grid.is_leaf(cell))
        .collect()
}

/// One leaf's downstream walk. `store` applies a counter and reports whether
/// the walk still dominates; once a stored counter is at least as large,
/// everything further downstream is already claimed by a path at least as
/// long and the walk ends. A walk longer than the cell count means a flow
/// cycle.
fn drop_walk(
    grid: &FlowGrid,
    leaf: CellLocation,
    mut store: impl FnMut(usize, u32) -> bool,
) -> Result<()> {
    let mut cursor = leaf;
    let mut counter = 0u32;
    loop {
        if !store(grid.flat_index(cursor), counter) {
            return Ok(());
        }
        match grid.downstream(cursor) {
            Some(next) => {
                cursor = next;
                counter += 1;
                if counter as usize > grid.cell_count() {
                    return Err(Error::GridMalformed);
                }
            }
            None => return Ok(()),
        }
    }
}

/// Pass 2: ascend from the outlet along the counter field. The counter at a
/// cell equals 1 + the maximum counter among its upstream neighbours, so at
/// every level the FIRST neighbour (enumeration order) holding the remaining
/// depth is the branch the deepest path came through.
fn ascend(grid: &FlowGrid, counters: &[u32], outlet: CellLocation) -> CellLocation {
    let mut cursor = outlet;
    let mut remaining = counters[grid.flat_index(outlet)];
    while remaining > 0 {
        cursor = grid
            .upstream_neighbours(cursor)
            .find(|&up| counters[grid.flat_index(up)] == remaining - 1)
            .expect("a subtree of the recorded height exists above the cursor");
        remaining -= 1;
    }
    cursor
}

/// Sequential double drop.
pub(crate) fn drop_source(grid: &FlowGrid, outlet: CellLocation) -> Result<CellLocation> {
    let mut counters = vec![0u32; grid.cell_count()];
    for leaf in leaves(grid) {
        drop_walk(grid, leaf, |index, counter| {
            if counter == 0 {
                return true; // the walk's own leaf; nothing to record
            }
            if counters[index] >= counter {
                false
            } else {
                counters[index] = counter;
                true
            }
        })?;
    }
    Ok(ascend(grid, &counters, outlet))
}

/// Parallel double drop: pass 1 runs over the leaves in parallel, with one
/// atomic compare-update per visited cell. The pure maximum is associative
/// and commutative, so the settled counters are identical to the sequential
/// pass for any interleaving and worker count.
pub(crate) fn drop_source_par(grid: &FlowGrid, outlet: CellLocation) -> Result<CellLocation> {
    let counters: Vec<AtomicU32> = (0..grid.cell_count()).map(|_| AtomicU32::new(0)).collect();
    leaves(grid).par_iter().try_for_each(|&leaf| {
        drop_walk(grid, leaf, |index, counter| {
            counter == 0 || counters[index].fetch_max(counter, Ordering::Relaxed) < counter
        })
    })?;
    let counters: Vec<u32> = counters.into_iter().map(AtomicU32::into_inner).collect();
    Ok(ascend(grid, &counters, outlet))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u32, col: u32) -> CellLocation {
        CellLocation::new(row, col)
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

    #[test]
    fn chain_source_is_the_far_end() {
        let grid = FlowGrid::from_codes(5, 1, vec![16, 16, 16, 16, 0]);
        assert_eq!(drop_source(&grid, cell(1, 5)).unwrap(), cell(1, 1));
        assert_eq!(drop_source_par(&grid, cell(1, 5)).unwrap(), cell(1, 1));
    }

    #[test]
    fn junction_tie_breaks_by_upstream_enumeration() {
        // Both arms reach (3,2) in two hops; the ascent takes the NW-scanned
        // neighbour (2,2) and then its first arm, landing on (1,1).
        let grid = junction_grid();
        assert_eq!(drop_source(&grid, cell(3, 2)).unwrap(), cell(1, 1));
        assert_eq!(drop_source_par(&grid, cell(3, 2)).unwrap(), cell(1, 1));
    }

    #[test]
    fn enumeration_order_beats_row_major_leaf_position() {
        // Two equal arms into the outlet (5,5): the SE-arm leaf (4,5) sits
        // earlier in row-major order, but the winning branch is the NW
        // neighbour (4,4), whose arm starts at (6,5).
        let mut grid = FlowGrid::new(6, 6, 0);
        grid.set_code(cell(4, 4), 2); // SE into (5,5)
        grid.set_code(cell(6, 6), 32); // NW into (5,5)
        grid.set_code(cell(5, 4), 64); // N into (4,4)
        grid.set_code(cell(6, 5), 32); // NW into (5,4)
        grid.set_code(cell(4, 5), 2); // SE into (5,6)
        grid.set_code(cell(5, 6), 4); // S into (6,6)
        assert_eq!(drop_source(&grid, cell(5, 5)).unwrap(), cell(6, 5));
        assert_eq!(drop_source_par(&grid, cell(5, 5)).unwrap(), cell(6, 5));
    }

    #[test]
    fn mid_path_outlet_reads_its_own_record() {
        // Walks record at every visited cell, so an outlet in the middle of
        // a path still sees the depth of its upstream chain.
        let grid = FlowGrid::from_codes(5, 1, vec![1, 1, 1, 1, 0]);
        assert_eq!(drop_source(&grid, cell(1, 3)).unwrap(), cell(1, 1));
        assert_eq!(drop_source_par(&grid, cell(1, 3)).unwrap(), cell(1, 1));
    }

    #[test]
    fn isolated_outlet_is_its_own_source() {
        let grid = FlowGrid::new(3, 3, 0);
        assert_eq!(drop_source(&grid, cell(2, 2)).unwrap(), cell(2, 2));
        assert_eq!(drop_source_par(&grid, cell(2, 2)).unwrap(), cell(2, 2));
    }

    #[test]
    fn cycle_is_grid_malformed() {
        // A cycle fed by a leaf: (1,1) -> (1,2) <-> (1,3).
        let grid = FlowGrid::from_codes(3, 1, vec![1, 1, 16]);
        assert!(matches!(
            drop_source(&grid, cell(1, 2)),
            Err(Error::GridMalformed)
        ));
        assert!(matches!(
            drop_source_par(&grid, cell(1, 2)),
            Err(Error::GridMalformed)
        ));
    }

    #[test]
    fn parallel_matches_sequential_on_a_dense_fan() {
        // Every cell drains toward (1,1): heavy tie pressure on the counters.
        let size = 12u32;
        let mut grid = FlowGrid::new(size as usize, size as usize, 0);
        for row in 1..=size {
            for col in 1..=size {
                let code = if row > 1 && col > 1 {
                    32 // NW
                } else if row > 1 {
                    64 // N
                } else if col > 1 {
                    16 // W
                } else {
                    0
                };
                grid.set_code(cell(row, col), code);
            }
        }
        for outlet in [cell(1, 1), cell(3, 3), cell(1, 4)] {
            assert_eq!(
                drop_source(&grid, outlet).unwrap(),
                drop_source_par(&grid, outlet).unwrap(),
                "outlet {outlet:?}"
            );
        }
    }
}
