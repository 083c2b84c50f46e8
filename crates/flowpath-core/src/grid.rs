//! Dense D8 flow-direction raster and cell addressing.

use serde::{Deserialize, Serialize};

use crate::direction::{self, UPSTREAM_SCAN};

/// A one-based (row, col) grid location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellLocation {
    pub row: u32,
    pub col: u32,
}

impl CellLocation {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Opaque georeferencing carried through from the raster loader.
/// The algorithms never interpret it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoReference {
    /// GeoTIFF ModelPixelScale values, when present.
    pub pixel_scale: Option<Vec<f64>>,
    /// GeoTIFF ModelTiepoint values, when present.
    pub tie_points: Option<Vec<f64>>,
}

/// Row-major grid of D8 direction codes.
///
/// The grid is immutable for the lifetime of any algorithm invocation;
/// `set_code` exists for constructing grids in tests and tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowGrid {
    /// Row-major direction codes.
    pub codes: Vec<u8>,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub georef: Option<GeoReference>,
}

impl FlowGrid {
    /// Create a grid filled with the given code.
    pub fn new(width: usize, height: usize, fill: u8) -> Self {
        Self {
            codes: vec![fill; width * height],
            width,
            height,
            georef: None,
        }
    }

    /// Wrap an existing row-major code buffer.
    pub fn from_codes(width: usize, height: usize, codes: Vec<u8>) -> Self {
        assert_eq!(
            codes.len(),
            width * height,
            "code buffer length must equal width * height"
        );
        Self { codes, width, height, georef: None }
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// 1 ≤ row ≤ height and 1 ≤ col ≤ width.
    #[inline]
    pub fn in_bounds(&self, cell: CellLocation) -> bool {
        cell.row >= 1
            && cell.col >= 1
            && cell.row as usize <= self.height
            && cell.col as usize <= self.width
    }

    /// Row-major index of an in-bounds cell.
    #[inline]
    pub fn flat_index(&self, cell: CellLocation) -> usize {
        (cell.row as usize - 1) * self.width + (cell.col as usize - 1)
    }

    /// Cell at a row-major index.
    #[inline]
    pub fn location_at(&self, index: usize) -> CellLocation {
        CellLocation::new(
            (index / self.width + 1) as u32,
            (index % self.width + 1) as u32,
        )
    }

    #[inline]
    pub fn code_at(&self, cell: CellLocation) -> u8 {
        self.codes[self.flat_index(cell)]
    }

    pub fn set_code(&mut self, cell: CellLocation, code: u8) {
        let index = self.flat_index(cell);
        self.codes[index] = code;
    }

    /// The cell this cell drains to, or `None` when the cell is terminal or
    /// its downstream target falls outside the grid.
    pub fn downstream(&self, cell: CellLocation) -> Option<CellLocation> {
        let (d_row, d_col) = direction::offset(self.code_at(cell))?;
        let target = CellLocation::new(
            (cell.row as i64 + d_row as i64) as u32,
            (cell.col as i64 + d_col as i64) as u32,
        );
        self.in_bounds(target).then_some(target)
    }

    /// Neighbours that drain into `cell`, enumerated in the fixed scan order
    /// NW, N, NE, W, E, SW, S, SE (see [`direction::UPSTREAM_SCAN`]).
    pub fn upstream_neighbours(
        &self,
        cell: CellLocation,
    ) -> impl Iterator<Item = CellLocation> + '_ {
        UPSTREAM_SCAN.into_iter().filter_map(move |(d_row, d_col)| {
            let row = cell.row as i64 + d_row as i64;
            let col = cell.col as i64 + d_col as i64;
            if row < 1 || col < 1 {
                return None;
            }
            let neighbour = CellLocation::new(row as u32, col as u32);
            if !self.in_bounds(neighbour) {
                return None;
            }
            // The neighbour drains into `cell` iff its downstream offset is
            // the exact inverse of the scan offset.
            direction::flows_into(self.code_at(neighbour), -d_row, -d_col)
                .then_some(neighbour)
        })
    }

    /// True when no neighbour drains into `cell` (a leaf of the inverted
    /// tree, i.e. a source candidate).
    pub fn is_leaf(&self, cell: CellLocation) -> bool {
        self.upstream_neighbours(cell).next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u32, col: u32) -> CellLocation {
        CellLocation::new(row, col)
    }

    #[test]
    fn bounds_are_one_based_and_inclusive() {
        let grid = FlowGrid::new(5, 3, 0);
        assert!(grid.in_bounds(cell(1, 1)));
        assert!(grid.in_bounds(cell(3, 5)));
        assert!(!grid.in_bounds(cell(0, 1)));
        assert!(!grid.in_bounds(cell(1, 0)));
        assert!(!grid.in_bounds(cell(4, 5)));
        assert!(!grid.in_bounds(cell(3, 6)));
    }

    #[test]
    fn flat_index_round_trips() {
        let grid = FlowGrid::new(4, 3, 0);
        for index in 0..grid.cell_count() {
            let location = grid.location_at(index);
            assert!(grid.in_bounds(location));
            assert_eq!(grid.flat_index(location), index);
        }
    }

    #[test]
    fn downstream_follows_the_code() {
        let mut grid = FlowGrid::new(3, 3, 0);
        grid.set_code(cell(2, 2), 32); // NW
        assert_eq!(grid.downstream(cell(2, 2)), Some(cell(1, 1)));
        // Terminal cell.
        assert_eq!(grid.downstream(cell(3, 3)), None);
    }

    #[test]
    fn downstream_off_grid_is_none() {
        let mut grid = FlowGrid::new(3, 3, 0);
        grid.set_code(cell(1, 1), 64); // N, off the top edge
        assert_eq!(grid.downstream(cell(1, 1)), None);
        grid.set_code(cell(3, 3), 2); // SE, off the corner
        assert_eq!(grid.downstream(cell(3, 3)), None);
    }

    #[test]
    fn upstream_enumeration_order_is_the_contract() {
        // All eight neighbours of (2,2) drain into it.
        let mut grid = FlowGrid::new(3, 3, 0);
        grid.set_code(cell(1, 1), 2); // NW neighbour flows SE
        grid.set_code(cell(1, 2), 4); // N flows S
        grid.set_code(cell(1, 3), 8); // NE flows SW
        grid.set_code(cell(2, 1), 1); // W flows E
        grid.set_code(cell(2, 3), 16); // E flows W
        grid.set_code(cell(3, 1), 128); // SW flows NE
        grid.set_code(cell(3, 2), 64); // S flows N
        grid.set_code(cell(3, 3), 32); // SE flows NW

        let upstream: Vec<CellLocation> = grid.upstream_neighbours(cell(2, 2)).collect();
        assert_eq!(
            upstream,
            vec![
                cell(1, 1),
                cell(1, 2),
                cell(1, 3),
                cell(2, 1),
                cell(2, 3),
                cell(3, 1),
                cell(3, 2),
                cell(3, 3),
            ]
        );
    }

    #[test]
    fn upstream_skips_neighbours_draining_elsewhere() {
        let mut grid = FlowGrid::new(3, 3, 0);
        grid.set_code(cell(1, 1), 1); // E, drains to (1,2), not (2,2)
        grid.set_code(cell(3, 3), 32); // NW, drains to (2,2)
        let upstream: Vec<CellLocation> = grid.upstream_neighbours(cell(2, 2)).collect();
        assert_eq!(upstream, vec![cell(3, 3)]);
    }

    #[test]
    fn leaf_detection() {
        let mut grid = FlowGrid::new(2, 1, 0);
        grid.set_code(cell(1, 1), 1); // E
        assert!(grid.is_leaf(cell(1, 1)));
        assert!(!grid.is_leaf(cell(1, 2)));
    }

    #[test]
    fn corner_cells_enumerate_without_underflow() {
        let grid = FlowGrid::new(2, 2, 0);
        assert_eq!(grid.upstream_neighbours(cell(1, 1)).count(), 0);
        assert_eq!(grid.upstream_neighbours(cell(2, 2)).count(), 0);
    }
}
