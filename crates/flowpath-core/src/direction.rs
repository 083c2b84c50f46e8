//! D8 direction codec.
//!
//! Direction encoding: 1 = E, 2 = SE, 4 = S,  8 = SW,
//!                     16 = W, 32 = NW, 64 = N, 128 = NE.
//! Every other value (0, no-data, multi-bit garbage) marks the cell as
//! terminal: it has no downstream neighbour.

/// Downstream (Δrow, Δcol) for a D8 code. Total on `u8`: any value that is
/// not one of the eight direction bits returns `None`.
#[inline]
pub fn offset(code: u8) -> Option<(i32, i32)> {
    match code {
        1 => Some((0, 1)),    // E
        2 => Some((1, 1)),    // SE
        4 => Some((1, 0)),    // S
        8 => Some((1, -1)),   // SW
        16 => Some((0, -1)),  // W
        32 => Some((-1, -1)), // NW
        64 => Some((-1, 0)),  // N
        128 => Some((-1, 1)), // NE
        _ => None,
    }
}

/// True iff a cell carrying `code` drains to the neighbour at
/// `(d_row, d_col)`. Used to find upstream neighbours by inversion.
#[inline]
pub fn flows_into(code: u8, d_row: i32, d_col: i32) -> bool {
    offset(code) == Some((d_row, d_col))
}

/// Neighbour scan order for upstream enumeration: NW, N, NE, W, E, SW, S, SE.
///
/// This order is a contract, not an implementation detail: every
/// deterministic tie-break in the longest-flow-path algorithms is defined in
/// terms of it.
pub const UPSTREAM_SCAN: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    ( 0, -1),          ( 0, 1),
    ( 1, -1), ( 1, 0), ( 1, 1),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_is_total_with_exactly_eight_directions() {
        let directed = (0u8..=255).filter(|&c| offset(c).is_some()).count();
        assert_eq!(directed, 8);
        assert_eq!(offset(0), None);
        assert_eq!(offset(3), None); // multi-bit value is terminal
        assert_eq!(offset(255), None);
    }

    #[test]
    fn offsets_match_the_compass() {
        assert_eq!(offset(1), Some((0, 1))); // E
        assert_eq!(offset(16), Some((0, -1))); // W
        assert_eq!(offset(64), Some((-1, 0))); // N
        assert_eq!(offset(4), Some((1, 0))); // S
        assert_eq!(offset(32), Some((-1, -1))); // NW
        assert_eq!(offset(128), Some((-1, 1))); // NE
    }

    #[test]
    fn flows_into_agrees_with_offset() {
        for code in 0u8..=255 {
            match offset(code) {
                Some((dr, dc)) => {
                    assert!(flows_into(code, dr, dc));
                    assert!(!flows_into(code, -dr, -dc) || (dr == 0 && dc == 0));
                }
                None => {
                    for &(dr, dc) in &UPSTREAM_SCAN {
                        assert!(!flows_into(code, dr, dc));
                    }
                }
            }
        }
    }

    #[test]
    fn upstream_scan_starts_north_west_row_by_row() {
        assert_eq!(UPSTREAM_SCAN[0], (-1, -1)); // NW
        assert_eq!(UPSTREAM_SCAN[1], (-1, 0)); // N
        assert_eq!(UPSTREAM_SCAN[4], (0, 1)); // E
        assert_eq!(UPSTREAM_SCAN[7], (1, 1)); // SE
    }
}
