//! Outlet-list parsing.
//!
//! Format: one whitespace-separated `row col label` triple per line,
//! one-based indexing. The label is read and discarded. Blank lines are
//! ignored; any other malformed line is fatal.

use crate::error::{Error, Result};
use crate::grid::CellLocation;

/// Parse outlet locations from outlet-list text.
pub fn parse_outlets(text: &str) -> Result<Vec<CellLocation>> {
    let mut locations = Vec::new();
    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = || Error::OutletParse {
            line: number + 1,
            content: raw.to_owned(),
        };

        let mut fields = line.split_whitespace();
        let row = fields.next().ok_or_else(malformed)?;
        let col = fields.next().ok_or_else(malformed)?;
        let _label = fields.next().ok_or_else(malformed)?;
        if fields.next().is_some() {
            return Err(malformed());
        }

        let row: u32 = row.parse().map_err(|_| malformed())?;
        let col: u32 = col.parse().map_err(|_| malformed())?;
        locations.push(CellLocation::new(row, col));
    }
    Ok(locations)
}
