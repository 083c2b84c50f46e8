//! Flow-direction raster loading.
//!
//! Two on-disk forms are understood, chosen by file extension: u8 GeoTIFF
//! (`.tif` / `.tiff`) and a serialised [`FlowGrid`] JSON document (`.json`).
//! Out-of-range sample values need no mapping here: the direction codec
//! treats every unrecognised code as terminal.

use std::fs;
use std::io;
use std::path::Path;

use tiff::decoder::DecodingResult;
use tiff::tags::Tag;

use crate::error::{Error, Result};
use crate::grid::{FlowGrid, GeoReference};

/// Load a D8 direction grid from `path`.
pub fn load_flow_grid(path: &Path) -> Result<FlowGrid> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match extension.to_ascii_lowercase().as_str() {
        "tif" | "tiff" => load_geotiff(path),
        "json" => load_json(path),
        other => Err(grid_load(
            path,
            format!("unsupported raster extension {other:?}"),
        )),
    }
}

fn grid_load(path: &Path, reason: impl Into<String>) -> Error {
    Error::GridLoad {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

fn load_geotiff(path: &Path) -> Result<FlowGrid> {
    let file = fs::File::open(path).map_err(|e| grid_load(path, e.to_string()))?;
    let mut decoder = tiff::decoder::Decoder::new(io::BufReader::new(file))
        .map_err(|e| grid_load(path, e.to_string()))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| grid_load(path, e.to_string()))?;

    // Georeferencing tags are optional and passed through untouched.
    let pixel_scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok();
    let tie_points = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok();

    let codes = match decoder
        .read_image()
        .map_err(|e| grid_load(path, e.to_string()))?
    {
        DecodingResult::U8(values) => values,
        _ => return Err(grid_load(path, "expected u8 direction samples")),
    };

    let (width, height) = (width as usize, height as usize);
    if codes.len() != width * height {
        return Err(grid_load(path, "expected a single-band raster"));
    }

    let mut grid = FlowGrid::from_codes(width, height, codes);
    if pixel_scale.is_some() || tie_points.is_some() {
        grid.georef = Some(GeoReference { pixel_scale, tie_points });
    }
    Ok(grid)
}

fn load_json(path: &Path) -> Result<FlowGrid> {
    let text = fs::read_to_string(path).map_err(|e| grid_load(path, e.to_string()))?;
    let grid: FlowGrid =
        serde_json::from_str(&text).map_err(|e| grid_load(path, e.to_string()))?;
    if grid.codes.len() != grid.width * grid.height {
        return Err(grid_load(path, "code buffer length does not match dimensions"));
    }
    Ok(grid)
}
