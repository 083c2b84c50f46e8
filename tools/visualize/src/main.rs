//! Diagnostic visualizer — writes direction-grid and distance-field PNG
//! debug images to data/debug/. Not part of the main pipeline; no tests.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use flowpath_core::algorithms::distance_field;
use flowpath_core::{outlets, raster, AlgorithmKind, CellLocation, FlowGrid};

#[derive(Parser, Debug)]
#[command(
    name = "visualize",
    about = "Render a D8 direction grid and its outlet distance field as PNGs"
)]
struct Args {
    /// Flow direction raster (u8 GeoTIFF or serialised .json grid).
    #[arg(short, long)]
    direction: PathBuf,

    /// Outlet location file; the first outlet is rendered.
    #[arg(short, long)]
    outlets: PathBuf,

    /// Output directory.
    #[arg(long, default_value = "data/debug")]
    out_dir: PathBuf,
}

// ── Colour helpers ────────────────────────────────────────────────────────────

/// D8 code → distinct RGB colour; terminal cells are black.
fn direction_color(code: u8) -> [u8; 3] {
    match code {
        1 => [230, 25, 75],    // E: red
        2 => [245, 130, 48],   // SE: orange
        4 => [255, 225, 25],   // S: yellow
        8 => [60, 180, 75],    // SW: green
        16 => [70, 240, 240],  // W: cyan
        32 => [0, 130, 200],   // NW: blue
        64 => [145, 30, 180],  // N: purple
        128 => [240, 50, 230], // NE: magenta
        _ => [0, 0, 0],        // terminal
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let args = Args::parse();

    println!("Loading {}…", args.direction.display());
    let grid = raster::load_flow_grid(&args.direction).expect("cannot load direction raster");
    println!("Grid: {} rows, {} columns", grid.height, grid.width);

    let outlet_text = fs::read_to_string(&args.outlets).expect("cannot read outlet file");
    let outlet_locations = outlets::parse_outlets(&outlet_text).expect("cannot parse outlet file");
    let outlet = *outlet_locations.first().expect("outlet file is empty");
    println!("Outlet: row {}, column {}", outlet.row, outlet.col);

    fs::create_dir_all(&args.out_dir).expect("cannot create output directory");

    let (width, height) = (grid.width as u32, grid.height as u32);

    // ── 1. direction.png ─────────────────────────────────────────────────────
    {
        let mut img = image::RgbImage::new(width, height);
        for (index, &code) in grid.codes.iter().enumerate() {
            let [r, g, b] = direction_color(code);
            img.put_pixel(
                (index % grid.width) as u32,
                (index / grid.width) as u32,
                image::Rgb([r, g, b]),
            );
        }
        save(img, &args.out_dir.join("direction.png"));
    }

    // ── 2. distance.png (log-blue ramp over the outlet's subtree) ────────────
    let field = distance_field(&grid, outlet).expect("distance labelling failed");
    {
        // log(1 + distance) normalised to [0, 1] → blue intensity;
        // unreached cells stay light grey.
        let max_log = field
            .iter()
            .filter(|&&d| d != u32::MAX)
            .map(|&d| (1.0 + d as f64).ln())
            .fold(0.0f64, f64::max)
            .max(1.0);
        let mut img = image::RgbImage::new(width, height);
        for (index, &d) in field.iter().enumerate() {
            let px = if d == u32::MAX {
                image::Rgb([235u8, 235, 235])
            } else {
                let t = ((1.0 + d as f64).ln() / max_log).clamp(0.0, 1.0) as f32;
                let fade = (255.0 * (1.0 - t)) as u8;
                image::Rgb([fade, fade, 255])
            };
            img.put_pixel((index % grid.width) as u32, (index / grid.width) as u32, px);
        }
        save(img, &args.out_dir.join("distance.png"));
    }

    // ── 3. longest_path.png (path in red over dimmed direction colours) ──────
    {
        let source = AlgorithmKind::TopDownMaxSeq
            .single(&grid, outlet)
            .expect("longest flow path failed");
        println!("Source: row {}, column {}", source.row, source.col);

        let mut on_path = vec![false; grid.cell_count()];
        trace_path(&grid, source, outlet, &mut on_path);

        let mut img = image::RgbImage::new(width, height);
        for (index, &code) in grid.codes.iter().enumerate() {
            let px = if on_path[index] {
                image::Rgb([220u8, 30, 30])
            } else {
                let [r, g, b] = direction_color(code);
                image::Rgb([r / 2 + 90, g / 2 + 90, b / 2 + 90])
            };
            img.put_pixel((index % grid.width) as u32, (index / grid.width) as u32, px);
        }
        save(img, &args.out_dir.join("longest_path.png"));
    }

    println!("Done.");
}

/// Mark every cell on the downstream walk from `source` to `outlet`.
fn trace_path(grid: &FlowGrid, source: CellLocation, outlet: CellLocation, on_path: &mut [bool]) {
    let mut cursor = source;
    loop {
        on_path[grid.flat_index(cursor)] = true;
        if cursor == outlet {
            break;
        }
        cursor = grid
            .downstream(cursor)
            .expect("longest path must reach the outlet");
    }
}

fn save(img: image::RgbImage, path: &Path) {
    img.save(path).expect("failed to save PNG");
    println!("Wrote {}", path.display());
}
