/// Longest-flow-path measurement runner.
///
/// Loads a D8 flow-direction raster and an outlet list, runs one of the
/// seven algorithm variants, reports wall time, and writes the source
/// locations as CSV.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use flowpath_core::{outlets, raster, AlgorithmKind, CellLocation};

/// Print at most this many outlet/source locations in the run report.
const CELL_PRINT_LIMIT: usize = 8;

const ALGORITHM_LIST: &str = "available algorithms:
  1.  recursive (sequential)
  2.  recursive (task-based parallel)
  3.  top-down: maximum length (sequential)
  4.  top-down: single update (sequential)
  5.  top-down: single update (parallel)
  6.  double drop (sequential)
  7.  double drop (parallel)";

#[derive(Parser, Debug)]
#[command(
    name = "lfp",
    about = "Longest flow path from a D8 flow-direction raster",
    after_help = ALGORITHM_LIST
)]
struct Args {
    /// Flow direction raster (u8 GeoTIFF or serialised .json grid).
    direction_file: PathBuf,

    /// Outlet location file: `row col label` per line, one-based indexing.
    outlet_file: PathBuf,

    /// Algorithm index, 1..=7.
    algorithm_index: u32,

    /// Output CSV filename.
    output_file: PathBuf,

    /// Task-creation depth cutoff for algorithm 2; a non-zero value runs
    /// algorithms 3-5 over all outlets instead of only the first.
    algorithm_parameter: Option<u32>,
}

fn main() -> Result<()> {
    // Four positional arguments are required. Short invocations print the
    // usage text to standard output; only the exit code marks the run as
    // not performed.
    let wants_help = std::env::args().any(|arg| arg == "--help" || arg == "-h");
    if std::env::args().count() < 5 && !wants_help {
        print_usage();
        std::process::exit(1);
    }
    let args = Args::parse();

    println!(
        "loading flow direction file ({})...",
        args.direction_file.display()
    );
    let grid = raster::load_flow_grid(&args.direction_file)?;
    println!(
        "flow direction data: {} rows, {} columns",
        grid.height, grid.width
    );

    println!("loading outlet file ({})...", args.outlet_file.display());
    let outlet_text = fs::read_to_string(&args.outlet_file)
        .with_context(|| format!("cannot read {}", args.outlet_file.display()))?;
    let outlet_locations = outlets::parse_outlets(&outlet_text)?;
    anyhow::ensure!(
        !outlet_locations.is_empty(),
        "outlet file {} contains no locations",
        args.outlet_file.display()
    );

    let algorithm = AlgorithmKind::from_index(args.algorithm_index, args.algorithm_parameter)?;
    println!("executing {} algorithm...", algorithm.label());

    let multi_mode = args.algorithm_parameter.unwrap_or(0) != 0 && algorithm.supports_multi();
    let sources = if multi_mode {
        print_cells("outlet", &outlet_locations);

        let clock = Instant::now();
        let sources = algorithm.multi(&grid, &outlet_locations)?;
        let elapsed = clock.elapsed();

        print_cells("source", &sources);
        println!("execution time (ms): {}", elapsed.as_millis());
        sources
    } else {
        let outlet = outlet_locations[0];
        println!("outlet location: row {}, column {}", outlet.row, outlet.col);

        let clock = Instant::now();
        let source = algorithm.single(&grid, outlet)?;
        let elapsed = clock.elapsed();

        println!("source location: row {}, column {}", source.row, source.col);
        println!("execution time (ms): {}", elapsed.as_millis());
        vec![source]
    };

    write_csv(&args.output_file, &sources)
        .with_context(|| format!("cannot write {}", args.output_file.display()))?;
    Ok(())
}

fn print_usage() {
    println!("required arguments:");
    println!(" 1.  flow direction filename (u8 GeoTIFF or serialised .json grid)");
    println!(" 2.  outlet location filename (containing row and column coordinates, one-based indexing)");
    println!(" 3.  algorithm index");
    println!(" 4.  output filename");
    println!("(5.) algorithm parameter (task-based recursive: task creation limit, top-down: 1 for all outlets (default: only first outlet))");
    println!();
    println!("{ALGORITHM_LIST}");
}

fn print_cells(label: &str, cells: &[CellLocation]) {
    println!("number of {label} locations: {}", cells.len());
    for cell in cells.iter().take(CELL_PRINT_LIMIT) {
        println!("- row {}, column {}", cell.row, cell.col);
    }
    if cells.len() > CELL_PRINT_LIMIT {
        println!("- ...");
    }
}

fn write_csv(path: &Path, sources: &[CellLocation]) -> std::io::Result<()> {
    let mut csv = String::from("row,column\n");
    for source in sources {
        csv.push_str(&format!("{},{}\n", source.row, source.col));
    }
    fs::write(path, csv)
}
