/// Cross-algorithm agreement checker.
///
/// Runs all seven longest-flow-path variants on one raster + outlet input,
/// verifies they return identical sources for the first outlet, checks that
/// the top-down multi-outlet mode matches per-outlet single runs, and writes
/// a JSON manifest of results and timings.
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use flowpath_core::{outlets, raster, AlgorithmKind, CellLocation};

#[derive(Parser, Debug)]
#[command(
    name = "validate",
    about = "Check that all longest-flow-path algorithms agree on an input"
)]
struct Args {
    /// Flow direction raster (u8 GeoTIFF or serialised .json grid).
    #[arg(short, long)]
    direction: PathBuf,

    /// Outlet location file: `row col label` per line, one-based indexing.
    #[arg(short, long)]
    outlets: PathBuf,

    /// Task-creation depth cutoff passed to the recursive task variant.
    #[arg(long, default_value_t = 4)]
    task_limit: u32,

    /// Output manifest path.
    #[arg(long, default_value = "validate_manifest.json")]
    manifest: PathBuf,
}

#[derive(Serialize)]
struct AlgorithmReport {
    index: u32,
    label: String,
    source: CellLocation,
    elapsed_ms: u128,
}

#[derive(Serialize)]
struct Manifest {
    direction_file: String,
    grid_height: usize,
    grid_width: usize,
    outlet_count: usize,
    first_outlet: CellLocation,
    /// All seven variants returned the same source for the first outlet.
    agreement: bool,
    /// Top-down multi-outlet mode matched per-outlet single runs.
    multi_outlet_consistent: bool,
    algorithms: Vec<AlgorithmReport>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    eprintln!("[validate] loading {}", args.direction.display());
    let grid = raster::load_flow_grid(&args.direction)?;
    eprintln!(
        "[validate] grid: {} rows, {} columns",
        grid.height, grid.width
    );

    let outlet_text = fs::read_to_string(&args.outlets)
        .with_context(|| format!("cannot read {}", args.outlets.display()))?;
    let outlet_locations = outlets::parse_outlets(&outlet_text)?;
    anyhow::ensure!(
        !outlet_locations.is_empty(),
        "outlet file {} contains no locations",
        args.outlets.display()
    );
    let first_outlet = outlet_locations[0];

    // ── Single-outlet agreement across all seven variants ────────────────
    let mut reports = Vec::new();
    for index in 1..=7u32 {
        let parameter = (index == 2).then_some(args.task_limit);
        let kind = AlgorithmKind::from_index(index, parameter)?;

        let clock = Instant::now();
        let source = kind.single(&grid, first_outlet)?;
        let elapsed = clock.elapsed();

        eprintln!(
            "[validate] {:42} -> row {}, column {}  ({} ms)",
            kind.label(),
            source.row,
            source.col,
            elapsed.as_millis()
        );
        reports.push(AlgorithmReport {
            index,
            label: kind.label().to_owned(),
            source,
            elapsed_ms: elapsed.as_millis(),
        });
    }
    let agreement = reports.iter().all(|r| r.source == reports[0].source);

    // ── Multi-outlet mode vs per-outlet singles (top-down family) ────────
    let reference: Vec<CellLocation> = outlet_locations
        .iter()
        .map(|&outlet| AlgorithmKind::TopDownMaxSeq.single(&grid, outlet))
        .collect::<Result<_, _>>()?;
    let mut multi_outlet_consistent = true;
    for index in 3..=5u32 {
        let kind = AlgorithmKind::from_index(index, Some(1))?;
        let combined = kind.multi(&grid, &outlet_locations)?;
        if combined != reference {
            eprintln!(
                "[validate] multi-outlet mismatch for {}",
                kind.label()
            );
            multi_outlet_consistent = false;
        }
    }

    let manifest = Manifest {
        direction_file: args.direction.display().to_string(),
        grid_height: grid.height,
        grid_width: grid.width,
        outlet_count: outlet_locations.len(),
        first_outlet,
        agreement,
        multi_outlet_consistent,
        algorithms: reports,
    };
    fs::write(&args.manifest, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("cannot write {}", args.manifest.display()))?;
    eprintln!("[validate] wrote {}", args.manifest.display());

    anyhow::ensure!(agreement, "algorithms disagree on the first outlet");
    anyhow::ensure!(
        multi_outlet_consistent,
        "multi-outlet mode disagrees with per-outlet runs"
    );
    eprintln!("[validate] all algorithms agree.");
    Ok(())
}
