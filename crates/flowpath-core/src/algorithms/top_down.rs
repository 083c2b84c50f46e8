//! Top-down BFS labelling from the outlet set: the maximum-length variant
//! and the single-update variants (sequential and parallel).
//!
//! All variants accept many outlets in one traversal. Each reached cell is
//! attributed to exactly one outlet; an outlet seeded inside another
//! outlet's subtree keeps its own subtree (first-reach attribution).

use std::collections::{HashMap, VecDeque};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::grid::{CellLocation, FlowGrid};

const UNSET: u32 = u32::MAX;

/// Seed bookkeeping shared by the top-down variants. Duplicate outlet
/// locations alias to the outlet that first claimed the cell.
struct Seeds {
    /// For each requested outlet, the outlet index its result comes from.
    alias: Vec<usize>,
    /// Distinct seed cells with their owning outlet index.
    cells: Vec<(CellLocation, u32)>,
}

fn dedup_seeds(grid: &FlowGrid, outlets: &[CellLocation]) -> Seeds {
    let mut first_claim: HashMap<usize, usize> = HashMap::new();
    let mut alias = Vec::with_capacity(outlets.len());
    let mut cells = Vec::new();
    for (index, &outlet) in outlets.iter().enumerate() {
        match first_claim.entry(grid.flat_index(outlet)) {
            std::collections::hash_map::Entry::Occupied(entry) => alias.push(*entry.get()),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(index);
                alias.push(index);
                cells.push((outlet, index as u32));
            }
        }
    }
    Seeds { alias, cells }
}

/// Distance labelling over the inverted tree, FIFO BFS from all seeds.
pub(crate) struct Labelling {
    /// Hop distance per cell; `u32::MAX` is unset.
    pub dist: Vec<u32>,
    /// Owning outlet index per labelled cell.
    pub owner: Vec<u32>,
    /// Cells in discovery order (parents before children).
    pub order: Vec<CellLocation>,
}

pub(crate) fn label_distances(grid: &FlowGrid, seeds: &[(CellLocation, u32)]) -> Result<Labelling> {
    let cell_count = grid.cell_count();
    let mut dist = vec![UNSET; cell_count];
    let mut owner = vec![0u32; cell_count];
    let mut is_seed = vec![false; cell_count];
    let mut order = Vec::new();
    let mut queue = VecDeque::new();

    for &(cell, outlet) in seeds {
        let index = grid.flat_index(cell);
        dist[index] = 0;
        owner[index] = outlet;
        is_seed[index] = true;
        queue.push_back(cell);
        order.push(cell);
    }

    while let Some(cell) = queue.pop_front() {
        let index = grid.flat_index(cell);
        for upstream in grid.upstream_neighbours(cell) {
            let up_index = grid.flat_index(upstream);
            if dist[up_index] != UNSET {
                // Another outlet seeded in this subtree keeps its own
                // subtree. Any other revisit means a flow cycle: in a tree
                // each cell has a single inbound edge.
                if is_seed[up_index] && owner[up_index] != owner[index] {
                    continue;
                }
                return Err(Error::GridMalformed);
            }
            dist[up_index] = dist[index] + 1;
            owner[up_index] = owner[index];
            queue.push_back(upstream);
            order.push(upstream);
        }
    }

    Ok(Labelling { dist, owner, order })
}

/// Top-down maximum length: label every reachable cell with its distance,
/// then pick the deepest cell per outlet.
///
/// The tie-break reconstructs the lexicographically-smallest deepest path:
/// a reverse-discovery-order pass computes the maximum depth reachable
/// within each cell's subtree, and the ascent from each outlet takes the
/// FIRST upstream neighbour (enumeration order) whose subtree attains the
/// outlet's maximum.
pub(crate) fn max_distance_sources(
    grid: &FlowGrid,
    outlets: &[CellLocation],
) -> Result<Vec<CellLocation>> {
    let seeds = dedup_seeds(grid, outlets);
    let labelling = label_distances(grid, &seeds.cells)?;
    let Labelling { dist, order, .. } = labelling;

    // Maximum distance reachable within each subtree, children first.
    let mut reach = dist.clone();
    for &cell in order.iter().rev() {
        let index = grid.flat_index(cell);
        for upstream in grid.upstream_neighbours(cell) {
            let up_index = grid.flat_index(upstream);
            if dist[up_index] == dist[index] + 1 {
                reach[index] = reach[index].max(reach[up_index]);
            }
        }
    }

    let mut source_of: Vec<Option<CellLocation>> = vec![None; outlets.len()];
    for &(outlet, owner) in &seeds.cells {
        let target = reach[grid.flat_index(outlet)];
        let mut cursor = outlet;
        while dist[grid.flat_index(cursor)] < target {
            let next_depth = dist[grid.flat_index(cursor)] + 1;
            cursor = grid
                .upstream_neighbours(cursor)
                .find(|&up| {
                    let up_index = grid.flat_index(up);
                    dist[up_index] == next_depth && reach[up_index] == target
                })
                .expect("a deeper child exists while below the subtree maximum");
        }
        source_of[owner as usize] = Some(cursor);
    }

    Ok(seeds
        .alias
        .iter()
        .map(|&index| source_of[index].expect("alias resolves to a seeded outlet"))
        .collect())
}

/// Top-down single update, sequential layer expansion.
///
/// Layered BFS keeping one `(distance, source)` record per outlet. The
/// frontier is held in path-lexicographic order (a parent's children are
/// appended in upstream-enumeration order), so the first frontier cell
/// belonging to an outlet is that outlet's tie-break winner at the layer's
/// depth. Each cell has a single inbound edge in the inverted tree, so every
/// cell is updated from exactly one downstream cell and enqueued at most
/// once.
pub(crate) fn single_update_sources(
    grid: &FlowGrid,
    outlets: &[CellLocation],
) -> Result<Vec<CellLocation>> {
    layered_sources(grid, outlets, expand_layer)
}

/// Top-down single update, parallel layer expansion. The order-preserving
/// collect is the layer barrier; the record update runs sequentially over
/// the ordered layer, so the result is identical to the sequential variant
/// for any worker count.
pub(crate) fn single_update_sources_par(
    grid: &FlowGrid,
    outlets: &[CellLocation],
) -> Result<Vec<CellLocation>> {
    layered_sources(grid, outlets, expand_layer_par)
}

fn expand_layer(grid: &FlowGrid, layer: &[(CellLocation, u32)]) -> Vec<(CellLocation, u32)> {
    let mut next = Vec::new();
    for &(cell, owner) in layer {
        next.extend(grid.upstream_neighbours(cell).map(|up| (up, owner)));
    }
    next
}

fn expand_layer_par(grid: &FlowGrid, layer: &[(CellLocation, u32)]) -> Vec<(CellLocation, u32)> {
    layer
        .par_iter()
        .flat_map_iter(|&(cell, owner)| {
            grid.upstream_neighbours(cell).map(move |up| (up, owner))
        })
        .collect()
}

fn layered_sources(
    grid: &FlowGrid,
    outlets: &[CellLocation],
    expand: fn(&FlowGrid, &[(CellLocation, u32)]) -> Vec<(CellLocation, u32)>,
) -> Result<Vec<CellLocation>> {
    let seeds = dedup_seeds(grid, outlets);
    let seed_owner: HashMap<CellLocation, u32> = seeds.cells.iter().copied().collect();

    let mut best: Vec<(u32, CellLocation)> = outlets.iter().map(|&o| (0, o)).collect();
    let mut updated_at = vec![0u32; outlets.len()];
    let mut layer = seeds.cells.clone();
    let mut enqueued = layer.len();
    let mut depth = 0u32;

    while !layer.is_empty() {
        depth += 1;
        let mut next = expand(grid, &layer);

        // First-reach attribution: a seed reached from its own subtree is a
        // flow cycle; a seed reached from another outlet keeps its subtree.
        let mut cycle = false;
        next.retain(|&(cell, owner)| match seed_owner.get(&cell) {
            None => true,
            Some(&seeded) if seeded != owner => false,
            Some(_) => {
                cycle = true;
                false
            }
        });
        if cycle {
            return Err(Error::GridMalformed);
        }

        enqueued += next.len();
        if enqueued > grid.cell_count() {
            return Err(Error::GridMalformed);
        }

        for &(cell, owner) in &next {
            let outlet = owner as usize;
            if updated_at[outlet] != depth {
                updated_at[outlet] = depth;
                best[outlet] = (depth, cell);
            }
        }
        layer = next;
    }

    Ok(seeds.alias.iter().map(|&index| best[index].1).collect())
}
