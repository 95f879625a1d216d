//! The keep planner (§4.5): choose a read-block shape under a memory
//! bound and build the F-block → write-block routing plan the cache
//! runs on.
//!
//! The "baseline" method bypasses all of this — it reads input blocks
//! and writes them straight to the output partition, unchanged — but is
//! exposed from here too so the scheduler has one place to get a [`Plan`]
//! from, regardless of method.

use rustc_hash::FxHashMap;

use crate::cache::{BaselineCache, Cache, KeepCache, MatchTable};
use crate::error::{KeepartError, Result};
use crate::fblocks;
use crate::geometry::{Block, Point};
use crate::partition::tile_geometry;
use crate::seekmodel;

/// A fully-built plan: which shape to read in, a cache already wired to
/// its routing table, and the predictions the scheduler checks its
/// observed counters against.
pub struct Plan {
    pub read_shape: Point,
    pub cache: Cache,
    pub expected_seeks: usize,
    pub expected_peak: usize,
}

/// r̂_d = I_d · ⌈O_d / I_d⌉, the smallest read shape that is a multiple
/// of the input shape and covers at least one output block per axis.
pub fn r_hat(in_shape: Point, out_shape: Point) -> Point {
    let ceil_div = |a: usize, b: usize| (a + b - 1) / b;
    (
        in_shape.0 * ceil_div(out_shape.0, in_shape.0),
        in_shape.1 * ceil_div(out_shape.1, in_shape.1),
        in_shape.2 * ceil_div(out_shape.2, in_shape.2),
    )
}

/// All divisors of `n`, including 1 and `n` itself.
pub fn divisors(n: usize) -> Vec<usize> {
    (1..=n).filter(|d| n % d == 0).collect()
}

fn divides(array: Point, shape: Point) -> bool {
    array.0 % shape.0 == 0 && array.1 % shape.1 == 0 && array.2 % shape.2 == 0
}

/// Flat index of the neighbor of `index` along `axis`, in a grid of
/// `dims` blocks per axis (row-major: axis 2 stride 1, axis 1 stride
/// `dims.2`, axis 0 stride `dims.1 * dims.2`). Mirrors
/// `Partition::get_neighbor_block_ind`; kept standalone here because the
/// planner reasons about a read-block grid that has no backing files.
fn grid_neighbor(dims: Point, index: usize, axis: usize) -> usize {
    match axis {
        2 => index + 1,
        1 => index + dims.2,
        0 => index + dims.2 * dims.1,
        _ => panic!("invalid axis {axis}"),
    }
}

/// Walk the neighbor chain described in §4.5 to find which read-block
/// index owns the F0 that `f_index` of `index` ultimately belongs to.
fn destination_of(dims: Point, index: usize, f_index: usize) -> usize {
    match f_index {
        1 => grid_neighbor(dims, index, 2),
        2 => grid_neighbor(dims, index, 1),
        3 => destination_of(dims, grid_neighbor(dims, index, 1), 1),
        4 => grid_neighbor(dims, index, 0),
        5 => destination_of(dims, grid_neighbor(dims, index, 0), 1),
        6 => destination_of(dims, grid_neighbor(dims, index, 0), 2),
        7 => destination_of(dims, grid_neighbor(dims, index, 0), 3),
        _ => panic!("invalid F-index {f_index}"),
    }
}

/// Everything `build_for_shape` computes for one candidate read shape,
/// before it's known whether the shape will be kept.
struct Built {
    read_shape: Point,
    match_table: MatchTable,
    /// One `(origin, shape)` per destination write bucket — shape is each
    /// bucket-owning read block's own F0 geometry, not always `out_shape`
    /// (see `KeepCache::new`).
    write_blocks: Vec<(Point, Point)>,
    peak: usize,
    seeks: usize,
}

/// Build the routing plan for one candidate `read_shape` and measure its
/// predicted seeks and peak memory. Does not touch any file.
fn build_for_shape(
    array: Point,
    in_shape: Point,
    out_shape: Point,
    read_shape: Point,
    element_size: usize,
) -> Result<Built> {
    if !divides(array, read_shape) {
        return Err(KeepartError::invariant(format!(
            "read shape {read_shape:?} does not divide array {array:?}"
        )));
    }
    let dims = (
        array.0 / read_shape.0,
        array.1 / read_shape.1,
        array.2 / read_shape.2,
    );
    let read_blocks = tile_geometry(array, read_shape, element_size);

    let mut match_table: MatchTable = FxHashMap::default();
    let mut write_blocks = Vec::with_capacity(read_blocks.len());
    for (i, rb) in read_blocks.iter().enumerate() {
        let fs = fblocks::decompose_geometry(rb, out_shape);
        match_table.insert((rb.origin, 0), rb.origin);
        write_blocks.push((rb.origin, fs[0].as_ref().expect("F0 is always present").shape));
        for (f_index, maybe_geom) in fs.iter().enumerate().skip(1) {
            if maybe_geom.is_none() {
                continue;
            }
            let dest_index = destination_of(dims, i, f_index);
            match_table.insert((rb.origin, f_index), read_blocks[dest_index].origin);
        }
    }

    let peak = estimate_peak_mem(out_shape, element_size, &match_table, &write_blocks, &read_blocks);

    let in_disk = tile_geometry(array, in_shape, element_size);
    let out_disk = tile_geometry(array, out_shape, element_size);
    // Modeled read-shaped, not out_shape-shaped: a write bucket's own F0
    // defaults to the whole owning read block (§4.4) before any far-side
    // octants from neighbors are folded in, which is the shape the seek
    // model needs to predict the write-side seek count against.
    let write_mem: Vec<Block> = write_blocks
        .iter()
        .map(|&(origin, _)| Block::new(origin, read_shape, element_size))
        .collect();
    let seeks = seekmodel::seek_count(&read_blocks, &in_disk) + seekmodel::seek_count(&write_mem, &out_disk);

    Ok(Built {
        read_shape,
        match_table,
        write_blocks,
        peak,
        seeks,
    })
}

/// Simulate the scheduler's read→cache→write loop with no file I/O,
/// tracking only byte counts, to find the peak memory a candidate shape
/// would use (§4.5 "Memory estimation").
fn estimate_peak_mem(
    out_shape: Point,
    element_size: usize,
    match_table: &MatchTable,
    write_blocks: &[(Point, Point)],
    read_blocks: &[Block],
) -> usize {
    let mut cache = Cache::Keep(KeepCache::new(
        out_shape,
        element_size,
        match_table.clone(),
        write_blocks.to_vec(),
    ));
    let mut peak = 0;
    for rb in read_blocks {
        let dummy = Block::new(rb.origin, rb.shape, element_size);
        let completed = cache.insert(&dummy, true);
        peak = peak.max(cache.mem_usage());
        for origin in completed {
            cache.clear(origin);
        }
    }
    peak
}

fn into_plan(built: Built, out_shape: Point, element_size: usize) -> Plan {
    Plan {
        read_shape: built.read_shape,
        cache: Cache::Keep(KeepCache::new(
            out_shape,
            element_size,
            built.match_table,
            built.write_blocks,
        )),
        expected_seeks: built.seeks,
        expected_peak: built.peak,
    }
}

/// Choose a read shape and build the routing plan for the "keep" method
/// (§4.5). `mem_bound`, when present, is a hard byte ceiling on peak
/// cache memory; the search over read shapes is restricted to axis 0
/// divisors of the array, per §9's documented historical policy.
pub fn plan_keep(
    array: Point,
    in_shape: Point,
    out_shape: Point,
    element_size: usize,
    mem_bound: Option<u64>,
) -> Result<Plan> {
    let preferred = r_hat(in_shape, out_shape);
    if !divides(array, preferred) {
        return Err(KeepartError::invariant(format!(
            "preferred read shape {preferred:?} does not divide array {array:?}"
        )));
    }

    let built = build_for_shape(array, in_shape, out_shape, preferred, element_size)?;
    let Some(bound) = mem_bound else {
        return Ok(into_plan(built, out_shape, element_size));
    };
    if built.peak as u64 <= bound {
        return Ok(into_plan(built, out_shape, element_size));
    }

    let mut candidates: Vec<usize> = divisors(array.0)
        .into_iter()
        .filter(|&d| d <= preferred.0 && d != preferred.0)
        .collect();
    candidates.sort_unstable_by(|a, b| b.cmp(a));

    for d in candidates {
        let shape = (d, preferred.1, preferred.2);
        let built = build_for_shape(array, in_shape, out_shape, shape, element_size)?;
        if built.peak as u64 <= bound {
            return Ok(into_plan(built, out_shape, element_size));
        }
    }

    Err(KeepartError::Infeasible { bound })
}

/// The degenerate "baseline" plan (§4.6): read blocks are written back
/// out unreshaped, at their own origin, into the output partition's
/// files.
pub fn plan_baseline(array: Point, in_shape: Point, out_shape: Point, element_size: usize) -> Plan {
    let in_disk = tile_geometry(array, in_shape, element_size);
    let out_disk = tile_geometry(array, out_shape, element_size);
    let seeks = seekmodel::seek_count(&in_disk, &in_disk) + seekmodel::seek_count(&in_disk, &out_disk);
    Plan {
        read_shape: in_shape,
        cache: Cache::Baseline(BaselineCache::default()),
        expected_seeks: seeks,
        expected_peak: in_shape.0 * in_shape.1 * in_shape.2 * element_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S5.
    #[test]
    fn r_hat_matches_reference() {
        assert_eq!(r_hat((875, 875, 875), (500, 500, 500)), (875, 875, 875));
        assert_eq!(r_hat((20, 20, 20), (20, 10, 2)), (20, 20, 20));
    }

    #[test]
    fn r_hat_that_does_not_divide_the_array_is_an_invariant_violation() {
        let array = (10, 10, 10);
        let preferred = r_hat((2, 2, 2), (5, 5, 5));
        assert_eq!(preferred, (6, 6, 6));
        assert!(array.0 % preferred.0 != 0);
    }

    #[test]
    fn divisors_matches_reference() {
        let mut d = divisors(10);
        d.sort_unstable();
        assert_eq!(d, vec![1, 2, 5, 10]);
        let mut d = divisors(42);
        d.sort_unstable();
        assert_eq!(d, vec![1, 2, 3, 6, 7, 14, 21, 42]);
    }

    // S1: A=(2,2,2), I=(2,2,2), O=(2,1,2), method=keep -> 3 predicted seeks.
    #[test]
    fn scenario_s1_plan_predicts_three_seeks() {
        let plan = plan_keep((2, 2, 2), (2, 2, 2), (2, 1, 2), 1, None).unwrap();
        assert_eq!(plan.read_shape, (2, 2, 2));
        assert_eq!(plan.expected_seeks, 3);
    }

    // S2: A=(2,2,2), I=(2,1,2), O=(2,2,2), method=baseline -> 6 predicted seeks.
    #[test]
    fn scenario_s2_plan_predicts_six_seeks() {
        let plan = plan_baseline((2, 2, 2), (2, 1, 2), (2, 2, 2), 1);
        assert_eq!(plan.expected_seeks, 6);
    }

    #[test]
    fn memory_bound_forces_a_smaller_axis0_read_shape() {
        // A=(12,12,12), I=(4,4,4), O=(3,3,3): r_hat = (4,4,4), volume 64B
        // at element_size 1. A tight bound forces axis-0 down.
        let array = (12, 12, 12);
        let preferred = r_hat((4, 4, 4), (3, 3, 3));
        assert_eq!(preferred, (4, 4, 4));
        let unconstrained = plan_keep(array, (4, 4, 4), (3, 3, 3), 1, None).unwrap();
        assert_eq!(unconstrained.read_shape, preferred);

        let constrained = plan_keep(array, (4, 4, 4), (3, 3, 3), 1, Some(64)).unwrap();
        assert!(constrained.read_shape.0 < preferred.0);
        assert!(constrained.expected_peak as u64 <= 64);
    }

    #[test]
    fn infeasible_bound_is_reported_distinctly() {
        let err = plan_keep((12, 12, 12), (4, 4, 4), (3, 3, 3), 1, Some(1)).unwrap_err();
        assert!(matches!(err, KeepartError::Infeasible { .. }));
    }
}
