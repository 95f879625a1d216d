//! Seek prediction (§4.7): how many seeks a given set of memory blocks
//! costs against a given set of disk blocks, used both to choose a read
//! shape (fewer predicted seeks is better) and, after a real run, to
//! check the scheduler's observed seek count against the prediction.

use std::collections::BTreeSet;

use crate::geometry::Block;

fn end_coords(blocks: &[Block], axis: usize) -> BTreeSet<usize> {
    blocks
        .iter()
        .map(|b| match axis {
            0 => b.end.0,
            1 => b.end.1,
            _ => b.end.2,
        })
        .collect()
}

fn cuts_in_range(coords: &BTreeSet<usize>, origin: usize, shape: usize) -> usize {
    if shape < 2 {
        return 0;
    }
    coords.range(origin..origin + shape - 1).count()
}

/// Predicted seek count for reading (or writing) `memory_blocks` against
/// the on-disk layout described by `disk_blocks`.
pub fn seek_count(memory_blocks: &[Block], disk_blocks: &[Block]) -> usize {
    let ends0 = end_coords(memory_blocks, 0);
    let ends1 = end_coords(memory_blocks, 1);
    let ends2 = end_coords(memory_blocks, 2);

    disk_blocks
        .iter()
        .map(|d| {
            let c0 = cuts_in_range(&ends0, d.origin.0, d.shape.0);
            let c1 = cuts_in_range(&ends1, d.origin.1, d.shape.1);
            let c2 = cuts_in_range(&ends2, d.origin.2, d.shape.2);
            if c2 > 0 {
                (c2 + 1) * d.shape.0 * d.shape.1
            } else if c1 > 0 {
                (c1 + 1) * d.shape.0
            } else if c0 > 0 {
                c0 + 1
            } else {
                1
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::tile_geometry;

    // S1: A=(2,2,2), I=(2,2,2), O=(2,1,2), method=keep -> 3 total seeks.
    #[test]
    fn scenario_s1_predicts_three_seeks() {
        let array = (2, 2, 2);
        let read_blocks = tile_geometry(array, (2, 2, 2), 1);
        let in_blocks = tile_geometry(array, (2, 2, 2), 1);
        let write_blocks = tile_geometry(array, (2, 1, 2), 1);
        let out_blocks = tile_geometry(array, (2, 1, 2), 1);

        let reads = seek_count(&read_blocks, &in_blocks);
        let writes = seek_count(&write_blocks, &out_blocks);
        assert_eq!(reads + writes, 3);
    }

    // S2: A=(2,2,2), I=(2,1,2), O=(2,2,2), method=baseline -> 6 total seeks.
    #[test]
    fn scenario_s2_predicts_six_seeks() {
        let array = (2, 2, 2);
        let in_blocks = tile_geometry(array, (2, 1, 2), 1);
        let out_blocks = tile_geometry(array, (2, 2, 2), 1);

        // Baseline never reshapes in memory: the blocks written are
        // exactly the blocks read, shaped like I, landing in O's files.
        let reads = seek_count(&in_blocks, &in_blocks);
        let writes = seek_count(&in_blocks, &out_blocks);
        assert_eq!(reads + writes, 6);
    }

    #[test]
    fn aligned_blocks_cost_one_seek_each() {
        let array = (4, 4, 4);
        let blocks = tile_geometry(array, (2, 2, 2), 1);
        assert_eq!(seek_count(&blocks, &blocks), blocks.len());
    }
}
