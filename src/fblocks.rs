//! F-block decomposition (§4.4): split a read block into up to eight
//! sub-blocks cut at the output grid line nearest its far edge.
//!
//! F0 is the portion of the block up to that cut — usually one output
//! cell's worth, but the whole block when the far edge already lands on
//! a boundary, which leaves nothing to cut off and forward; F1..F7 are
//! the complementary octants, named by which axes (2, 1, 0) fall on the
//! far side of F0's cut. Octants with zero volume are absent rather than
//! returned empty.

use crate::geometry::{Block, Point};

/// Fixed F-index ordering: bit 0 selects axis 2 on the far side of the
/// cut, bit 1 axis 1, bit 2 axis 0. F0 = 0b000, F7 = 0b111.
const AXIS_BITS: [usize; 3] = [4, 2, 1]; // axis 0, 1, 2 -> bit weight

/// True iff F-index `index` falls on the far side of the F0 cut along
/// `axis`. Shared with the planner's neighbor-chain routing, which walks
/// the same three bits in axis-0, axis-1, axis-2 order.
pub fn far_side(index: usize, axis: usize) -> bool {
    index & AXIS_BITS[axis] != 0
}

/// F0's extent along one axis: the distance from `origin` to the
/// largest output-grid boundary at or below the block's far edge
/// (`origin + shape`), or the full `shape` if that boundary doesn't
/// land past `origin`. When the far edge itself sits on a boundary —
/// the common case at the end of an axis, where there's no further
/// read block to forward a cut octant to — this swallows the whole
/// axis into F0 rather than cutting it, even if an output boundary
/// also falls strictly inside the block.
fn f0_extent(origin: usize, shape: usize, out_shape: usize) -> usize {
    let far = origin + shape;
    let boundary = (far / out_shape) * out_shape;
    if boundary > origin { boundary - origin } else { shape }
}

/// Decompose `block` against the output grid `out_shape`, returning the
/// geometry of each of the eight F-blocks (`None` where the octant has
/// zero volume). `F0` is always `Some`.
pub fn decompose_geometry(block: &Block, out_shape: Point) -> [Option<Block>; 8] {
    let f0_shape = (
        f0_extent(block.origin.0, block.shape.0, out_shape.0),
        f0_extent(block.origin.1, block.shape.1, out_shape.1),
        f0_extent(block.origin.2, block.shape.2, out_shape.2),
    );

    std::array::from_fn(|i| {
        let mut origin = [block.origin.0, block.origin.1, block.origin.2];
        let mut shape = [f0_shape.0, f0_shape.1, f0_shape.2];
        let full = [block.shape.0, block.shape.1, block.shape.2];
        let f0 = [f0_shape.0, f0_shape.1, f0_shape.2];

        for axis in 0..3 {
            if far_side(i, axis) {
                if f0[axis] == full[axis] {
                    return None;
                }
                origin[axis] += f0[axis];
                shape[axis] = full[axis] - f0[axis];
            }
        }

        Some(Block::new(
            (origin[0], origin[1], origin[2]),
            (shape[0], shape[1], shape[2]),
            block.element_size,
        ))
    })
}

/// Like [`decompose_geometry`], but also populates each returned
/// F-block's data from `block`'s own buffer via `get_data_block`.
/// `block` must already hold its bytes in memory.
pub fn decompose_with_data(block: &Block, out_shape: Point) -> [Option<Block>; 8] {
    decompose_geometry(block, out_shape).map(|maybe| maybe.map(|geom| block.get_data_block(&geom)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // A=(12,12,12), I=(4,4,4), O=(3,3,3): reference vectors from the
    // upstream test suite this decomposer is grounded on.
    #[test]
    fn decomposes_the_reference_read_block() {
        let r = Block::new((0, 0, 0), (4, 4, 4), 1);
        let fs = decompose_geometry(&r, (3, 3, 3));

        let f0 = fs[0].as_ref().unwrap();
        assert_eq!(f0.origin, (0, 0, 0));
        assert_eq!(f0.shape, (3, 3, 3));

        // F1: axis 2 far side only.
        let f1 = fs[1].as_ref().unwrap();
        assert_eq!(f1.origin, (0, 0, 3));
        assert_eq!(f1.shape, (3, 3, 1));

        // F7: all three axes far side.
        let f7 = fs[7].as_ref().unwrap();
        assert_eq!(f7.origin, (3, 3, 3));
        assert_eq!(f7.shape, (1, 1, 1));
    }

    #[test]
    fn second_read_block_has_no_cut_on_aligned_axes() {
        // Read block starting at an output boundary: every F_i sharing
        // that axis on its far side has zero volume there and is absent
        // only if the axis degenerates fully; here shape(4) still
        // exceeds the remaining output cell so a cut still exists.
        let r = Block::new((3, 0, 0), (4, 4, 4), 1);
        let fs = decompose_geometry(&r, (3, 3, 3));
        let f0 = fs[0].as_ref().unwrap();
        // Next boundary after 3 is 6, strictly inside (3, 7) -> extent 3.
        assert_eq!(f0.shape.0, 3);
    }

    #[test]
    fn no_interior_boundary_means_f0_spans_the_whole_axis() {
        let r = Block::new((0, 0, 0), (3, 3, 3), 1);
        let fs = decompose_geometry(&r, (3, 3, 3));
        let f0 = fs[0].as_ref().unwrap();
        assert_eq!(f0.shape, (3, 3, 3));
        // Every other octant is degenerate on every axis it touches.
        for i in 1..8 {
            assert!(fs[i].is_none());
        }
    }

    #[test]
    fn f_blocks_tile_the_read_block_exactly() {
        let r = Block::new((2, 5, 1), (4, 4, 4), 1);
        let fs = decompose_geometry(&r, (3, 3, 3));
        let volume: usize = fs.iter().flatten().map(|b| b.volume()).sum();
        assert_eq!(volume, r.volume());
    }
}
