use std::path::PathBuf;

use super::data::Data;

/// A point, or a shape, in the 3 axes of the array. Axis 2 is fastest
/// (innermost) in row-major layout, matching the on-disk byte order.
pub type Point = (usize, usize, usize);

/// An axis-aligned cuboid region of the array, with an optional backing
/// file and an in-memory [`Data`] buffer.
#[derive(Clone)]
pub struct Block {
    pub origin: Point,
    pub shape: Point,
    /// Inclusive end coordinate per axis: `origin.i + shape.i - 1`.
    pub end: Point,
    pub file_name: Option<PathBuf>,
    pub element_size: usize,
    pub data: Data,
}

/// The byte-offset runs describing the intersection of two blocks, in
/// each block's own row-major layout. Empty lists mean the blocks don't
/// overlap.
pub struct Intersection {
    pub origin: Point,
    pub shape: Point,
    pub self_runs: Vec<(usize, usize)>,
    pub other_runs: Vec<(usize, usize)>,
}

impl Intersection {
    pub fn is_empty(&self) -> bool {
        self.self_runs.is_empty()
    }
}

fn shape_product(shape: Point) -> usize {
    shape.0 * shape.1 * shape.2
}

impl Block {
    pub fn new(origin: Point, shape: Point, element_size: usize) -> Self {
        let end = (
            origin.0 + shape.0 - 1,
            origin.1 + shape.1 - 1,
            origin.2 + shape.2 - 1,
        );
        Block {
            origin,
            shape,
            end,
            file_name: None,
            element_size,
            data: Data::new(shape_product(shape) * element_size),
        }
    }

    pub fn with_file(origin: Point, shape: Point, element_size: usize, file_name: PathBuf) -> Self {
        let mut b = Block::new(origin, shape, element_size);
        b.file_name = Some(file_name);
        b
    }

    pub fn volume(&self) -> usize {
        shape_product(self.shape)
    }

    pub fn byte_len(&self) -> usize {
        self.volume() * self.element_size
    }

    /// A block is empty (participates in no overlaps) if any axis has
    /// zero extent.
    pub fn is_empty(&self) -> bool {
        self.shape.0 == 0 || self.shape.1 == 0 || self.shape.2 == 0
    }

    pub fn complete(&self) -> bool {
        self.data.is_complete()
    }

    /// Byte offset of `point` within this block's row-major layout.
    /// `point` must lie inside the block.
    pub fn offset(&self, point: Point) -> usize {
        let element_offset = (point.2 - self.origin.2)
            + self.shape.2 * (point.1 - self.origin.1)
            + self.shape.2 * self.shape.1 * (point.0 - self.origin.0);
        element_offset * self.element_size
    }

    /// Inverse of [`Block::offset`].
    pub fn point_from_offset(&self, offset: usize) -> Point {
        let element_offset = offset / self.element_size;
        let k = element_offset % self.shape.2;
        let rem = element_offset / self.shape.2;
        let j = rem % self.shape.1;
        let i = rem / self.shape.1;
        (self.origin.0 + i, self.origin.1 + j, self.origin.2 + k)
    }

    /// True iff `point` lies inside this block (high boundary inclusive).
    pub fn inside(&self, point: Point) -> bool {
        (0..3).all(|axis| {
            let p = match axis {
                0 => point.0,
                1 => point.1,
                _ => point.2,
            };
            let o = match axis {
                0 => self.origin.0,
                1 => self.origin.1,
                _ => self.origin.2,
            };
            let e = match axis {
                0 => self.end.0,
                1 => self.end.1,
                _ => self.end.2,
            };
            p >= o && p <= e
        })
    }

    /// True iff self and other overlap on every axis. Empty blocks never
    /// overlap anything.
    pub fn overlap(&self, other: &Block) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.origin.0 <= other.end.0
            && other.origin.0 <= self.end.0
            && self.origin.1 <= other.end.1
            && other.origin.1 <= self.end.1
            && self.origin.2 <= other.end.2
            && other.origin.2 <= self.end.2
    }

    /// Enumerate the contiguous byte runs of a sub-box `(box_origin,
    /// box_shape)` — assumed to be inside `self` — in self's own
    /// row-major layout. Runs are `(start, end_inclusive)` pairs.
    fn run_offsets(&self, box_origin: Point, box_shape: Point) -> Vec<(usize, usize)> {
        let e = self.element_size;
        let delta_2 = box_shape.2 * e;
        let delta_1 = (self.shape.2 - box_shape.2) * e;
        let delta_0 = (self.shape.1 - box_shape.1) * self.shape.2 * e;

        let mut current_offset = self.offset(box_origin);
        let mut start_seg = current_offset;
        let mut runs = Vec::new();

        for _i in 0..box_shape.0 {
            for _j in 0..box_shape.1 {
                if delta_2 != 0 {
                    current_offset += delta_2;
                }
                if delta_1 != 0 {
                    let end_seg = current_offset - 1;
                    runs.push((start_seg, end_seg));
                    current_offset += delta_1;
                    start_seg = current_offset;
                }
            }
            if delta_0 != 0 {
                if delta_1 == 0 {
                    let end_seg = current_offset - 1;
                    runs.push((start_seg, end_seg));
                }
                current_offset += delta_0;
                start_seg = current_offset;
            }
        }

        if runs.is_empty() {
            let end_seg = current_offset - 1;
            runs.push((start_seg, end_seg));
        }
        runs
    }

    /// For the intersection of self and other, return the intersection's
    /// origin and shape plus the ordered run lists in each block's own
    /// layout. Empty lists if the blocks don't overlap.
    pub fn block_offsets(&self, other: &Block) -> Intersection {
        if !self.overlap(other) {
            return Intersection {
                origin: (0, 0, 0),
                shape: (0, 0, 0),
                self_runs: Vec::new(),
                other_runs: Vec::new(),
            };
        }

        let origin = (
            self.origin.0.max(other.origin.0),
            self.origin.1.max(other.origin.1),
            self.origin.2.max(other.origin.2),
        );
        let end_excl = (
            (self.origin.0 + self.shape.0).min(other.origin.0 + other.shape.0),
            (self.origin.1 + self.shape.1).min(other.origin.1 + other.shape.1),
            (self.origin.2 + self.shape.2).min(other.origin.2 + other.shape.2),
        );
        let shape = (
            end_excl.0 - origin.0,
            end_excl.1 - origin.1,
            end_excl.2 - origin.2,
        );

        let self_runs = self.run_offsets(origin, shape);
        let other_runs = other.run_offsets(origin, shape);
        Intersection {
            origin,
            shape,
            self_runs,
            other_runs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(origin: Point, shape: Point) -> Block {
        Block::new(origin, shape, 1)
    }

    #[test]
    fn offset_matches_reference_points() {
        let b = block((1, 1, 1), (4, 5, 6));
        assert_eq!(b.offset((1, 1, 3)), 2);
        assert_eq!(b.offset((2, 2, 2)), 1 + 6 + 30);

        let c = block((1, 2, 3), (5, 6, 7));
        assert_eq!(c.offset((1, 2, 9)), 6);
        assert_eq!(c.offset((1, 7, 3)), 35);
        assert_eq!(c.offset((1, 7, 9)), 41);
        assert_eq!(c.offset((2, 2, 3)), 42);
        assert_eq!(c.offset((5, 7, 9)), c.volume() - 1);
    }

    #[test]
    fn point_from_offset_is_the_inverse_of_offset() {
        let b = block((1, 2, 3), (5, 2, 7));
        assert_eq!(b.point_from_offset(0), (1, 2, 3));

        let b = block((1, 1, 1), (4, 5, 6));
        for p in [(1, 1, 3), (2, 2, 2)] {
            assert_eq!(b.point_from_offset(b.offset(p)), p);
        }

        let b = block((1, 2, 3), (5, 6, 7));
        for p in [(1, 2, 9), (1, 7, 3), (1, 7, 9), (2, 2, 3), (5, 7, 9)] {
            assert_eq!(b.point_from_offset(b.offset(p)), p);
        }
    }

    #[test]
    fn block_offsets_self_covers_one_run() {
        let b = block((1, 2, 3), (5, 6, 7));
        let i = b.block_offsets(&b);
        assert_eq!(i.origin, b.origin);
        assert_eq!(i.shape, b.shape);
        assert_eq!(i.self_runs, vec![(0, 209)]);
        assert_eq!(i.other_runs, vec![(0, 209)]);
    }

    // Scenario S6.
    #[test]
    fn block_offsets_matches_reference_vectors() {
        let c = block((0, 0, 0), (4, 4, 4));
        let b = block((1, 2, 3), (5, 6, 7));
        let i = c.block_offsets(&b);
        assert_eq!(i.origin, (1, 2, 3));
        assert_eq!(i.shape, (3, 2, 1));
        assert_eq!(
            i.self_runs,
            vec![(27, 27), (31, 31), (43, 43), (47, 47), (59, 59), (63, 63)]
        );
        assert_eq!(
            i.other_runs,
            vec![(0, 0), (7, 7), (42, 42), (49, 49), (84, 84), (91, 91)]
        );

        let d = block((1, 2, 2), (4, 4, 4));
        let i = c.block_offsets(&d);
        assert_eq!(i.origin, d.origin);
        assert_eq!(i.shape, (3, 2, 2));
        assert_eq!(
            i.self_runs,
            vec![(26, 27), (30, 31), (42, 43), (46, 47), (58, 59), (62, 63)]
        );
        assert_eq!(
            i.other_runs,
            vec![(0, 1), (4, 5), (16, 17), (20, 21), (32, 33), (36, 37)]
        );

        let e = block((1, 2, 1), (4, 4, 4));
        let i = c.block_offsets(&e);
        assert_eq!(i.origin, e.origin);
        assert_eq!(i.shape, (3, 2, 3));
        assert_eq!(
            i.self_runs,
            vec![(25, 27), (29, 31), (41, 43), (45, 47), (57, 59), (61, 63)]
        );
        assert_eq!(
            i.other_runs,
            vec![(0, 2), (4, 6), (16, 18), (20, 22), (32, 34), (36, 38)]
        );
    }

    #[test]
    fn block_offsets_symmetric_origin_and_shape() {
        let a = block((0, 0, 0), (4, 4, 4));
        let b = block((1, 2, 3), (5, 6, 7));
        let ab = a.block_offsets(&b);
        let ba = b.block_offsets(&a);
        assert_eq!(ab.origin, ba.origin);
        assert_eq!(ab.shape, ba.shape);
    }

    #[test]
    fn disjoint_blocks_have_no_overlap() {
        let a = block((0, 0, 0), (2, 2, 2));
        let b = block((10, 10, 10), (2, 2, 2));
        assert!(!a.overlap(&b));
        let i = a.block_offsets(&b);
        assert!(i.is_empty());
    }

    #[test]
    fn zero_volume_block_never_overlaps() {
        let a = block((0, 0, 0), (2, 2, 2));
        let empty = block((0, 0, 0), (0, 2, 2));
        assert!(!a.overlap(&empty));
    }

    #[test]
    fn high_boundary_point_is_inside() {
        let b = block((0, 0, 0), (4, 4, 4));
        assert!(b.inside((3, 3, 3)));
        assert!(!b.inside((4, 0, 0)));
    }
}
