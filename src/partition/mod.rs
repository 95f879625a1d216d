//! Uniform tiling of an array into blocks (§4.3): block lookup by origin,
//! neighbor addressing in the block grid, and the three fill modes a
//! partition's blocks can be seeded with before being flushed to disk.

use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::error::{KeepartError, Result};
use crate::geometry::{Block, Point};

/// How a partition's blocks are initialized at construction time.
///
/// Mirrors `keep/block.py`'s `fill` keyword (`'zeros'` / `'random'` /
/// `None`) as a sum type instead of a stringly-typed parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    #[default]
    None,
    Zeros,
    Random,
}

/// A uniform tiling of an array by `shape`-sized blocks, one file per
/// block, named `{name}_block_{N}.bin` where `N` is that block's
/// row-major byte offset in the array. When constructed without a parent
/// array shape, the partition describes the array itself: a single block
/// of file `{name}.bin`.
pub struct Partition {
    pub shape: Point,
    pub name: String,
    pub array_shape: Option<Point>,
    pub element_size: usize,
    /// Number of blocks along each axis. `(1, 1, 1)` when this partition
    /// is the array itself.
    pub grid: Point,
    /// Blocks in row-major grid order: axis 0 slowest, axis 2 fastest.
    /// This is also the deterministic read/iteration order §5 requires.
    pub blocks: Vec<Block>,
    index: FxHashMap<Point, usize>,
}

/// Tile `array` by `shape` and return the blocks in row-major grid order,
/// with no backing file. Used where only the grid's geometry matters —
/// the planner's routing table and the seek model's disk-block lists —
/// and a real [`Partition`] (which always names a file per block) would
/// be the wrong tool.
pub fn tile_geometry(array: Point, shape: Point, element_size: usize) -> Vec<Block> {
    let grid = (array.0 / shape.0, array.1 / shape.1, array.2 / shape.2);
    let mut blocks = Vec::with_capacity(grid.0 * grid.1 * grid.2);
    for i in 0..grid.0 {
        for j in 0..grid.1 {
            for k in 0..grid.2 {
                let origin = (i * shape.0, j * shape.1, k * shape.2);
                blocks.push(Block::new(origin, shape, element_size));
            }
        }
    }
    blocks
}

impl Partition {
    pub fn new(
        shape: Point,
        name: impl Into<String>,
        array_shape: Option<Point>,
        fill_mode: FillMode,
        element_size: usize,
    ) -> Result<Self> {
        let name = name.into();
        if shape.0 == 0 || shape.1 == 0 || shape.2 == 0 {
            return Err(KeepartError::invariant(format!(
                "invalid partition shape: {shape:?}"
            )));
        }

        let (grid, blocks) = match array_shape {
            None => {
                let file = std::path::PathBuf::from(format!("{name}.bin"));
                let block = Block::with_file((0, 0, 0), shape, element_size, file);
                ((1, 1, 1), vec![block])
            }
            Some(array) => {
                for (a, s) in [
                    (array.0, shape.0),
                    (array.1, shape.1),
                    (array.2, shape.2),
                ] {
                    if a % s != 0 {
                        return Err(KeepartError::invariant(format!(
                            "array shape {array:?} is not a multiple of block shape {shape:?}"
                        )));
                    }
                }
                let grid = (array.0 / shape.0, array.1 / shape.1, array.2 / shape.2);
                let mut blocks = Vec::with_capacity(grid.0 * grid.1 * grid.2);
                for i in 0..grid.0 {
                    for j in 0..grid.1 {
                        for k in 0..grid.2 {
                            let origin = (i * shape.0, j * shape.1, k * shape.2);
                            let n = (origin.2
                                + array.2 * origin.1
                                + array.2 * array.1 * origin.0)
                                * element_size;
                            let file =
                                std::path::PathBuf::from(format!("{name}_block_{n}.bin"));
                            blocks.push(Block::with_file(origin, shape, element_size, file));
                        }
                    }
                }
                (grid, blocks)
            }
        };

        let index = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.origin, i))
            .collect();

        let mut partition = Partition {
            shape,
            name,
            array_shape,
            element_size,
            grid,
            blocks,
            index,
        };

        if fill_mode != FillMode::None {
            partition.fill_and_flush(fill_mode)?;
        }

        Ok(partition)
    }

    /// Fills every block's data and flushes it to its own backing file.
    /// Blocks are independent files, so the fill-write-clear cycle runs
    /// across a rayon pool rather than one block at a time (§5: "`rayon`
    /// parallelizes the per-block fill-and-flush of a fresh array").
    fn fill_and_flush(&mut self, fill_mode: FillMode) -> Result<()> {
        use rayon::prelude::*;

        self.blocks.par_iter_mut().try_for_each(|block| -> Result<()> {
            let n = block.byte_len();
            let bytes = match fill_mode {
                FillMode::Zeros => vec![0u8; n],
                FillMode::Random => {
                    use rand::RngCore;
                    let mut bytes = vec![0u8; n];
                    rand::rng().fill_bytes(&mut bytes);
                    bytes
                }
                FillMode::None => unreachable!(),
            };
            block.data.put(0, &bytes);
            block.write()?;
            block.clear();
            Ok(())
        })
    }

    pub fn block_at(&self, origin: Point) -> Option<&Block> {
        self.index.get(&origin).map(|&i| &self.blocks[i])
    }

    /// Fill `block`'s data from every partition block it overlaps,
    /// delegating to [`Block::read_from`]. `block`'s shape may differ
    /// from `self.shape`.
    pub fn read_block(&mut self, block: &mut Block) -> Result<(usize, usize, Duration)> {
        let mut total_bytes = 0;
        let mut total_seeks = 0;
        let mut total_elapsed = Duration::ZERO;
        for i in 0..self.blocks.len() {
            if !self.blocks[i].overlap(block) {
                continue;
            }
            let (bytes, seeks, elapsed) = block.read_from(&self.blocks[i])?;
            total_bytes += bytes;
            total_seeks += seeks;
            total_elapsed += elapsed;
        }
        Ok((total_bytes, total_seeks, total_elapsed))
    }

    /// Write `block`'s data into every partition block it overlaps,
    /// delegating to [`Block::write_to`]. `block`'s shape may differ
    /// from `self.shape`.
    pub fn write_block(&mut self, block: &Block) -> Result<(usize, usize, Duration)> {
        let mut total_bytes = 0;
        let mut total_seeks = 0;
        let mut total_elapsed = Duration::ZERO;
        for i in 0..self.blocks.len() {
            if !block.overlap(&self.blocks[i]) {
                continue;
            }
            let (bytes, seeks, elapsed) = block.write_to(&self.blocks[i])?;
            total_bytes += bytes;
            total_seeks += seeks;
            total_elapsed += elapsed;
        }
        Ok((total_bytes, total_seeks, total_elapsed))
    }

    /// Flat index of the neighbor block along `axis`, in positive
    /// orientation, using row-major grid ordering (axis 2 stride 1, axis
    /// 1 stride `grid.2`, axis 0 stride `grid.1 * grid.2`). Out-of-bounds
    /// neighbors are undefined; the planner only asks for in-bounds ones
    /// by construction of F-block indices.
    pub fn get_neighbor_block_ind(&self, index: usize, axis: usize) -> usize {
        match axis {
            2 => index + 1,
            1 => index + self.grid.2,
            0 => index + self.grid.2 * self.grid.1,
            _ => panic!("invalid axis {axis}"),
        }
    }

    pub fn clear(&mut self) {
        for block in &mut self.blocks {
            block.clear();
        }
    }

    pub fn write(&mut self) -> Result<()> {
        for block in &mut self.blocks {
            block.write()?;
        }
        Ok(())
    }

    /// Remove every block's backing file, if present. Idempotent per
    /// block: a missing file is not an error.
    pub fn delete(&self) -> Result<()> {
        for block in &self.blocks {
            if let Some(path) = &block.file_name {
                if path.exists() {
                    std::fs::remove_file(path).map_err(|e| KeepartError::io(path.clone(), e))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block_partition_describes_the_array() {
        let p = Partition::new((2, 2, 2), "array", None, FillMode::None, 1).unwrap();
        assert_eq!(p.grid, (1, 1, 1));
        assert_eq!(p.blocks.len(), 1);
        assert_eq!(
            p.blocks[0].file_name,
            Some(std::path::PathBuf::from("array.bin"))
        );
    }

    #[test]
    fn tiles_array_with_named_block_files() {
        let p = Partition::new((1, 1, 1), "in", Some((2, 1, 1)), FillMode::None, 1).unwrap();
        assert_eq!(p.grid, (2, 1, 1));
        let names: Vec<_> = p
            .blocks
            .iter()
            .map(|b| b.file_name.clone().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                std::path::PathBuf::from("in_block_0.bin"),
                std::path::PathBuf::from("in_block_1.bin"),
            ]
        );
    }

    #[test]
    fn rejects_shape_that_does_not_divide_array() {
        let err = Partition::new((3, 3, 3), "in", Some((10, 10, 10)), FillMode::None, 1);
        assert!(err.is_err());
    }

    #[test]
    fn neighbor_indices_use_row_major_grid_strides() {
        let p = Partition::new((1, 1, 1), "a", Some((2, 3, 4)), FillMode::None, 1).unwrap();
        assert_eq!(p.grid, (2, 3, 4));
        assert_eq!(p.get_neighbor_block_ind(0, 2), 1);
        assert_eq!(p.get_neighbor_block_ind(0, 1), 4);
        assert_eq!(p.get_neighbor_block_ind(0, 0), 12);
    }
}
