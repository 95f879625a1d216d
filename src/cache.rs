//! The cache capability (§4.6): accumulates read-block payloads into
//! their destination write blocks and reports which ones have become
//! complete. Two variants behind one enum rather than a trait object —
//! the set is closed and known at compile time.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::fblocks;
use crate::geometry::{Block, Point};

/// `KeepCache`'s routing table: which destination write block (by
/// origin) receives a given F-block of a given read block.
pub type MatchTable = FxHashMap<(Point, usize), Point>;

pub struct KeepCache {
    out_shape: Point,
    element_size: usize,
    match_table: MatchTable,
    write_blocks: FxHashMap<Point, Block>,
    reported: FxHashSet<Point>,
}

impl KeepCache {
    /// `write_blocks`: one `(origin, shape)` per destination bucket. Shape
    /// is usually `out_shape`, but a bucket that swallows its whole read
    /// block (§4.4 — the axis's far edge lands exactly on an output-grid
    /// boundary, so there's no neighbor to forward a cut octant to) is
    /// wider than `out_shape` along that axis; declaring its real shape
    /// here is what lets `complete()` and `put_data_block` agree on how
    /// much data actually belongs in it.
    pub fn new(
        out_shape: Point,
        element_size: usize,
        match_table: MatchTable,
        write_blocks: Vec<(Point, Point)>,
    ) -> Self {
        let write_blocks = write_blocks
            .into_iter()
            .map(|(origin, shape)| (origin, Block::new(origin, shape, element_size)))
            .collect();
        KeepCache {
            out_shape,
            element_size,
            match_table,
            write_blocks,
            reported: FxHashSet::default(),
        }
    }

    fn insert(&mut self, read_block: &Block, dry_run: bool) -> Vec<Point> {
        let fs = fblocks::decompose_geometry(read_block, self.out_shape);
        let mut completed = Vec::new();
        for (f_index, maybe_geom) in fs.iter().enumerate() {
            let Some(geom) = maybe_geom else { continue };
            let dest_origin = self.match_table[&(read_block.origin, f_index)];
            let dest = self
                .write_blocks
                .get_mut(&dest_origin)
                .expect("match table referenced an unknown write block");
            if dry_run {
                dest.data.put_dry(geom.volume() * self.element_size);
            } else {
                let piece = read_block.get_data_block(geom);
                dest.put_data_block(&piece);
            }
            if dest.complete() && self.reported.insert(dest_origin) {
                completed.push(dest_origin);
            }
        }
        completed
    }

    fn mem_usage(&self) -> usize {
        self.write_blocks.values().map(|b| b.data.mem_usage()).sum()
    }

    fn block(&self, key: Point) -> &Block {
        &self.write_blocks[&key]
    }

    fn clear(&mut self, key: Point) {
        if let Some(b) = self.write_blocks.get_mut(&key) {
            b.data.clear();
        }
    }
}

/// The degenerate "baseline" cache: every read block is its own write
/// block, already complete on arrival.
#[derive(Default)]
pub struct BaselineCache {
    pending: FxHashMap<Point, Block>,
}

impl BaselineCache {
    fn insert(&mut self, read_block: &Block, dry_run: bool) -> Vec<Point> {
        let mut block = Block::new(read_block.origin, read_block.shape, read_block.element_size);
        if dry_run {
            block.data.put_dry(block.volume() * block.element_size);
        } else {
            block.data = read_block.data.clone();
        }
        let origin = block.origin;
        self.pending.insert(origin, block);
        vec![origin]
    }

    fn mem_usage(&self) -> usize {
        self.pending.values().map(|b| b.data.mem_usage()).sum()
    }

    fn block(&self, key: Point) -> &Block {
        &self.pending[&key]
    }

    fn clear(&mut self, key: Point) {
        self.pending.remove(&key);
    }
}

pub enum Cache {
    Keep(KeepCache),
    Baseline(BaselineCache),
}

impl Cache {
    pub fn insert(&mut self, read_block: &Block, dry_run: bool) -> Vec<Point> {
        match self {
            Cache::Keep(c) => c.insert(read_block, dry_run),
            Cache::Baseline(c) => c.insert(read_block, dry_run),
        }
    }

    pub fn mem_usage(&self) -> usize {
        match self {
            Cache::Keep(c) => c.mem_usage(),
            Cache::Baseline(c) => c.mem_usage(),
        }
    }

    pub fn block(&self, key: Point) -> &Block {
        match self {
            Cache::Keep(c) => c.block(key),
            Cache::Baseline(c) => c.block(key),
        }
    }

    pub fn clear(&mut self, key: Point) {
        match self {
            Cache::Keep(c) => c.clear(key),
            Cache::Baseline(c) => c.clear(key),
        }
    }
}
