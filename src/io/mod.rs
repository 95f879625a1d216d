//! Positional file I/O for [`Block`]s: seek-and-read/write against a
//! block's backing file, plus the in-memory intersection copies
//! (`get_data_block` / `put_data_block`) that the cache and F-block
//! decomposer build on.
//!
//! No buffered streaming across operations: every read or write opens
//! the file, seeks to each run, transfers exactly that run's bytes, and
//! reports back how many seeks it cost. That count is what the seek
//! model in [`crate::seekmodel`] is checked against.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::time::{Duration, Instant};

use crate::error::{KeepartError, Result};
use crate::geometry::{Block, Data};

impl Block {
    /// The bytes of `self` that fall inside `other`, as a freshly built
    /// block shaped like the intersection. Pulls from `self.data`, so
    /// `self` must already hold the relevant bytes in memory.
    pub fn get_data_block(&self, other: &Block) -> Block {
        let inter = self.block_offsets(other);
        if inter.is_empty() {
            return Block::new((0, 0, 0), (0, 0, 0), self.element_size);
        }
        let mut bytes = Vec::with_capacity(inter.shape.0 * inter.shape.1 * inter.shape.2 * self.element_size);
        for (start, end) in &inter.self_runs {
            bytes.extend_from_slice(self.data.get(*start, end + 1));
        }
        let mut block = Block::new(inter.origin, inter.shape, self.element_size);
        block.data = Data::from_bytes(bytes);
        block
    }

    /// Copy `other`'s bytes (assumed contiguous, in canonical row-major
    /// order over its own shape, as produced by [`Block::get_data_block`]
    /// or a fresh read) into `self` at the positions where the two
    /// overlap.
    pub fn put_data_block(&mut self, other: &Block) {
        let inter = self.block_offsets(other);
        if inter.is_empty() {
            return;
        }
        let mut data_offset = 0usize;
        for (start, end) in &inter.self_runs {
            let len = end - start + 1;
            let bytes = other.data.get(data_offset, data_offset + len).to_vec();
            self.data.put(*start, &bytes);
            data_offset += len;
        }
    }

    /// Read the portion of `other`'s backing file that overlaps `self`,
    /// and merge it into `self.data`. Returns `(bytes_read, seeks,
    /// elapsed)`.
    pub fn read_from(&mut self, other: &Block) -> Result<(usize, usize, Duration)> {
        if !self.overlap(other) {
            return Ok((0, 0, Duration::ZERO));
        }
        let path = other
            .file_name
            .as_ref()
            .ok_or_else(|| KeepartError::invariant("read_from: source block has no backing file"))?;
        let inter = other.block_offsets(self);

        let began = Instant::now();
        let mut file = File::open(path).map_err(|e| KeepartError::io(path.clone(), e))?;
        let mut bytes = Vec::with_capacity(inter.shape.0 * inter.shape.1 * inter.shape.2 * self.element_size);
        for (start, end) in &inter.self_runs {
            file.seek(SeekFrom::Start(*start as u64))
                .map_err(|e| KeepartError::io(path.clone(), e))?;
            let len = end - start + 1;
            let mut run = vec![0u8; len];
            file.read_exact(&mut run).map_err(|e| KeepartError::io(path.clone(), e))?;
            bytes.extend_from_slice(&run);
        }
        let elapsed = began.elapsed();

        let seeks = inter.self_runs.len();
        let read_bytes = bytes.len();
        let mut temp = Block::new(inter.origin, inter.shape, self.element_size);
        temp.data = Data::from_bytes(bytes);
        self.put_data_block(&temp);

        Ok((read_bytes, seeks, elapsed))
    }

    /// Write `self`'s bytes at the positions where they overlap `other`,
    /// into `other`'s backing file. Opens the file in create-or-modify
    /// mode so bytes outside the overlap, if the file already exists,
    /// are left untouched. Returns `(bytes_written, seeks, elapsed)`.
    pub fn write_to(&self, other: &Block) -> Result<(usize, usize, Duration)> {
        if !self.overlap(other) {
            return Ok((0, 0, Duration::ZERO));
        }
        let path = other
            .file_name
            .as_ref()
            .ok_or_else(|| KeepartError::invariant("write_to: destination block has no backing file"))?;
        let temp = self.get_data_block(other);
        let inter = other.block_offsets(&temp);

        let began = Instant::now();
        let mut file = open_for_modify(path)?;
        let mut data_offset = 0usize;
        for (start, end) in &inter.self_runs {
            let len = end - start + 1;
            file.seek(SeekFrom::Start(*start as u64))
                .map_err(|e| KeepartError::io(path.clone(), e))?;
            file.write_all(temp.data.get(data_offset, data_offset + len))
                .map_err(|e| KeepartError::io(path.clone(), e))?;
            data_offset += len;
        }
        let elapsed = began.elapsed();

        Ok((data_offset, inter.self_runs.len(), elapsed))
    }

    /// Read this block's entire backing file into `self.data` in a
    /// single pass. Used when a read block exactly matches a disk
    /// block, the degenerate case that costs one seek instead of many.
    pub fn read(&mut self) -> Result<(usize, Duration)> {
        if self.complete() {
            return Ok((0, Duration::ZERO));
        }
        let path = self
            .file_name
            .as_ref()
            .ok_or_else(|| KeepartError::invariant("read: block has no backing file"))?;
        let began = Instant::now();
        let mut file = File::open(path).map_err(|e| KeepartError::io(path.clone(), e))?;
        let mut bytes = Vec::with_capacity(self.byte_len());
        file.read_to_end(&mut bytes).map_err(|e| KeepartError::io(path.clone(), e))?;
        let elapsed = began.elapsed();
        let n = bytes.len();
        self.data = Data::from_bytes(bytes);
        Ok((n, elapsed))
    }

    /// Write this block's entire `self.data` to its backing file in a
    /// single pass, creating or truncating it. `self` must be complete.
    pub fn write(&self) -> Result<(usize, Duration)> {
        if !self.complete() {
            return Err(KeepartError::invariant("write: block is not fully populated"));
        }
        let path = self
            .file_name
            .as_ref()
            .ok_or_else(|| KeepartError::invariant("write: block has no backing file"))?;
        let began = Instant::now();
        let mut file = File::create(path).map_err(|e| KeepartError::io(path.clone(), e))?;
        let bytes = self.data.get(0, self.byte_len());
        file.write_all(bytes).map_err(|e| KeepartError::io(path.clone(), e))?;
        let elapsed = began.elapsed();
        Ok((bytes.len(), elapsed))
    }
}

fn open_for_modify(path: &std::path::Path) -> Result<File> {
    if path.exists() {
        OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| KeepartError::io(path.to_path_buf(), e))
    } else {
        OpenOptions::new()
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| KeepartError::io(path.to_path_buf(), e))
    }
}
