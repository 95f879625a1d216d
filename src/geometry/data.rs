/// The byte buffer backing a [`super::Block`].
///
/// Conceptually a grow-only buffer: callers record fragments with
/// [`Data::put`] and the buffer reports how many bytes have been recorded
/// via [`Data::mem_usage`]. Physically this allocates the full
/// shape-product upfront and tracks occupancy separately, rather than
/// keeping a list of (offset, bytes) fragments merged lazily on read —
/// the two are observationally equivalent as long as no two `put` calls
/// overlap, which the geometry kernel guarantees.
#[derive(Clone)]
pub struct Data {
    capacity: usize,
    buf: Vec<u8>,
    mem_size: usize,
}

impl Data {
    pub fn new(capacity: usize) -> Self {
        Data {
            capacity,
            buf: Vec::new(),
            mem_size: 0,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let capacity = bytes.len();
        Data {
            capacity,
            mem_size: capacity,
            buf: bytes,
        }
    }

    fn ensure_allocated(&mut self) {
        if self.buf.is_empty() && self.capacity > 0 {
            self.buf = vec![0u8; self.capacity];
        }
    }

    /// Record `bytes` as belonging at `offset`. Panics if the range falls
    /// outside the buffer's capacity; callers never do this by construction.
    pub fn put(&mut self, offset: usize, bytes: &[u8]) {
        self.ensure_allocated();
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.mem_size += bytes.len();
    }

    /// Return the bytes `[start, end)`. Only meaningful once every byte in
    /// that range has been `put`.
    pub fn get(&self, start: usize, end: usize) -> &[u8] {
        &self.buf[start..end]
    }

    pub fn clear(&mut self) {
        self.buf = Vec::new();
        self.mem_size = 0;
    }

    pub fn mem_usage(&self) -> usize {
        self.mem_size
    }

    /// Record `len` bytes as belonging somewhere in the buffer without
    /// actually copying or allocating them. Used by the planner's dry-run
    /// memory estimation (see `scheduler`), which needs accurate byte
    /// counts but must never materialize real data for an array that may
    /// be far larger than the process's own memory.
    pub fn put_dry(&mut self, len: usize) {
        self.mem_size += len;
    }

    pub fn is_complete(&self) -> bool {
        self.mem_size == self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let mut d = Data::new(8);
        d.put(0, &[1, 2, 3]);
        d.put(3, &[4, 5, 6, 7, 8]);
        assert_eq!(d.mem_usage(), 8);
        assert!(d.is_complete());
        assert_eq!(d.get(0, 8), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn clear_resets_usage() {
        let mut d = Data::new(4);
        d.put(0, &[1, 2, 3, 4]);
        assert!(d.is_complete());
        d.clear();
        assert_eq!(d.mem_usage(), 0);
        assert!(!d.is_complete());
    }
}
