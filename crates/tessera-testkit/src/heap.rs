use rustc_hash::{FxHashMap, FxHashSet};

/// First address handed out. Everything below stays zero so that 0 is
/// never a valid pointer.
pub const HEAP_BASE: u32 = 16;

/// Default allocation limit, 16 MiB.
pub const DEFAULT_HEAP_LIMIT: usize = 16 << 20;

const ALIGN: u32 = 8;

/// Byte written over freed blocks so stale reads stand out.
const POISON: u8 = 0xdd;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocStats {
    pub allocations: usize,
    pub frees: usize,
    pub double_frees: usize,
    pub invalid_frees: usize,
    pub failed_allocations: usize,
}

/// A growable byte heap with a bump allocator that tracks every block.
///
/// Blocks are 8-byte aligned and never reused, so a double free or a read
/// after free is always detectable. The backing vector is reallocated as
/// the heap grows, the way linear memory moves when a module grows it.
#[derive(Debug)]
pub struct MockHeap {
    bytes: Vec<u8>,
    next: u32,
    limit: usize,
    live: FxHashMap<u32, u32>,
    freed: FxHashSet<u32>,
    stats: AllocStats,
}

impl MockHeap {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HEAP_LIMIT)
    }

    /// A heap that refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            bytes: vec![0; HEAP_BASE as usize],
            next: HEAP_BASE,
            limit,
            live: FxHashMap::default(),
            freed: FxHashSet::default(),
            stats: AllocStats::default(),
        }
    }

    /// Allocate `size` bytes, or return 0 if the limit would be exceeded.
    pub fn malloc(&mut self, size: u32) -> u32 {
        let size = size.max(1);
        let start = self.next;
        let end = match start.checked_add(size) {
            Some(end) if end as usize <= self.limit => end,
            _ => {
                log::debug!("mock heap refused {size} bytes ({} in use)", self.next);
                self.stats.failed_allocations += 1;
                return 0;
            }
        };
        if self.bytes.len() < end as usize {
            self.bytes.resize(end as usize, 0);
        }
        self.next = end.checked_next_multiple_of(ALIGN).unwrap_or(u32::MAX);
        self.live.insert(start, size);
        self.stats.allocations += 1;
        start
    }

    /// Free a block. Freeing 0 is a no-op; anything else that is not a live
    /// block is counted as a double or invalid free.
    pub fn free(&mut self, ptr: u32) {
        if ptr == 0 {
            return;
        }
        match self.live.remove(&ptr) {
            Some(size) => {
                let start = ptr as usize;
                self.bytes[start..start + size as usize].fill(POISON);
                self.freed.insert(ptr);
                self.stats.frees += 1;
            }
            None if self.freed.contains(&ptr) => {
                log::warn!("double free of {ptr:#x}");
                self.stats.double_frees += 1;
            }
            None => {
                log::warn!("free of unallocated address {ptr:#x}");
                self.stats.invalid_frees += 1;
            }
        }
    }

    /// Copy `data` into a live block at `ptr`.
    pub fn write(&mut self, ptr: u32, data: &[u8]) {
        let start = ptr as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
    }

    pub fn write_u32(&mut self, addr: u32, value: u32) {
        self.write(addr, &value.to_le_bytes());
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_live(&self, ptr: u32) -> bool {
        self.live.contains_key(&ptr)
    }

    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    pub fn stats(&self) -> AllocStats {
        self.stats
    }
}

impl Default for MockHeap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_aligned_and_nonzero() {
        let mut heap = MockHeap::new();
        let a = heap.malloc(3);
        let b = heap.malloc(0);
        let c = heap.malloc(9);
        assert_eq!(a, HEAP_BASE);
        for ptr in [a, b, c] {
            assert_ne!(ptr, 0);
            assert_eq!(ptr % 8, 0);
        }
        assert!(b > a && c > b);
        assert_eq!(heap.live_allocations(), 3);
    }

    #[test]
    fn frees_are_tracked() {
        let mut heap = MockHeap::new();
        let ptr = heap.malloc(4);
        heap.write(ptr, b"abcd");
        heap.free(ptr);
        heap.free(ptr);
        heap.free(12345);
        heap.free(0);

        let stats = heap.stats();
        assert_eq!(stats.frees, 1);
        assert_eq!(stats.double_frees, 1);
        assert_eq!(stats.invalid_frees, 1);
        assert_eq!(heap.live_allocations(), 0);
        assert_eq!(&heap.bytes()[ptr as usize..ptr as usize + 4], &[POISON; 4]);
    }

    #[test]
    fn limit_turns_into_null() {
        let mut heap = MockHeap::with_limit(64);
        assert_ne!(heap.malloc(32), 0);
        assert_eq!(heap.malloc(32), 0);
        assert_eq!(heap.stats().failed_allocations, 1);
    }
}
