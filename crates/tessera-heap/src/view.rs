use crate::error::{HeapError, HeapResult};

/// Read-only window over a parser module's linear memory.
///
/// Every pointer the module hands out is a byte offset into this region.
/// All reads are checked against the extent captured at construction; the
/// view never reads past it, whatever the offset arithmetic produces.
///
/// The view borrows the memory, so it cannot outlive whatever owns the
/// module instance (or the result handle it was derived from).
#[derive(Debug, Clone, Copy)]
pub struct HeapView<'h> {
    bytes: &'h [u8],
}

impl<'h> HeapView<'h> {
    pub fn new(bytes: &'h [u8]) -> Self {
        Self { bytes }
    }

    /// Size of the heap in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow `len` bytes starting at `addr`.
    pub fn bytes(&self, addr: u32, len: usize) -> HeapResult<&'h [u8]> {
        let start = addr as usize;
        start
            .checked_add(len)
            .and_then(|end| self.bytes.get(start..end))
            .ok_or(HeapError::OutOfBounds {
                addr,
                len,
                heap_len: self.bytes.len(),
            })
    }

    /// Read a little-endian `u32` at `addr`.
    pub fn read_u32(&self, addr: u32) -> HeapResult<u32> {
        let raw = self.bytes(addr, 4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// Read a little-endian IEEE-754 double at `addr`.
    pub fn read_f64(&self, addr: u32) -> HeapResult<f64> {
        let raw = self.bytes(addr, 8)?;
        let mut word = [0u8; 8];
        word.copy_from_slice(raw);
        Ok(f64::from_le_bytes(word))
    }

    /// Read `N` consecutive little-endian `u32` words starting at `addr`.
    pub fn read_words<const N: usize>(&self, addr: u32) -> HeapResult<[u32; N]> {
        let raw = self.bytes(addr, N * 4)?;
        let mut words = [0u32; N];
        for (word, chunk) in words.iter_mut().zip(raw.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(words)
    }

    /// Borrow the bytes of a NUL-terminated string, excluding the terminator.
    pub fn c_str(&self, addr: u32) -> HeapResult<&'h [u8]> {
        let tail = self.bytes.get(addr as usize..).ok_or(HeapError::OutOfBounds {
            addr,
            len: 1,
            heap_len: self.bytes.len(),
        })?;
        let nul = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(HeapError::Unterminated { addr })?;
        Ok(&tail[..nul])
    }

    /// Number of whole words between `addr` and the end of the heap.
    pub fn words_after(&self, addr: u32) -> usize {
        self.bytes.len().saturating_sub(addr as usize) / 4
    }

    /// Reject `addr` unless it is a multiple of `align`.
    pub fn check_aligned(&self, what: &'static str, addr: u32, align: u32) -> HeapResult<()> {
        if addr % align == 0 {
            Ok(())
        } else {
            Err(HeapError::Misaligned { what, addr, align })
        }
    }

    /// Start a sequential word reader at `addr`.
    pub fn cursor(&self, addr: u32) -> WordCursor<'h> {
        WordCursor { heap: *self, addr }
    }
}

/// Sequential reader over a word-oriented buffer inside a [`HeapView`].
#[derive(Debug, Clone)]
pub struct WordCursor<'h> {
    heap: HeapView<'h>,
    addr: u32,
}

impl<'h> WordCursor<'h> {
    /// Address of the next unread byte.
    pub fn addr(&self) -> u32 {
        self.addr
    }

    pub fn heap(&self) -> HeapView<'h> {
        self.heap
    }

    /// Words left between the cursor and the end of the heap.
    pub fn words_remaining(&self) -> usize {
        self.heap.words_after(self.addr)
    }

    pub fn next_u32(&mut self) -> HeapResult<u32> {
        let word = self.heap.read_u32(self.addr)?;
        self.advance(4)?;
        Ok(word)
    }

    /// Read a double, skipping one padding word first if the cursor is not
    /// 8-byte aligned.
    pub fn next_f64(&mut self) -> HeapResult<f64> {
        if self.addr % 8 != 0 {
            self.advance(4)?;
        }
        let value = self.heap.read_f64(self.addr)?;
        self.advance(8)?;
        Ok(value)
    }

    fn advance(&mut self, by: u32) -> HeapResult<()> {
        self.addr = self.addr.checked_add(by).ok_or(HeapError::OutOfBounds {
            addr: self.addr,
            len: by as usize,
            heap_len: self.heap.len(),
        })?;
        Ok(())
    }
}
