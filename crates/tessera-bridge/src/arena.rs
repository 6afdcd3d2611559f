use tessera_heap::HeapError;

use crate::deserialize::ProtocolFault;
use crate::error::ParseError;
use crate::module::ParserModule;

/// Source text copied into the module heap, NUL-terminated.
///
/// The allocation is owned by this guard and freed exactly once when it
/// drops, whichever way the surrounding call exits. Anything that needs the
/// module while the source is live goes through [`SourceBuffer::module`], so
/// every borrow derived from the buffer ends before the buffer is freed.
pub struct SourceBuffer<'m, M: ParserModule> {
    module: &'m mut M,
    ptr: u32,
    len: u32,
}

impl<'m, M: ParserModule> SourceBuffer<'m, M> {
    /// Allocate `source.len() + 1` bytes in the module heap and copy the
    /// source in, followed by a NUL byte.
    ///
    /// Fails with [`ParseError::OutOfMemory`] if the module cannot satisfy
    /// the request; nothing else is called on the module in that case.
    pub fn copy_in(module: &'m mut M, source: &str) -> Result<Self, ParseError> {
        let bytes = source.as_bytes();
        let requested = bytes.len() as u64 + 1;
        let len = u32::try_from(requested).map_err(|_| ParseError::OutOfMemory { requested })?;

        let ptr = module.malloc(len)?;
        if ptr == 0 {
            log::debug!("source allocation of {len} bytes failed");
            return Err(ParseError::OutOfMemory { requested });
        }
        log::debug!("allocated {len} bytes for source text at {ptr:#x}");
        let buffer = Self { module, ptr, len };

        let heap = buffer.module.heap_mut();
        let heap_len = heap.len();
        let dest = heap
            .get_mut(ptr as usize..ptr as usize + len as usize)
            .ok_or(ProtocolFault::Heap(HeapError::OutOfBounds {
                addr: ptr,
                len: len as usize,
                heap_len,
            }))?;
        dest[..bytes.len()].copy_from_slice(bytes);
        dest[bytes.len()] = 0;
        Ok(buffer)
    }

    /// Heap address of the first source byte.
    pub fn ptr(&self) -> u32 {
        self.ptr
    }

    /// Length in bytes, including the terminator.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len <= 1
    }

    pub fn module(&mut self) -> &mut M {
        &mut *self.module
    }
}

impl<M: ParserModule> Drop for SourceBuffer<'_, M> {
    fn drop(&mut self) {
        log::debug!("freeing source text at {:#x}", self.ptr);
        if let Err(err) = self.module.free(self.ptr) {
            log::error!("failed to free source text at {:#x}: {err}", self.ptr);
        }
    }
}
