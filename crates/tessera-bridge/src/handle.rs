use tessera_ast::Program;
use tessera_heap::HeapView;

use crate::deserialize::{self, ResultBuffers};
use crate::error::{NativeError, NativeResult, ParseError, SyntaxError};
use crate::module::ParserModule;
use crate::options::ParserOptions;

/// Owned result handle returned by the native `parse` call.
///
/// The handle cannot be copied or cloned. It is released exactly once:
/// either explicitly through [`ResultHandle::release`], which consumes it,
/// or when it drops. Heap views derived from it borrow the handle, so no
/// buffer read can happen after release.
pub struct ResultHandle<'m, M: ParserModule> {
    module: &'m mut M,
    raw: u32,
    released: bool,
}

impl<'m, M: ParserModule> ResultHandle<'m, M> {
    /// Take ownership of a raw handle. A null handle is rejected and needs no
    /// release.
    pub fn new(module: &'m mut M, raw: u32) -> NativeResult<Self> {
        if raw == 0 {
            return Err(NativeError::NullHandle);
        }
        Ok(Self {
            module,
            raw,
            released: false,
        })
    }

    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// The module heap as it is now.
    pub fn heap(&self) -> HeapView<'_> {
        HeapView::new(self.module.heap())
    }

    /// The syntax error this result carries, if any. An empty message counts
    /// as success.
    pub fn syntax_error(&mut self) -> Result<Option<SyntaxError>, ParseError> {
        let message_ptr = self.module.result_error(self.raw)?;
        if message_ptr == 0 {
            return Ok(None);
        }
        let message = {
            let bytes = self.heap().c_str(message_ptr).map_err(deserialize::ProtocolFault::from)?;
            String::from_utf8_lossy(bytes).into_owned()
        };
        if message.is_empty() {
            return Ok(None);
        }
        let line = self.module.result_error_line(self.raw)?;
        let column = self.module.result_error_column(self.raw)?;
        Ok(Some(SyntaxError::new(message, line, column)))
    }

    /// Fetch the three output-buffer values while the handle is live.
    pub fn buffers(&mut self) -> NativeResult<ResultBuffers> {
        Ok(ResultBuffers {
            program: self.module.result_program_buffer(self.raw)?,
            positions: self.module.result_position_buffer(self.raw)?,
            position_count: self.module.result_position_buffer_size(self.raw)?,
        })
    }

    /// Decode the result into an owned tree. Can be called any number of
    /// times before release; each call decodes from scratch.
    pub fn deserialize(&mut self, options: &ParserOptions) -> Result<Program, ParseError> {
        let buffers = self.buffers()?;
        let program = deserialize::deserialize(buffers, self.heap(), options)?;
        Ok(program)
    }

    /// Release the native result. Consumes the handle.
    pub fn release(mut self) -> NativeResult<()> {
        self.release_once()
    }

    fn release_once(&mut self) -> NativeResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        log::debug!("releasing result handle {:#x}", self.raw);
        self.module.result_free(self.raw)
    }
}

impl<M: ParserModule> Drop for ResultHandle<'_, M> {
    fn drop(&mut self) {
        if let Err(err) = self.release_once() {
            log::error!("failed to release result handle {:#x}: {err}", self.raw);
        }
    }
}
