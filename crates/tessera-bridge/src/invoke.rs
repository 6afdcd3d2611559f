use crate::arena::SourceBuffer;
use crate::error::ParseError;
use crate::handle::ResultHandle;
use crate::module::ParserModule;
use crate::options::ParserOptions;

/// Call the native `parse` entry point on source text already in the heap.
///
/// The returned handle borrows `source`, so it is always released before the
/// source allocation is, whatever path the caller takes out.
pub fn invoke<'b, M: ParserModule>(
    source: &'b mut SourceBuffer<'_, M>,
    options: &ParserOptions,
) -> Result<ResultHandle<'b, M>, ParseError> {
    let (ptr, len) = (source.ptr(), source.len());
    let flags = options.native_flags();
    log::debug!("invoking parse on {len} bytes at {ptr:#x} with flags {:?}", flags.words());

    let module = source.module();
    let raw = module.parse(ptr, len, flags)?;
    let handle = ResultHandle::new(module, raw)?;
    log::debug!("parse returned result handle {raw:#x}");
    Ok(handle)
}
