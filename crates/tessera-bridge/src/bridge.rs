use tessera_ast::Program;

use crate::error::ParseError;
use crate::handle::ResultHandle;
use crate::module::ParserModule;
use crate::options::ParserOptions;

/// Turn a result handle into a tree or a syntax error, releasing the handle
/// before returning either.
///
/// The handle is consumed. If decoding fails, the failure is captured, the
/// handle released, and the failure returned. If decoding panics, the handle
/// is released while unwinding.
pub fn bridge<M: ParserModule>(
    mut handle: ResultHandle<'_, M>,
    options: &ParserOptions,
) -> Result<Program, ParseError> {
    let outcome = extract(&mut handle, options);
    let raw = handle.raw();
    let released = handle.release();

    match (outcome, released) {
        (Ok(program), Ok(())) => Ok(program),
        (Ok(_), Err(err)) => Err(err.into()),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(release_err)) => {
            log::error!("failed to release result handle {raw:#x} after error: {release_err}");
            Err(err)
        }
    }
}

fn extract<M: ParserModule>(
    handle: &mut ResultHandle<'_, M>,
    options: &ParserOptions,
) -> Result<Program, ParseError> {
    if let Some(error) = handle.syntax_error()? {
        log::debug!("parse failed: {error}");
        return Err(error.into());
    }
    handle.deserialize(options)
}
