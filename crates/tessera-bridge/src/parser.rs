use tessera_ast::Program;

use crate::arena::SourceBuffer;
use crate::bridge::bridge;
use crate::error::ParseError;
use crate::invoke::invoke;
use crate::module::ParserModule;
use crate::options::ParserOptions;

/// Parse `source` with `module`.
///
/// Copies the source into the module heap, calls the parser, and decodes
/// the result into an owned [`Program`]. Every native resource acquired on
/// the way is released before this returns, on success and on every error
/// path, in reverse order of acquisition.
///
/// A rejected source yields [`ParseError::Syntax`] with a span pointing into
/// `source`.
pub fn parse<M: ParserModule>(
    module: &mut M,
    source: &str,
    options: &ParserOptions,
) -> Result<Program, ParseError> {
    let mut source_buffer = SourceBuffer::copy_in(module, source)?;
    let outcome = invoke(&mut source_buffer, options).and_then(|handle| bridge(handle, options));
    drop(source_buffer);

    match outcome {
        Ok(program) => {
            log::debug!("parsed {} bytes into {} nodes", source.len(), program.node_count());
            Ok(program)
        }
        Err(ParseError::Syntax(error)) => Err(ParseError::Syntax(error.locate(source))),
        Err(err) => Err(err),
    }
}

/// A parser bound to one module instance.
///
/// The instance is supplied by the caller, so separate parsers never share
/// state. Calls take `&mut self` and therefore cannot overlap; see
/// [`SharedParser`](crate::SharedParser) for use across threads.
pub struct Parser<M: ParserModule> {
    module: M,
}

impl<M: ParserModule> Parser<M> {
    pub fn new(module: M) -> Self {
        Self { module }
    }

    pub fn parse(&mut self, source: &str, options: &ParserOptions) -> Result<Program, ParseError> {
        parse(&mut self.module, source, options)
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    pub fn into_module(self) -> M {
        self.module
    }
}
