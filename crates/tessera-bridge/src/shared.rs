use parking_lot::Mutex;
use tessera_ast::Program;

use crate::error::ParseError;
use crate::module::ParserModule;
use crate::options::ParserOptions;
use crate::parser::parse;

/// A module instance shared between threads.
///
/// The instance is not reentrant. Each [`SharedParser::parse`] holds the lock
/// from the source allocation until the last release, so calls from
/// different threads are serialized and never interleave on the heap.
pub struct SharedParser<M: ParserModule> {
    module: Mutex<M>,
}

impl<M: ParserModule> SharedParser<M> {
    pub fn new(module: M) -> Self {
        Self {
            module: Mutex::new(module),
        }
    }

    pub fn parse(&self, source: &str, options: &ParserOptions) -> Result<Program, ParseError> {
        let mut module = self.module.lock();
        parse(&mut *module, source, options)
    }

    /// Run `f` with exclusive access to the module, e.g. to inspect it
    /// between parses.
    pub fn with_module<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.module.lock())
    }

    pub fn into_inner(self) -> M {
        self.module.into_inner()
    }
}
