use miette::Diagnostic;
use thiserror::Error;

/// Errors raised when a read would leave the heap or break its layout rules.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum HeapError {
    #[error("read of {len} bytes at {addr:#x} is outside the {heap_len}-byte heap")]
    #[diagnostic(code(tessera::heap::out_of_bounds))]
    OutOfBounds { addr: u32, len: usize, heap_len: usize },

    #[error("{what} at {addr:#x} is not {align}-byte aligned")]
    #[diagnostic(code(tessera::heap::misaligned))]
    Misaligned {
        what: &'static str,
        addr: u32,
        align: u32,
    },

    #[error("string at {addr:#x} has no terminating NUL before the end of the heap")]
    #[diagnostic(code(tessera::heap::unterminated))]
    Unterminated { addr: u32 },
}

pub type HeapResult<T> = Result<T, HeapError>;
