use std::path::PathBuf;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::deserialize::ProtocolFault;

/// The parser module rejected the source text.
///
/// This is the expected failure for invalid input. `line` is 1-based and
/// `column` is 0-based, counted in characters.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("{message} ({line}:{column})")]
#[diagnostic(code(tessera::syntax_error))]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
    pub column: u32,
    #[label("{message}")]
    pub span: Option<SourceSpan>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            span: None,
        }
    }

    /// Attach a byte span pointing at the reported position in `source`, so
    /// diagnostics can underline it. Positions past the end of the source
    /// point at its end.
    pub fn locate(mut self, source: &str) -> Self {
        let line_start = source
            .split_inclusive('\n')
            .take(self.line.saturating_sub(1) as usize)
            .map(str::len)
            .sum::<usize>();
        let line_text = source[line_start..].split('\n').next().unwrap_or("");
        let mut chars = line_text.char_indices().skip(self.column as usize);
        let span = match chars.next() {
            Some((offset, ch)) => SourceSpan::new((line_start + offset).into(), ch.len_utf8()),
            None => SourceSpan::new((line_start + line_text.len()).into(), 0),
        };
        self.span = Some(span);
        self
    }
}

/// A call into the parser module failed, or the module could not be loaded.
#[derive(Debug, Error, Diagnostic)]
pub enum NativeError {
    #[error("parser module call `{export}` failed: {cause}")]
    #[diagnostic(code(tessera::native::call))]
    Call { export: &'static str, cause: String },

    #[error("parser module returned a null result handle")]
    #[diagnostic(code(tessera::native::null_handle))]
    NullHandle,

    #[error("parser module does not export `{name}`: {cause}")]
    #[diagnostic(
        code(tessera::native::missing_export),
        help("check the [exports] table of the configuration against the module build")
    )]
    MissingExport { name: String, cause: String },

    #[error("failed to compile parser module `{module}`: {cause}")]
    #[diagnostic(code(tessera::native::compile))]
    Compile { module: String, cause: String },

    #[error("failed to instantiate parser module: {cause}")]
    #[diagnostic(code(tessera::native::instantiate))]
    Instantiate { cause: String },

    #[error("failed to read parser module {path}")]
    #[diagnostic(code(tessera::native::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type NativeResult<T> = Result<T, NativeError>;

/// Everything a call to [`parse`](crate::parse) can fail with.
///
/// The categories stay distinct: a [`SyntaxError`] blames the input, every
/// other variant blames the parser module or this bridge.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("parser out of memory: could not allocate {requested} bytes for the source text")]
    #[diagnostic(code(tessera::out_of_memory))]
    OutOfMemory { requested: u64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Protocol(#[from] ProtocolFault),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Native(#[from] NativeError),
}

impl ParseError {
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, ParseError::Syntax(_))
    }

    pub fn is_protocol_fault(&self) -> bool {
        matches!(self, ParseError::Protocol(_))
    }

    pub fn as_syntax_error(&self) -> Option<&SyntaxError> {
        match self {
            ParseError::Syntax(error) => Some(error),
            _ => None,
        }
    }
}
