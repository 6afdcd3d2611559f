use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use tessera_bridge::{NativeError, ParseError, SyntaxError};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Failed to read {path}")]
    #[diagnostic(code(tessera::cli::io_error))]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {message}")]
    #[diagnostic(code(tessera::cli::config_error))]
    ConfigError {
        path: PathBuf,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: Option<SourceSpan>,
    },

    #[error("No parser module configured")]
    #[diagnostic(
        code(tessera::cli::no_module),
        help("pass --module <PATH> or set `module` in tessera.toml")
    )]
    NoModule,

    #[error("{message}")]
    #[diagnostic(code(tessera::syntax_error))]
    SyntaxError {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Native(#[from] NativeError),

    #[error("Failed to serialize the tree")]
    #[diagnostic(code(tessera::cli::json_error))]
    Json(#[from] serde_json::Error),

    #[error("{failed} of {total} files failed to parse")]
    #[diagnostic(code(tessera::cli::check_failed))]
    CheckFailed { failed: usize, total: usize },
}

/// Attach the source text to a parse failure so syntax errors render with
/// the offending line.
pub fn convert_parse_error(error: ParseError, name: &str, source: &str) -> CliError {
    match error {
        ParseError::Syntax(SyntaxError { message, line, column, span }) => CliError::SyntaxError {
            message: format!("{message} ({name}:{line}:{column})"),
            src: NamedSource::new(name, source.to_string()),
            span,
        },
        other => CliError::Parse(other),
    }
}

pub fn convert_io_error(error: std::io::Error, path: PathBuf) -> CliError {
    CliError::IoError { path, source: error }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_carry_their_source() {
        let error = SyntaxError::new("unexpected token ';'", 1, 10).locate("const x = ;");
        let cli = convert_parse_error(ParseError::Syntax(error), "input.js", "const x = ;");
        match cli {
            CliError::SyntaxError { message, span, .. } => {
                assert_eq!(message, "unexpected token ';' (input.js:1:10)");
                assert_eq!(span, Some(SourceSpan::new(10usize.into(), 1)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn other_failures_pass_through() {
        let cli = convert_parse_error(ParseError::OutOfMemory { requested: 3 }, "input.js", "ab");
        assert!(matches!(cli, CliError::Parse(ParseError::OutOfMemory { requested: 3 })));
    }
}
