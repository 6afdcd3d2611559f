use miette::Diagnostic;
use thiserror::Error;
use tessera_heap::HeapError;

/// The module's output does not follow the program-buffer schema.
///
/// A fault means the bridge and the parser module disagree about the wire
/// format (or the module is broken). It never means the source was invalid
/// and must not be reported to users as a syntax error.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum ProtocolFault {
    #[error("protocol fault: {0}")]
    #[diagnostic(
        code(tessera::protocol::heap),
        help(
            "the parser module output does not match this bridge's schema; \
             this is not a problem with the source"
        )
    )]
    Heap(#[from] HeapError),

    #[error("protocol fault: unknown node tag {tag} at {addr:#x}")]
    #[diagnostic(
        code(tessera::protocol::unknown_tag),
        help("the parser module was built against a different node schema")
    )]
    UnknownNodeTag { tag: u32, addr: u32 },

    #[error("protocol fault: root node is {found}, expected Program")]
    #[diagnostic(code(tessera::protocol::unexpected_root))]
    UnexpectedRoot { found: String },

    #[error("protocol fault: location index {index} is outside the {count}-entry position buffer")]
    #[diagnostic(code(tessera::protocol::position_out_of_bounds))]
    PositionOutOfBounds { index: u32, count: u32 },

    #[error(
        "protocol fault: position record {index} is invalid \
         ({start_line}:{start_column} to {end_line}:{end_column})"
    )]
    #[diagnostic(code(tessera::protocol::invalid_position))]
    InvalidPosition {
        index: u32,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    },

    #[error("protocol fault: boolean at {addr:#x} holds {value}")]
    #[diagnostic(code(tessera::protocol::invalid_boolean))]
    InvalidBoolean { addr: u32, value: u32 },

    #[error("protocol fault: unknown comment kind {code} at {addr:#x}")]
    #[diagnostic(code(tessera::protocol::unknown_comment_kind))]
    UnknownCommentKind { code: u32, addr: u32 },

    #[error("protocol fault: unknown token kind {code} at {addr:#x}")]
    #[diagnostic(code(tessera::protocol::unknown_token_kind))]
    UnknownTokenKind { code: u32, addr: u32 },

    #[error(
        "protocol fault: list at {addr:#x} claims {count} entries \
         but only {remaining} words remain"
    )]
    #[diagnostic(code(tessera::protocol::list_too_long))]
    ListTooLong { addr: u32, count: u32, remaining: usize },

    #[error("protocol fault: `{kind}.{field}` holds an absent node where one is required")]
    #[diagnostic(code(tessera::protocol::unexpected_null))]
    UnexpectedNull {
        kind: &'static str,
        field: &'static str,
    },

    #[error("protocol fault: tree is nested deeper than {limit} nodes")]
    #[diagnostic(code(tessera::protocol::nesting_too_deep))]
    NestingTooDeep { limit: usize },
}
