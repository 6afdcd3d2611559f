//! A small reference JavaScript parser.
//!
//! It understands enough of the language to drive the bridge end to end:
//! variable and function declarations, `return`, `if`, `while`, blocks,
//! assignments, conditional, logical and binary operators with the usual
//! precedence, unary operators, calls, member access, array literals,
//! primitive literals and comments. Locations are real, with 1-based lines
//! and 0-based character columns.

mod lexer;
mod parser;

use tessera_ast::{Field, Node, NodeKind, Program, SourceLocation, Token, Value};
use tessera_bridge::NativeFlags;
use thiserror::Error;

use lexer::{Lexer, LineIndex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub tokens: bool,
    pub allow_return_outside_function: bool,
}

impl EngineOptions {
    pub fn from_flags(flags: NativeFlags) -> Self {
        Self {
            tokens: flags.is_set(NativeFlags::TOKENS),
            allow_return_outside_function: flags
                .is_set(NativeFlags::ALLOW_RETURN_OUTSIDE_FUNCTION),
        }
    }
}

/// A rejected source, positioned at the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({line}:{column})")]
pub struct EngineError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl EngineError {
    pub fn new(message: String, line: u32, column: u32) -> Self {
        Self { message, line, column }
    }
}

pub fn parse(source: &str, options: &EngineOptions) -> Result<Program, EngineError> {
    let lines = LineIndex::new(source);
    let (tokens, comments) = Lexer::new(source, &lines).tokenize()?;
    let token_list = options.tokens.then(|| {
        tokens
            .iter()
            .filter_map(|tok| {
                Some(Token {
                    kind: tok.ty.token_kind()?,
                    value: tok.raw.clone(),
                    loc: lines.location(tok.start, tok.end),
                })
            })
            .collect()
    });

    let body = parser::Parser::new(tokens, &lines, options).program()?;
    Ok(Program {
        loc: lines.location(0, source.len()),
        body,
        comments,
        tokens: token_list,
    })
}

/// Build a node with every schema field of `kind` in schema order. Fields
/// not given take their empty value.
pub(crate) fn build(
    kind: NodeKind,
    loc: SourceLocation,
    mut values: Vec<(&'static str, Value)>,
) -> Node {
    let fields = kind
        .fields()
        .iter()
        .map(|schema| {
            let value = match values.iter().position(|(name, _)| *name == schema.name) {
                Some(index) => values.swap_remove(index).1,
                None => empty_value(schema.kind),
            };
            Field {
                name: schema.name,
                value,
            }
        })
        .collect();
    debug_assert!(values.is_empty(), "{kind} has no field named {:?}", values.first().map(|v| v.0));
    Node::new(kind, loc, fields)
}

fn empty_value(kind: tessera_ast::FieldKind) -> Value {
    use tessera_ast::FieldKind;
    match kind {
        FieldKind::Node => Value::Node(None),
        FieldKind::NodeList => Value::NodeList(Vec::new()),
        FieldKind::String => Value::String(None),
        FieldKind::Number => Value::Number(0.0),
        FieldKind::Boolean => Value::Boolean(false),
    }
}
