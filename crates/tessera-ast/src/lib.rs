//! Owned ESTree syntax tree.
//!
//! These are the host-side structures a parse result is copied into. They
//! hold no references into parser module memory, so a [`Program`] stays
//! valid after the module instance that produced it is gone.

pub mod kind;
pub mod location;
pub mod node;
pub mod program;
pub mod serialize;
pub mod visitor;

pub use kind::{FieldKind, FieldSchema, NodeKind, NodeSchema, NODE_SCHEMAS, SCHEMA_VERSION};
pub use location::{Position, SourceLocation};
pub use node::{Field, Node, Value};
pub use program::{Comment, CommentKind, Program, Token, TokenKind};
pub use visitor::Visitor;
