//! Safe bridge to a native JavaScript parser module.
//!
//! The parser lives in a module with its own linear memory and a C-like
//! ABI ([`ParserModule`]). This crate owns every resource that crosses that
//! boundary:
//!
//! * [`SourceBuffer`] copies source text into the module heap and frees it
//!   when dropped.
//! * [`invoke`] calls the parser and wraps the raw result in a
//!   [`ResultHandle`], which is released exactly once.
//! * [`bridge`] turns a handle into a [`SyntaxError`] or an owned
//!   [`Program`](tessera_ast::Program), releasing the handle either way.
//! * [`deserialize`](mod@deserialize) decodes the program and position
//!   buffers through a bounds-checked heap view.
//!
//! Most callers only need [`parse`], [`Parser`] or [`SharedParser`].

pub mod arena;
pub mod bridge;
pub mod deserialize;
pub mod error;
pub mod handle;
pub mod invoke;
pub mod module;
pub mod options;
pub mod parser;
pub mod shared;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use arena::SourceBuffer;
pub use bridge::bridge;
pub use deserialize::{ProtocolFault, ResultBuffers, MAX_NESTING_DEPTH};
pub use error::{NativeError, NativeResult, ParseError, SyntaxError};
pub use handle::ResultHandle;
pub use invoke::invoke;
pub use module::{NativeFlags, ParserModule, NATIVE_FLAG_COUNT};
pub use options::{FlowMode, ParserOptions};
pub use parser::{parse, Parser};
pub use shared::SharedParser;
