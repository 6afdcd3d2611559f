//! Test support for tessera.
//!
//! [`MockModule`] implements [`ParserModule`](tessera_bridge::ParserModule)
//! entirely in memory: a tracked heap, a handle table for results and a
//! small reference JavaScript parser whose trees are encoded into real
//! program and position buffers. [`Fault`] makes it misbehave in the ways a
//! real module can.

pub mod encode;
pub mod engine;
pub mod handles;
pub mod heap;
pub mod mock;

pub use encode::{encode, EncodedProgram, Marks};
pub use engine::{EngineError, EngineOptions};
pub use handles::HandleTable;
pub use heap::{AllocStats, MockHeap, DEFAULT_HEAP_LIMIT, HEAP_BASE};
pub use mock::{Fault, MockModule};
