//! Heap access for parser modules.
//!
//! A parser module exchanges data with its host through a single linear
//! memory. This crate provides [`HeapView`], a borrowed, bounds-checked
//! window onto that memory, and [`WordCursor`], a sequential reader for the
//! word-oriented buffers the module produces.

pub mod error;
pub mod view;

pub use error::{HeapError, HeapResult};
pub use view::{HeapView, WordCursor};
