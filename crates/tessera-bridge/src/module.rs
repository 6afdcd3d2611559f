//! The native ABI of a parser module.
//!
//! A parser module owns a linear memory and exports a fixed set of entry
//! points. Pointers and handles crossing this boundary are plain `u32`
//! values; the safe wrappers in this crate give them owners.

use crate::error::NativeResult;

/// Number of positional option flags `parse` takes after the source.
pub const NATIVE_FLAG_COUNT: usize = 5;

/// The positional option flags of the native `parse` entry point.
///
/// Order and count are part of the ABI and must match the module build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeFlags([u32; NATIVE_FLAG_COUNT]);

impl NativeFlags {
    pub const DETECT_FLOW: usize = 0;
    pub const COMPONENT_SYNTAX: usize = 1;
    pub const FLOW_MATCH_SYNTAX: usize = 2;
    pub const TOKENS: usize = 3;
    pub const ALLOW_RETURN_OUTSIDE_FUNCTION: usize = 4;

    pub const fn from_words(words: [u32; NATIVE_FLAG_COUNT]) -> Self {
        Self(words)
    }

    pub fn with(mut self, flag: usize, enabled: bool) -> Self {
        self.0[flag] = u32::from(enabled);
        self
    }

    pub fn is_set(&self, flag: usize) -> bool {
        self.0.get(flag).is_some_and(|word| *word != 0)
    }

    pub fn words(&self) -> [u32; NATIVE_FLAG_COUNT] {
        self.0
    }
}

/// A loaded parser module instance.
///
/// Implementations wrap one instance with its own linear memory. Every entry
/// point may fail (a trap, a missing export); such failures are reported as
/// [`NativeError`](crate::NativeError) and never confused with syntax errors.
///
/// Nothing here is safe to call twice for the same allocation or handle.
/// [`SourceBuffer`](crate::SourceBuffer) and
/// [`ResultHandle`](crate::ResultHandle) enforce that.
pub trait ParserModule {
    /// Allocate `size` bytes in the module heap. Returns 0 on failure.
    fn malloc(&mut self, size: u32) -> NativeResult<u32>;

    fn free(&mut self, ptr: u32) -> NativeResult<()>;

    /// Parse `len` bytes at `source` (the count includes the trailing NUL)
    /// and return a result handle.
    fn parse(&mut self, source: u32, len: u32, flags: NativeFlags) -> NativeResult<u32>;

    fn result_free(&mut self, handle: u32) -> NativeResult<()>;

    /// Pointer to a NUL-terminated error message, or 0 if parsing succeeded.
    fn result_error(&mut self, handle: u32) -> NativeResult<u32>;

    fn result_error_line(&mut self, handle: u32) -> NativeResult<u32>;

    fn result_error_column(&mut self, handle: u32) -> NativeResult<u32>;

    fn result_program_buffer(&mut self, handle: u32) -> NativeResult<u32>;

    fn result_position_buffer(&mut self, handle: u32) -> NativeResult<u32>;

    /// Number of records in the position buffer.
    fn result_position_buffer_size(&mut self, handle: u32) -> NativeResult<u32>;

    /// Current contents of the module's linear memory.
    ///
    /// Memory may grow during any call, so callers re-borrow after each call
    /// instead of holding on to an earlier slice.
    fn heap(&self) -> &[u8];

    fn heap_mut(&mut self) -> &mut [u8];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_positional() {
        let flags = NativeFlags::default()
            .with(NativeFlags::TOKENS, true)
            .with(NativeFlags::DETECT_FLOW, true);
        assert_eq!(flags.words(), [1, 0, 0, 1, 0]);
        assert!(flags.is_set(NativeFlags::TOKENS));
        assert!(!flags.is_set(NativeFlags::ALLOW_RETURN_OUTSIDE_FUNCTION));
        assert!(!flags.is_set(99));
    }

    #[test]
    fn raw_words_round_trip() {
        let flags = NativeFlags::from_words([0, 1, 1, 0, 0]);
        assert!(flags.is_set(NativeFlags::COMPONENT_SYNTAX));
        assert!(flags.is_set(NativeFlags::FLOW_MATCH_SYNTAX));
        assert!(!flags.is_set(NativeFlags::DETECT_FLOW));
        let built = NativeFlags::default()
            .with(NativeFlags::COMPONENT_SYNTAX, true)
            .with(NativeFlags::FLOW_MATCH_SYNTAX, true);
        assert_eq!(flags, built);
    }
}
