use tessera_ast::NODE_SCHEMAS;
use tessera_bridge::{NativeError, NativeFlags, NativeResult, ParserModule};

use crate::encode::{encode, EncodedProgram};
use crate::engine::{self, EngineOptions};
use crate::handles::HandleTable;
use crate::heap::{AllocStats, MockHeap};

/// A deliberate misbehavior of [`MockModule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every `malloc` returns 0.
    FailMalloc,
    /// Report one position record fewer than the tree needs.
    TruncatePositions,
    /// Replace the tag of the first statement with one past the schema table.
    UnknownTag,
    /// Store 2 in the first boolean field.
    BadBoolean,
    /// `parse` fails the way a trapping module does.
    TrapOnParse,
    /// Point the first string past the end of the heap.
    CorruptStringPointer,
    /// `parse` returns handle 0.
    NullHandle,
    /// `result_free` frees the result and then reports failure.
    FailRelease,
}

enum MockResult {
    Program(EncodedProgram),
    Error { message: u32, line: u32, column: u32 },
}

/// An in-memory [`ParserModule`] backed by the reference engine.
///
/// Every allocation and result handle is tracked, so tests can assert that
/// the bridge released everything exactly once.
pub struct MockModule {
    heap: MockHeap,
    results: HandleTable<MockResult>,
    fault: Option<Fault>,
    parse_calls: usize,
    result_frees: usize,
    stale_result_frees: usize,
    last_flags: Option<NativeFlags>,
    last_source: Option<String>,
}

impl MockModule {
    pub fn new() -> Self {
        Self::with_heap(MockHeap::new())
    }

    pub fn with_heap(heap: MockHeap) -> Self {
        Self {
            heap,
            results: HandleTable::new(),
            fault: None,
            parse_calls: 0,
            result_frees: 0,
            stale_result_frees: 0,
            last_flags: None,
            last_source: None,
        }
    }

    pub fn with_fault(fault: Fault) -> Self {
        let mut module = Self::new();
        module.set_fault(Some(fault));
        module
    }

    pub fn set_fault(&mut self, fault: Option<Fault>) {
        self.fault = fault;
    }

    pub fn parse_calls(&self) -> usize {
        self.parse_calls
    }

    /// Successful `result_free` calls.
    pub fn result_frees(&self) -> usize {
        self.result_frees
    }

    /// `result_free` calls with a handle that was already freed or never
    /// issued.
    pub fn stale_result_frees(&self) -> usize {
        self.stale_result_frees
    }

    pub fn live_results(&self) -> usize {
        self.results.len()
    }

    pub fn live_allocations(&self) -> usize {
        self.heap.live_allocations()
    }

    pub fn alloc_stats(&self) -> AllocStats {
        self.heap.stats()
    }

    pub fn last_flags(&self) -> Option<NativeFlags> {
        self.last_flags
    }

    /// The source text the last `parse` call saw.
    pub fn last_source(&self) -> Option<&str> {
        self.last_source.as_deref()
    }

    pub fn mock_heap(&self) -> &MockHeap {
        &self.heap
    }

    /// True if nothing is leaked and nothing was freed twice.
    pub fn is_balanced(&self) -> bool {
        let stats = self.heap.stats();
        self.results.is_empty()
            && self.heap.live_allocations() == 0
            && self.stale_result_frees == 0
            && stats.double_frees == 0
            && stats.invalid_frees == 0
    }

    fn read_source(&self, ptr: u32, len: u32) -> NativeResult<String> {
        let bad_source = |cause: &str| NativeError::Call {
            export: "parse",
            cause: cause.to_string(),
        };
        let start = ptr as usize;
        let bytes = start
            .checked_add(len as usize)
            .and_then(|end| self.heap.bytes().get(start..end))
            .ok_or_else(|| bad_source("source range is outside the heap"))?;
        let (&nul, text) = bytes.split_last().ok_or_else(|| bad_source("empty source buffer"))?;
        if nul != 0 {
            return Err(bad_source("source is not NUL-terminated"));
        }
        String::from_utf8(text.to_vec()).map_err(|_| bad_source("source is not UTF-8"))
    }

    fn c_string(&mut self, text: &str) -> NativeResult<u32> {
        let ptr = self.heap.malloc(text.len() as u32 + 1);
        if ptr == 0 {
            return Err(NativeError::Call {
                export: "parse",
                cause: "out of memory while reporting an error".to_string(),
            });
        }
        self.heap.write(ptr, text.as_bytes());
        self.heap.write(ptr + text.len() as u32, &[0]);
        Ok(ptr)
    }

    fn inject(&mut self, encoded: &mut EncodedProgram) {
        let Some(fault) = self.fault else { return };
        log::debug!("injecting {fault:?}");
        let marks = encoded.marks;
        match fault {
            Fault::TruncatePositions => {
                encoded.position_count = encoded.position_count.saturating_sub(1);
            }
            Fault::UnknownTag => {
                if let Some(addr) = marks.first_node_tag {
                    self.heap.write_u32(addr, NODE_SCHEMAS.len() as u32 + 1);
                }
            }
            Fault::BadBoolean => {
                if let Some(addr) = marks.first_boolean {
                    self.heap.write_u32(addr, 2);
                }
            }
            Fault::CorruptStringPointer => {
                if let Some(addr) = marks.first_string_ptr {
                    let past_end = self.heap.len() as u32 + 0x1000;
                    self.heap.write_u32(addr, past_end);
                }
            }
            Fault::FailMalloc | Fault::TrapOnParse | Fault::NullHandle | Fault::FailRelease => {}
        }
    }

    fn result(&self, export: &'static str, handle: u32) -> NativeResult<&MockResult> {
        self.results.get(handle).ok_or_else(|| NativeError::Call {
            export,
            cause: format!("unknown result handle {handle:#x}"),
        })
    }

    fn program(&self, export: &'static str, handle: u32) -> NativeResult<Option<&EncodedProgram>> {
        Ok(match self.result(export, handle)? {
            MockResult::Program(encoded) => Some(encoded),
            MockResult::Error { .. } => None,
        })
    }
}

impl Default for MockModule {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserModule for MockModule {
    fn malloc(&mut self, size: u32) -> NativeResult<u32> {
        if self.fault == Some(Fault::FailMalloc) {
            return Ok(0);
        }
        Ok(self.heap.malloc(size))
    }

    fn free(&mut self, ptr: u32) -> NativeResult<()> {
        self.heap.free(ptr);
        Ok(())
    }

    fn parse(&mut self, source: u32, len: u32, flags: NativeFlags) -> NativeResult<u32> {
        self.parse_calls += 1;
        self.last_flags = Some(flags);
        match self.fault {
            Some(Fault::TrapOnParse) => {
                return Err(NativeError::Call {
                    export: "parse",
                    cause: "wasm trap: wasm `unreachable` instruction executed".to_string(),
                })
            }
            Some(Fault::NullHandle) => return Ok(0),
            _ => {}
        }

        let text = self.read_source(source, len)?;
        let options = EngineOptions::from_flags(flags);
        let result = match engine::parse(&text, &options) {
            Ok(program) => {
                let mut encoded = encode(&mut self.heap, &program, options.tokens)?;
                self.inject(&mut encoded);
                MockResult::Program(encoded)
            }
            Err(err) => {
                log::debug!("reference engine rejected source: {err}");
                MockResult::Error {
                    message: self.c_string(&err.message)?,
                    line: err.line,
                    column: err.column,
                }
            }
        };
        self.last_source = Some(text);
        Ok(self.results.insert(result))
    }

    fn result_free(&mut self, handle: u32) -> NativeResult<()> {
        let Some(result) = self.results.remove(handle) else {
            log::warn!("result_free on stale handle {handle:#x}");
            self.stale_result_frees += 1;
            return Ok(());
        };
        self.result_frees += 1;
        match result {
            MockResult::Program(encoded) => {
                for ptr in encoded.allocations {
                    self.heap.free(ptr);
                }
            }
            MockResult::Error { message, .. } => self.heap.free(message),
        }
        if self.fault == Some(Fault::FailRelease) {
            return Err(NativeError::Call {
                export: "result_free",
                cause: "injected release failure".to_string(),
            });
        }
        Ok(())
    }

    fn result_error(&mut self, handle: u32) -> NativeResult<u32> {
        Ok(match self.result("result_error", handle)? {
            MockResult::Error { message, .. } => *message,
            MockResult::Program(_) => 0,
        })
    }

    fn result_error_line(&mut self, handle: u32) -> NativeResult<u32> {
        Ok(match self.result("result_error_line", handle)? {
            MockResult::Error { line, .. } => *line,
            MockResult::Program(_) => 0,
        })
    }

    fn result_error_column(&mut self, handle: u32) -> NativeResult<u32> {
        Ok(match self.result("result_error_column", handle)? {
            MockResult::Error { column, .. } => *column,
            MockResult::Program(_) => 0,
        })
    }

    fn result_program_buffer(&mut self, handle: u32) -> NativeResult<u32> {
        Ok(self.program("result_program_buffer", handle)?.map_or(0, |p| p.program))
    }

    fn result_position_buffer(&mut self, handle: u32) -> NativeResult<u32> {
        Ok(self.program("result_position_buffer", handle)?.map_or(0, |p| p.positions))
    }

    fn result_position_buffer_size(&mut self, handle: u32) -> NativeResult<u32> {
        Ok(self
            .program("result_position_buffer_size", handle)?
            .map_or(0, |p| p.position_count))
    }

    fn heap(&self) -> &[u8] {
        self.heap.bytes()
    }

    fn heap_mut(&mut self) -> &mut [u8] {
        self.heap.bytes_mut()
    }
}
