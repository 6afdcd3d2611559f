//! Parser modules compiled to WebAssembly, run under wasmtime.
//!
//! ```no_run
//! use tessera_bridge::wasm::{WasmRuntime, WasmRuntimeConfig};
//! use tessera_bridge::{Parser, ParserOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = WasmRuntime::new(WasmRuntimeConfig::default())?;
//! let compiled = runtime.compile_file("hermes-parser.wasm".as_ref())?;
//! let mut parser = Parser::new(compiled.instantiate()?);
//! let program = parser.parse("1 + 2", &ParserOptions::default())?;
//! # Ok(())
//! # }
//! ```

mod module;
mod runtime;

pub use module::{ExportNames, WasmParserModule};
pub use runtime::{CompiledParser, WasmRuntime, WasmRuntimeConfig, WASM_PAGE_SIZE};
