use std::path::Path;

use serde::{Deserialize, Serialize};
use wasmtime::{Config, Engine, Module};

use super::module::{ExportNames, WasmParserModule};
use crate::error::{NativeError, NativeResult};

/// Bytes per WebAssembly page.
pub const WASM_PAGE_SIZE: u64 = 64 * 1024;

/// 128 MiB.
const DEFAULT_MAX_MEMORY_PAGES: u32 = 2048;

/// Engine and store settings for WASM parser modules.
///
/// Deserializes from the `[runtime]` table of `tessera.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WasmRuntimeConfig {
    /// Upper bound on linear memory, in 64 KiB pages. Growth past it fails
    /// like an ordinary allocation failure.
    pub max_memory_pages: u32,
    /// Execution budget granted to every call into the module. `None`
    /// disables metering.
    pub fuel: Option<u64>,
    pub debug_info: bool,
}

impl Default for WasmRuntimeConfig {
    fn default() -> Self {
        Self {
            max_memory_pages: DEFAULT_MAX_MEMORY_PAGES,
            fuel: None,
            debug_info: false,
        }
    }
}

impl WasmRuntimeConfig {
    pub fn with_max_memory_pages(mut self, pages: u32) -> Self {
        self.max_memory_pages = pages;
        self
    }

    pub fn with_fuel(mut self, fuel: Option<u64>) -> Self {
        self.fuel = fuel;
        self
    }

    pub fn with_debug_info(mut self, enabled: bool) -> Self {
        self.debug_info = enabled;
        self
    }

    /// Memory cap in bytes.
    pub fn max_memory_bytes(&self) -> usize {
        (u64::from(self.max_memory_pages) * WASM_PAGE_SIZE) as usize
    }

    fn to_wasmtime_config(&self) -> Config {
        let mut config = Config::new();
        config.consume_fuel(self.fuel.is_some());
        config.debug_info(self.debug_info);
        config
    }
}

/// A wasmtime engine configured for parser modules.
pub struct WasmRuntime {
    engine: Engine,
    config: WasmRuntimeConfig,
}

impl WasmRuntime {
    pub fn new(config: WasmRuntimeConfig) -> NativeResult<Self> {
        let engine = Engine::new(&config.to_wasmtime_config()).map_err(|e| NativeError::Compile {
            module: "engine".to_string(),
            cause: e.to_string(),
        })?;
        Ok(Self { engine, config })
    }

    pub fn config(&self) -> &WasmRuntimeConfig {
        &self.config
    }

    /// Compile a module from its binary (or text) form.
    pub fn compile(&self, name: &str, bytes: &[u8]) -> NativeResult<CompiledParser> {
        let module = Module::new(&self.engine, bytes).map_err(|e| NativeError::Compile {
            module: name.to_string(),
            cause: e.to_string(),
        })?;
        log::info!("compiled parser module `{name}` ({} bytes)", bytes.len());

        Ok(CompiledParser {
            engine: self.engine.clone(),
            module,
            config: self.config.clone(),
            exports: ExportNames::default(),
        })
    }

    pub fn compile_file(&self, path: &Path) -> NativeResult<CompiledParser> {
        let bytes = std::fs::read(path).map_err(|source| NativeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");
        self.compile(name, &bytes)
    }
}

/// A compiled parser module, ready to be instantiated any number of times.
///
/// Cheap to clone and safe to share between threads. Each instance created
/// from it is fully isolated.
#[derive(Clone)]
pub struct CompiledParser {
    engine: Engine,
    module: Module,
    config: WasmRuntimeConfig,
    exports: ExportNames,
}

impl CompiledParser {
    /// Use different export symbols for the ABI entry points.
    pub fn with_exports(mut self, exports: ExportNames) -> Self {
        self.exports = exports;
        self
    }

    pub fn exports(&self) -> &ExportNames {
        &self.exports
    }

    /// Create a fresh instance with its own store and linear memory.
    pub fn instantiate(&self) -> NativeResult<WasmParserModule> {
        WasmParserModule::instantiate(&self.engine, &self.module, &self.config, &self.exports)
    }
}
