use serde::{Deserialize, Serialize};
use wasmtime::{
    Caller, Engine, Extern, Instance, Linker, Memory, Module, Store, StoreLimits,
    StoreLimitsBuilder, TypedFunc,
};

use super::runtime::{WasmRuntimeConfig, WASM_PAGE_SIZE};
use crate::error::{NativeError, NativeResult};
use crate::module::{NativeFlags, ParserModule};

/// Export symbols of the ABI entry points.
///
/// The defaults match the standard parser build. Deserializes from the
/// `[exports]` table of `tessera.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExportNames {
    pub malloc: String,
    pub free: String,
    pub parse: String,
    pub result_free: String,
    pub result_error: String,
    pub result_error_line: String,
    pub result_error_column: String,
    pub result_program_buffer: String,
    pub result_position_buffer: String,
    pub result_position_buffer_size: String,
    pub memory: String,
}

impl Default for ExportNames {
    fn default() -> Self {
        Self {
            malloc: "malloc".to_string(),
            free: "free".to_string(),
            parse: "hermesParse".to_string(),
            result_free: "hermesParseResult_free".to_string(),
            result_error: "hermesParseResult_getError".to_string(),
            result_error_line: "hermesParseResult_getErrorLine".to_string(),
            result_error_column: "hermesParseResult_getErrorColumn".to_string(),
            result_program_buffer: "hermesParseResult_getProgramBuffer".to_string(),
            result_position_buffer: "hermesParseResult_getPositionBuffer".to_string(),
            result_position_buffer_size: "hermesParseResult_getPositionBufferSize".to_string(),
            memory: "memory".to_string(),
        }
    }
}

/// Symbols run once after instantiation if the module exports them.
const INITIALIZERS: [&str; 2] = ["_initialize", "__wasm_call_ctors"];

type ParseParams = (u32, u32, u32, u32, u32, u32, u32);

struct StoreState {
    limits: StoreLimits,
}

/// One instance of a WASM parser module.
pub struct WasmParserModule {
    store: Store<StoreState>,
    memory: Memory,
    fuel: Option<u64>,
    malloc: TypedFunc<u32, u32>,
    free: TypedFunc<u32, ()>,
    parse: TypedFunc<ParseParams, u32>,
    result_free: TypedFunc<u32, ()>,
    result_error: TypedFunc<u32, u32>,
    result_error_line: TypedFunc<u32, u32>,
    result_error_column: TypedFunc<u32, u32>,
    result_program_buffer: TypedFunc<u32, u32>,
    result_position_buffer: TypedFunc<u32, u32>,
    result_position_buffer_size: TypedFunc<u32, u32>,
}

impl WasmParserModule {
    pub(super) fn instantiate(
        engine: &Engine,
        module: &Module,
        config: &WasmRuntimeConfig,
        exports: &ExportNames,
    ) -> NativeResult<Self> {
        let limits = StoreLimitsBuilder::new()
            .memory_size(config.max_memory_bytes())
            .trap_on_grow_failure(false)
            .build();
        let mut store = Store::new(engine, StoreState { limits });
        store.limiter(|state| &mut state.limits);
        if let Some(fuel) = config.fuel {
            store.set_fuel(fuel).map_err(instantiate_error)?;
        }

        let mut linker = Linker::new(engine);
        let memory_export = exports.memory.clone();
        linker
            .func_wrap(
                "env",
                "emscripten_resize_heap",
                move |caller: Caller<'_, StoreState>, requested: u32| -> u32 {
                    resize_heap(caller, &memory_export, requested)
                },
            )
            .map_err(instantiate_error)?;
        linker
            .define_unknown_imports_as_traps(module)
            .map_err(instantiate_error)?;
        let instance = linker.instantiate(&mut store, module).map_err(instantiate_error)?;

        let memory = instance
            .get_memory(&mut store, &exports.memory)
            .ok_or_else(|| NativeError::MissingExport {
                name: exports.memory.clone(),
                cause: "no memory export with this name".to_string(),
            })?;

        let mut parser = Self {
            malloc: typed(&instance, &mut store, &exports.malloc)?,
            free: typed(&instance, &mut store, &exports.free)?,
            parse: typed(&instance, &mut store, &exports.parse)?,
            result_free: typed(&instance, &mut store, &exports.result_free)?,
            result_error: typed(&instance, &mut store, &exports.result_error)?,
            result_error_line: typed(&instance, &mut store, &exports.result_error_line)?,
            result_error_column: typed(&instance, &mut store, &exports.result_error_column)?,
            result_program_buffer: typed(&instance, &mut store, &exports.result_program_buffer)?,
            result_position_buffer: typed(&instance, &mut store, &exports.result_position_buffer)?,
            result_position_buffer_size: typed(
                &instance,
                &mut store,
                &exports.result_position_buffer_size,
            )?,
            store,
            memory,
            fuel: config.fuel,
        };
        parser.run_initializer(&instance)?;
        log::debug!(
            "instantiated parser module with {} bytes of linear memory",
            parser.memory.data_size(&parser.store)
        );
        Ok(parser)
    }

    fn run_initializer(&mut self, instance: &Instance) -> NativeResult<()> {
        for name in INITIALIZERS {
            if let Ok(init) = instance.get_typed_func::<(), ()>(&mut self.store, name) {
                log::debug!("running module initializer `{name}`");
                self.refuel(name)?;
                init.call(&mut self.store, ()).map_err(|e| call_error(name, e))?;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Fuel left from the current budget, if metering is on.
    pub fn fuel_remaining(&self) -> Option<u64> {
        self.fuel.and_then(|_| self.store.get_fuel().ok())
    }

    /// Current size of linear memory in bytes.
    pub fn memory_size(&self) -> usize {
        self.memory.data_size(&self.store)
    }

    fn refuel(&mut self, export: &'static str) -> NativeResult<()> {
        if let Some(fuel) = self.fuel {
            self.store.set_fuel(fuel).map_err(|e| call_error(export, e))?;
        }
        Ok(())
    }

    fn call_u32(
        &mut self,
        export: &'static str,
        func: TypedFunc<u32, u32>,
        arg: u32,
    ) -> NativeResult<u32> {
        self.refuel(export)?;
        func.call(&mut self.store, arg).map_err(|e| call_error(export, e))
    }

    fn call_unit(
        &mut self,
        export: &'static str,
        func: TypedFunc<u32, ()>,
        arg: u32,
    ) -> NativeResult<()> {
        self.refuel(export)?;
        func.call(&mut self.store, arg).map_err(|e| call_error(export, e))
    }
}

impl ParserModule for WasmParserModule {
    fn malloc(&mut self, size: u32) -> NativeResult<u32> {
        self.call_u32("malloc", self.malloc.clone(), size)
    }

    fn free(&mut self, ptr: u32) -> NativeResult<()> {
        self.call_unit("free", self.free.clone(), ptr)
    }

    fn parse(&mut self, source: u32, len: u32, flags: NativeFlags) -> NativeResult<u32> {
        let [detect_flow, components, flow_match, tokens, allow_return] = flags.words();
        self.refuel("parse")?;
        self.parse
            .call(
                &mut self.store,
                (source, len, detect_flow, components, flow_match, tokens, allow_return),
            )
            .map_err(|e| call_error("parse", e))
    }

    fn result_free(&mut self, handle: u32) -> NativeResult<()> {
        self.call_unit("result_free", self.result_free.clone(), handle)
    }

    fn result_error(&mut self, handle: u32) -> NativeResult<u32> {
        self.call_u32("result_error", self.result_error.clone(), handle)
    }

    fn result_error_line(&mut self, handle: u32) -> NativeResult<u32> {
        self.call_u32("result_error_line", self.result_error_line.clone(), handle)
    }

    fn result_error_column(&mut self, handle: u32) -> NativeResult<u32> {
        self.call_u32("result_error_column", self.result_error_column.clone(), handle)
    }

    fn result_program_buffer(&mut self, handle: u32) -> NativeResult<u32> {
        self.call_u32("result_program_buffer", self.result_program_buffer.clone(), handle)
    }

    fn result_position_buffer(&mut self, handle: u32) -> NativeResult<u32> {
        self.call_u32("result_position_buffer", self.result_position_buffer.clone(), handle)
    }

    fn result_position_buffer_size(&mut self, handle: u32) -> NativeResult<u32> {
        self.call_u32(
            "result_position_buffer_size",
            self.result_position_buffer_size.clone(),
            handle,
        )
    }

    fn heap(&self) -> &[u8] {
        self.memory.data(&self.store)
    }

    fn heap_mut(&mut self) -> &mut [u8] {
        self.memory.data_mut(&mut self.store)
    }
}

/// Host side of emscripten's heap growth hook. Returns 1 if memory now
/// holds at least `requested` bytes, 0 if it could not grow.
fn resize_heap(mut caller: Caller<'_, StoreState>, memory_export: &str, requested: u32) -> u32 {
    let Some(Extern::Memory(memory)) = caller.get_export(memory_export) else {
        return 0;
    };
    let current = memory.data_size(&caller) as u64;
    let requested = u64::from(requested);
    if requested <= current {
        return 1;
    }
    let pages = (requested - current).div_ceil(WASM_PAGE_SIZE);
    match memory.grow(&mut caller, pages) {
        Ok(_) => 1,
        Err(err) => {
            log::debug!("parser heap could not grow to {requested} bytes: {err}");
            0
        }
    }
}

fn typed<P, R>(
    instance: &Instance,
    store: &mut Store<StoreState>,
    name: &str,
) -> NativeResult<TypedFunc<P, R>>
where
    P: wasmtime::WasmParams,
    R: wasmtime::WasmResults,
{
    instance
        .get_typed_func::<P, R>(store, name)
        .map_err(|e| NativeError::MissingExport {
            name: name.to_string(),
            cause: e.to_string(),
        })
}

fn call_error(export: &'static str, err: wasmtime::Error) -> NativeError {
    NativeError::Call {
        export,
        cause: format!("{err:#}"),
    }
}

fn instantiate_error(err: wasmtime::Error) -> NativeError {
    NativeError::Instantiate {
        cause: format!("{err:#}"),
    }
}
