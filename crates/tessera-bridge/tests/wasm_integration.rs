//! The wasmtime-backed module against a hand-written parser module.
//!
//! The fixture answers every parse with the same fixed tree for `x`, except
//! that a source starting with `;` yields a syntax error, `!` traps and `~`
//! spins forever. It counts `free` and `hermesParseResult_free` calls in
//! memory at addresses 512 and 516.

#![cfg(feature = "wasm")]

use tessera_ast::NodeKind;
use tessera_bridge::wasm::{ExportNames, WasmParserModule, WasmRuntime, WasmRuntimeConfig};
use tessera_bridge::{NativeError, ParseError, Parser, ParserModule, ParserOptions};

const FREE_COUNT: usize = 512;
const RESULT_FREE_COUNT: usize = 516;

fn escape(words: &[u32]) -> String {
    words
        .iter()
        .flat_map(|w| w.to_le_bytes())
        .map(|b| format!("\\{b:02x}"))
        .collect()
}

fn fixture() -> Vec<u8> {
    let program = escape(&[
        NodeKind::Program.tag(),
        1,
        NodeKind::ExpressionStatement.tag(),
        NodeKind::Identifier.tag(),
        2048, // name
        1,
        0, // typeAnnotation
        0, // optional
        0, // directive
        0, // comments
    ]);
    let positions = escape(&[1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1]);
    let wat = format!(
        r#"
        (module
            (import "env" "abort" (func $abort (param i32)))
            (memory (export "memory") 1)
            (global $next (mut i32) (i32.const 4096))
            (global $initialized (mut i32) (i32.const 0))
            (data (i32.const 1024) "{program}")
            (data (i32.const 1536) "{positions}")
            (data (i32.const 2048) "x")
            (data (i32.const 2064) "unexpected token\00")

            (func (export "_initialize")
                (global.set $initialized (i32.const 1)))

            (func (export "malloc") (param $size i32) (result i32)
                (local $ptr i32) (local $end i32) (local $have i32)
                (local.set $ptr (global.get $next))
                (local.set $end (i32.add (local.get $ptr) (local.get $size)))
                (local.set $have (i32.mul (memory.size) (i32.const 65536)))
                (if (i32.gt_u (local.get $end) (local.get $have))
                    (then
                        (if (i32.eq
                                (memory.grow
                                    (i32.add
                                        (i32.shr_u (i32.sub (local.get $end) (local.get $have)) (i32.const 16))
                                        (i32.const 1)))
                                (i32.const -1))
                            (then (return (i32.const 0))))))
                (global.set $next (i32.and (i32.add (local.get $end) (i32.const 7)) (i32.const -8)))
                (local.get $ptr))

            (func (export "free") (param $ptr i32)
                (i32.store (i32.const 512) (i32.add (i32.load (i32.const 512)) (i32.const 1))))

            (func (export "hermesParse")
                (param $src i32) (param $len i32) (param i32 i32 i32 i32 i32) (result i32)
                (local $first i32)
                (if (i32.eqz (global.get $initialized)) (then (unreachable)))
                (local.set $first (i32.load8_u (local.get $src)))
                (if (i32.eq (local.get $first) (i32.const 33)) (then (unreachable)))
                (if (i32.eq (local.get $first) (i32.const 126)) (then (loop $spin (br $spin))))
                (if (result i32) (i32.eq (local.get $first) (i32.const 59))
                    (then (i32.const 2))
                    (else (i32.const 1))))

            (func (export "hermesParseResult_free") (param $h i32)
                (i32.store (i32.const 516) (i32.add (i32.load (i32.const 516)) (i32.const 1))))
            (func (export "hermesParseResult_getError") (param $h i32) (result i32)
                (if (result i32) (i32.eq (local.get $h) (i32.const 2))
                    (then (i32.const 2064))
                    (else (i32.const 0))))
            (func (export "hermesParseResult_getErrorLine") (param i32) (result i32) (i32.const 1))
            (func (export "hermesParseResult_getErrorColumn") (param i32) (result i32) (i32.const 0))
            (func (export "hermesParseResult_getProgramBuffer") (param i32) (result i32) (i32.const 1024))
            (func (export "hermesParseResult_getPositionBuffer") (param i32) (result i32) (i32.const 1536))
            (func (export "hermesParseResult_getPositionBufferSize") (param i32) (result i32) (i32.const 3)))
        "#
    );
    wat::parse_str(wat).expect("fixture should assemble")
}

fn instantiate(config: WasmRuntimeConfig) -> WasmParserModule {
    let runtime = WasmRuntime::new(config).expect("engine");
    let compiled = runtime.compile("fixture", &fixture()).expect("fixture compiles");
    compiled.instantiate().expect("fixture instantiates")
}

fn counter(module: &WasmParserModule, addr: usize) -> u32 {
    let heap = module.heap();
    u32::from_le_bytes([heap[addr], heap[addr + 1], heap[addr + 2], heap[addr + 3]])
}

#[test]
fn parses_through_wasm() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut parser = Parser::new(instantiate(WasmRuntimeConfig::default()));
    let program = parser.parse("x", &ParserOptions::default()).expect("fixture result");

    let ident = program.body[0].child("expression").unwrap();
    assert_eq!(ident.kind, NodeKind::Identifier);
    assert_eq!(ident.string("name"), Some("x"));
    assert_eq!(counter(parser.module(), FREE_COUNT), 1);
    assert_eq!(counter(parser.module(), RESULT_FREE_COUNT), 1);
}

#[test]
fn syntax_errors_come_back_as_syntax_errors() {
    let mut parser = Parser::new(instantiate(WasmRuntimeConfig::default()));
    let err = parser.parse(";", &ParserOptions::default()).unwrap_err();
    let syntax = err.as_syntax_error().expect("syntax error");
    assert_eq!(syntax.message, "unexpected token");
    assert_eq!((syntax.line, syntax.column), (1, 0));
    assert_eq!(counter(parser.module(), RESULT_FREE_COUNT), 1);
}

#[test]
fn traps_are_native_errors_and_free_the_source() {
    let mut parser = Parser::new(instantiate(WasmRuntimeConfig::default()));
    let err = parser.parse("!", &ParserOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::Native(NativeError::Call { export: "parse", .. })));
    assert_eq!(counter(parser.module(), FREE_COUNT), 1);
    assert_eq!(counter(parser.module(), RESULT_FREE_COUNT), 0);

    // The instance stays usable after a trap.
    assert!(parser.parse("x", &ParserOptions::default()).is_ok());
}

#[test]
fn memory_cap_is_out_of_memory() {
    let config = WasmRuntimeConfig::default().with_max_memory_pages(1);
    let mut parser = Parser::new(instantiate(config));
    let source = "x".repeat(70_000);
    let err = parser.parse(&source, &ParserOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::OutOfMemory { requested: 70_001 }));
    assert_eq!(parser.module().memory_size(), 65536);
}

#[test]
fn growth_below_the_cap_succeeds() {
    let mut parser = Parser::new(instantiate(WasmRuntimeConfig::default()));
    let source = "x".repeat(70_000);
    assert!(parser.parse(&source, &ParserOptions::default()).is_ok());
    assert!(parser.module().memory_size() > 65536);
}

#[test]
fn fuel_exhaustion_is_a_native_error() {
    let config = WasmRuntimeConfig::default().with_fuel(Some(100_000));
    let mut parser = Parser::new(instantiate(config));
    let err = parser.parse("~", &ParserOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::Native(NativeError::Call { export: "parse", .. })));
    assert_eq!(counter(parser.module(), FREE_COUNT), 1);

    // Each call gets a fresh budget.
    assert!(parser.parse("x", &ParserOptions::default()).is_ok());
}

#[test]
fn missing_exports_fail_instantiation() {
    let runtime = WasmRuntime::new(WasmRuntimeConfig::default()).unwrap();
    let exports = ExportNames {
        parse: "parseSomethingElse".to_string(),
        ..ExportNames::default()
    };
    let compiled = runtime.compile("fixture", &fixture()).unwrap().with_exports(exports);
    match compiled.instantiate() {
        Err(NativeError::MissingExport { name, .. }) => assert_eq!(name, "parseSomethingElse"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("instantiation should fail"),
    }
}

#[test]
fn instances_are_isolated() {
    let runtime = WasmRuntime::new(WasmRuntimeConfig::default()).unwrap();
    let compiled = runtime.compile("fixture", &fixture()).unwrap();
    let mut first = Parser::new(compiled.instantiate().unwrap());
    let mut second = Parser::new(compiled.instantiate().unwrap());

    first.parse("x", &ParserOptions::default()).unwrap();
    first.parse("x", &ParserOptions::default()).unwrap();
    second.parse("x", &ParserOptions::default()).unwrap();
    assert_eq!(counter(first.module(), RESULT_FREE_COUNT), 2);
    assert_eq!(counter(second.module(), RESULT_FREE_COUNT), 1);
}

#[test]
fn bad_modules_fail_to_compile() {
    let runtime = WasmRuntime::new(WasmRuntimeConfig::default()).unwrap();
    let err = runtime.compile("garbage", b"\0asm\x02\0\0\0").err().expect("invalid module");
    assert!(matches!(err, NativeError::Compile { .. }));
}
