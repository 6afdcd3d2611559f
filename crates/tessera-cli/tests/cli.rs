//! Runs the `tessera` binary against a small WASM parser module that answers
//! every source with the tree for `x`, or a syntax error when the source
//! starts with `;`.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tessera_ast::NodeKind;

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
        2048,
        1,
        0,
        0,
        0,
        0,
    ]);
    let positions = escape(&[1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1]);
    let wat = format!(
        r#"
        (module
            (memory (export "memory") 1)
            (global $next (mut i32) (i32.const 4096))
            (data (i32.const 1024) "{program}")
            (data (i32.const 1536) "{positions}")
            (data (i32.const 2048) "x")
            (data (i32.const 2064) "unexpected token\00")

            (func (export "malloc") (param $size i32) (result i32)
                (local $ptr i32)
                (local.set $ptr (global.get $next))
                (global.set $next (i32.add (local.get $ptr) (i32.const 256)))
                (local.get $ptr))
            (func (export "free") (param i32))
            (func (export "hermesParse")
                (param $src i32) (param i32 i32 i32 i32 i32 i32) (result i32)
                (if (result i32) (i32.eq (i32.load8_u (local.get $src)) (i32.const 59))
                    (then (i32.const 2))
                    (else (i32.const 1))))
            (func (export "hermesParseResult_free") (param i32))
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

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("parser.wasm"), fixture()).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn module(&self) -> PathBuf {
        self.path().join("parser.wasm")
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_tessera"))
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("tessera should run")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn parse_prints_json() {
    let ws = Workspace::new();
    ws.write("input.js", "x");
    let module = ws.module();
    let output = ws.run(&["parse", "input.js", "--module", module.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["type"], "Program");
    assert_eq!(json["body"][0]["expression"]["name"], "x");
}

#[test]
fn config_file_is_discovered() {
    let ws = Workspace::new();
    ws.write("tessera.toml", "module = \"parser.wasm\"\n");
    ws.write("input.js", "x");
    let output = ws.run(&["parse", "input.js", "--format", "tree"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "Program 1:0-1:1\n  ExpressionStatement 1:0-1:1\n    Identifier 1:0-1:1 name=\"x\"\n"
    );
}

#[test]
fn check_reports_syntax_errors() {
    let ws = Workspace::new();
    ws.write("tessera.toml", "module = \"parser.wasm\"\n");
    ws.write("good.js", "x");
    ws.write("bad.js", ";");
    let output = ws.run(&["check", "good.js", "bad.js"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("unexpected token"), "{err}");
    assert!(err.contains("1 of 2 files failed to parse"), "{err}");
}

#[test]
fn check_passes_clean_files() {
    let ws = Workspace::new();
    ws.write("tessera.toml", "module = \"parser.wasm\"\n");
    ws.write("a.js", "x");
    ws.write("b.js", "x");
    let output = ws.run(&["check", "a.js", "b.js"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Checked 2 file(s)"));
}

#[test]
fn missing_module_is_an_error() {
    let ws = Workspace::new();
    ws.write("tessera.toml", "[parser]\ntokens = false\n");
    ws.write("input.js", "x");
    let output = ws.run(&["parse", "input.js"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("No parser module configured"));
}

#[test]
fn bad_config_is_reported() {
    let ws = Workspace::new();
    ws.write("tessera.toml", "[runtime]\nfuel = \"lots\"\n");
    ws.write("input.js", "x");
    let output = ws.run(&["parse", "input.js"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid configuration"));
}
