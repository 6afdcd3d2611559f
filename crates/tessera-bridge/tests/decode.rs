//! Trees produced end to end through the reference engine.

use std::convert::Infallible;

use tessera_ast::visitor::{walk_node, Visitor};
use tessera_ast::{CommentKind, Node, NodeKind, Position, Program, SourceLocation, TokenKind};
use tessera_bridge::{parse, ParserOptions};
use tessera_testkit::MockModule;

fn parse_ok(source: &str, options: &ParserOptions) -> Program {
    let mut module = MockModule::new();
    let program = parse(&mut module, source, options).expect("valid source");
    assert!(module.is_balanced());
    program
}

fn expression(program: &Program) -> &Node {
    program.body[0].child("expression").expect("expression statement")
}

#[test]
fn one_plus_two() {
    let program = parse_ok("1 + 2", &ParserOptions::default());
    assert_eq!(program.body.len(), 1);
    assert_eq!(program.body[0].kind, NodeKind::ExpressionStatement);

    let sum = expression(&program);
    assert_eq!(sum.kind, NodeKind::BinaryExpression);
    assert_eq!(sum.string("operator"), Some("+"));
    let left = sum.child("left").unwrap();
    let right = sum.child("right").unwrap();
    assert_eq!(left.number("value"), Some(1.0));
    assert_eq!(right.number("value"), Some(2.0));
    assert_eq!(left.loc, SourceLocation::new(Position::new(1, 0), Position::new(1, 1)));
    assert_eq!(right.loc, SourceLocation::new(Position::new(1, 4), Position::new(1, 5)));
    assert_ne!(left.loc, right.loc);
    assert!(program.tokens.is_none());
}

#[test]
fn tokens_on_request() {
    let program = parse_ok("x", &ParserOptions::default().with_tokens(true));
    let tokens = program.tokens.expect("tokens requested");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "x");
    assert_eq!(tokens[0].loc.end, Position::new(1, 1));
}

#[test]
fn comments_are_attached_to_the_root() {
    let source = "#!/usr/bin/env node\n/* header */\nlet x = 1; // trailing\n";
    let program = parse_ok(source, &ParserOptions::default());
    let kinds: Vec<_> = program.comments.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, [CommentKind::InterpreterDirective, CommentKind::Block, CommentKind::Line]);
    assert_eq!(program.comments[1].value, " header ");
    assert_eq!(program.comments[2].loc.start, Position::new(3, 11));
}

#[test]
fn empty_source() {
    let program = parse_ok("", &ParserOptions::default());
    assert!(program.body.is_empty());
    assert_eq!(program.node_count(), 1);
}

#[test]
fn literals_keep_their_values() {
    let program = parse_ok(
        "[0x1f, 2.5e1, 'a\\u0041', true, null, this]",
        &ParserOptions::default(),
    );
    let elements = expression(&program).list("elements").unwrap();
    let element = |i: usize| elements[i].as_ref().unwrap();
    assert_eq!(element(0).number("value"), Some(31.0));
    assert_eq!(element(0).string("raw"), Some("0x1f"));
    assert_eq!(element(1).number("value"), Some(25.0));
    assert_eq!(element(2).string("value"), Some("aA"));
    assert_eq!(element(3).boolean("value"), Some(true));
    assert_eq!(element(4).kind, NodeKind::NullLiteral);
    assert_eq!(element(5).kind, NodeKind::ThisExpression);
}

#[test]
fn non_ascii_text_survives() {
    let program = parse_ok("const greeting = 'héllo, 世界';", &ParserOptions::default());
    let declarator = program.body[0].list("declarations").unwrap()[0].as_ref().unwrap();
    let init = declarator.child("init").unwrap();
    assert_eq!(init.string("value"), Some("héllo, 世界"));
    assert_eq!(init.loc.end, Position::new(1, 28));
}

#[test]
fn syntax_error_columns_count_characters() {
    let mut module = MockModule::new();
    let source = "let s = 'é';\nlet t = 'ü' +;";
    let err = parse(&mut module, source, &ParserOptions::default()).unwrap_err();
    let syntax = err.as_syntax_error().unwrap();
    assert_eq!((syntax.line, syntax.column), (2, 13));
    let span = syntax.span.expect("located");
    assert_eq!(&source[span.offset()..span.offset() + span.len()], ";");
}

/// Checks that every location is well formed and nested in its parent's.
struct LocationChecker {
    parents: Vec<SourceLocation>,
    visited: usize,
}

impl Visitor for LocationChecker {
    type Error = Infallible;

    fn visit_node(&mut self, node: &Node) -> Result<(), Infallible> {
        assert!(node.loc.is_ordered(), "{} has inverted location {:?}", node.kind, node.loc);
        if let Some(parent) = self.parents.last() {
            assert!(parent.contains(&node.loc), "{} escapes its parent", node.kind);
        }
        self.visited += 1;
        self.parents.push(node.loc);
        walk_node(self, node)?;
        self.parents.pop();
        Ok(())
    }
}

#[test]
fn locations_are_ordered_and_nested() {
    let source = "function area(w, h) {\n  if (w < 0 || h < 0) {\n    return 0;\n  }\n  return w * h;\n}\nlet a = area(2, 3), b = a ? -a : !a;\nwhile (b) b = b - 1;\n";
    let program = parse_ok(source, &ParserOptions::default());
    let mut checker = LocationChecker {
        parents: vec![program.loc],
        visited: 0,
    };
    checker.visit_program(&program).unwrap();
    assert_eq!(checker.visited + 1, program.node_count());
    for pair in program.body.windows(2) {
        assert!(pair[0].loc.precedes(&pair[1].loc));
    }
}

#[test]
fn large_inputs_decode_after_heap_growth() {
    let source: String = (0..2_000).map(|i| format!("let v{i} = v{i} + {i};\n")).collect();
    let mut module = MockModule::new();
    let heap_before = tessera_bridge::ParserModule::heap(&module).len();
    let program = parse(&mut module, &source, &ParserOptions::default()).unwrap();
    assert!(tessera_bridge::ParserModule::heap(&module).len() > heap_before);
    assert_eq!(program.body.len(), 2_000);
    let last = program.body.last().unwrap();
    assert_eq!(last.loc.start, Position::new(2_000, 0));
    assert!(module.is_balanced());
}
