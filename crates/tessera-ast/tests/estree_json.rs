use serde_json::json;
use tessera_ast::visitor::{walk_node, Visitor};
use tessera_ast::*;

fn loc(start: u32, end: u32) -> SourceLocation {
    SourceLocation::new(Position::new(1, start), Position::new(1, end))
}

fn numeric(value: f64, raw: &str, column: u32) -> Node {
    Node::new(
        NodeKind::NumericLiteral,
        loc(column, column + raw.len() as u32),
        vec![
            Field { name: "value", value: Value::Number(value) },
            Field { name: "raw", value: Value::String(Some(raw.to_string())) },
        ],
    )
}

fn one_plus_two() -> Program {
    let binary = Node::new(
        NodeKind::BinaryExpression,
        loc(0, 5),
        vec![
            Field { name: "left", value: Value::Node(Some(Box::new(numeric(1.0, "1", 0)))) },
            Field { name: "right", value: Value::Node(Some(Box::new(numeric(2.0, "2", 4)))) },
            Field { name: "operator", value: Value::String(Some("+".to_string())) },
        ],
    );
    let statement = Node::new(
        NodeKind::ExpressionStatement,
        loc(0, 5),
        vec![
            Field { name: "expression", value: Value::Node(Some(Box::new(binary))) },
            Field { name: "directive", value: Value::String(None) },
        ],
    );
    Program {
        loc: loc(0, 5),
        body: vec![statement],
        comments: Vec::new(),
        tokens: None,
    }
}

#[test]
fn program_serializes_as_estree() {
    let value = serde_json::to_value(one_plus_two()).unwrap();
    let expression = &value["body"][0]["expression"];

    assert_eq!(value["type"], "Program");
    assert_eq!(value["comments"], json!([]));
    assert!(value.get("tokens").is_none());
    assert_eq!(value["body"][0]["directive"], json!(null));
    assert_eq!(expression["type"], "BinaryExpression");
    assert_eq!(expression["operator"], "+");
    assert_eq!(expression["left"]["value"], json!(1.0));
    assert_eq!(expression["right"]["raw"], "2");
    assert_eq!(
        expression["right"]["loc"],
        json!({ "start": { "line": 1, "column": 4 }, "end": { "line": 1, "column": 5 } })
    );
}

#[test]
fn tokens_are_emitted_when_present() {
    let mut program = one_plus_two();
    program.tokens = Some(vec![Token {
        kind: TokenKind::Numeric,
        value: "1".to_string(),
        loc: loc(0, 1),
    }]);
    let value = serde_json::to_value(&program).unwrap();
    assert_eq!(value["tokens"][0]["type"], "Numeric");
    assert_eq!(value["tokens"][0]["value"], "1");
}

struct LiteralCollector(Vec<f64>);

impl Visitor for LiteralCollector {
    type Error = ();

    fn visit_node(&mut self, node: &Node) -> Result<(), ()> {
        if let Some(value) = node.number("value") {
            self.0.push(value);
        }
        walk_node(self, node)
    }
}

#[test]
fn visitor_reaches_every_literal() {
    let mut collector = LiteralCollector(Vec::new());
    collector.visit_program(&one_plus_two()).unwrap();
    assert_eq!(collector.0, [1.0, 2.0]);
    assert_eq!(one_plus_two().node_count(), 5);
}
