use tessera_ast::{Node, NodeKind, SourceLocation, Value};

use super::lexer::{LineIndex, Tok, TokenType};
use super::{build, EngineError, EngineOptions};

const ASSIGNMENT_OPERATORS: &[&str] = &["=", "+=", "-=", "*=", "/=", "%="];
const UNARY_PUNCTUATORS: &[&str] = &["!", "-", "+", "~"];
const UNARY_KEYWORDS: &[&str] = &["typeof", "void", "delete"];

/// Binding power of a binary operator and whether it builds a
/// `LogicalExpression`.
fn binary_operator(tok: &Tok) -> Option<(u8, bool)> {
    match tok.ty {
        TokenType::Punctuator => Some(match tok.raw.as_str() {
            "??" => (1, true),
            "||" => (2, true),
            "&&" => (3, true),
            "==" | "!=" | "===" | "!==" => (6, false),
            "<" | ">" | "<=" | ">=" => (7, false),
            "+" | "-" => (9, false),
            "*" | "/" | "%" => (10, false),
            "**" => (11, false),
            _ => return None,
        }),
        TokenType::Keyword if tok.raw == "instanceof" || tok.raw == "in" => Some((7, false)),
        _ => None,
    }
}

fn node(node: Node) -> Value {
    Value::Node(Some(Box::new(node)))
}

fn opt_node(node: Option<Node>) -> Value {
    Value::Node(node.map(Box::new))
}

fn string(text: impl Into<String>) -> Value {
    Value::String(Some(text.into()))
}

pub(crate) struct Parser<'s> {
    tokens: Vec<Tok>,
    pos: usize,
    prev_end: usize,
    lines: &'s LineIndex<'s>,
    function_depth: usize,
    allow_return_outside_function: bool,
}

type ParseResult<T> = Result<T, EngineError>;

impl<'s> Parser<'s> {
    pub(crate) fn new(tokens: Vec<Tok>, lines: &'s LineIndex<'s>, options: &EngineOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            prev_end: 0,
            lines,
            function_depth: 0,
            allow_return_outside_function: options.allow_return_outside_function,
        }
    }

    pub(crate) fn program(mut self) -> ParseResult<Vec<Node>> {
        let mut body = Vec::new();
        while self.peek().ty != TokenType::Eof {
            body.push(self.statement()?);
        }
        Ok(body)
    }

    fn peek(&self) -> &Tok {
        // The token list always ends with Eof, and `advance` never moves
        // past it.
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Tok {
        let tok = self.tokens[self.pos].clone();
        if tok.ty != TokenType::Eof {
            self.pos += 1;
            self.prev_end = tok.end;
        }
        tok
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.peek().is_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> ParseResult<Tok> {
        if self.peek().is_punct(punct) {
            Ok(self.advance())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> EngineError {
        let tok = self.peek();
        let message = match tok.ty {
            TokenType::Eof => "unexpected end of input".to_string(),
            _ => format!("unexpected token '{}'", tok.raw),
        };
        self.error_at(message, tok.start)
    }

    fn error_at(&self, message: String, offset: usize) -> EngineError {
        let at = self.lines.position(offset);
        EngineError::new(message, at.line, at.column)
    }

    /// Location from `start` to the end of the last consumed token.
    fn loc(&self, start: usize) -> SourceLocation {
        self.lines.location(start, self.prev_end.max(start))
    }

    fn semicolon(&mut self) -> ParseResult<()> {
        if self.eat_punct(";") {
            return Ok(());
        }
        let next = self.peek();
        if next.is_punct("}") || next.ty == TokenType::Eof || next.newline_before {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn statement(&mut self) -> ParseResult<Node> {
        let tok = self.peek().clone();
        if tok.ty == TokenType::Keyword {
            match tok.raw.as_str() {
                "var" | "let" | "const" => return self.variable_declaration(),
                "function" => return self.function_declaration(),
                "return" => return self.return_statement(),
                "if" => return self.if_statement(),
                "while" => return self.while_statement(),
                _ => {}
            }
        } else if tok.is_punct("{") {
            return self.block();
        } else if tok.is_punct(";") {
            let start = self.advance().start;
            return Ok(build(NodeKind::EmptyStatement, self.loc(start), Vec::new()));
        }
        self.expression_statement()
    }

    fn variable_declaration(&mut self) -> ParseResult<Node> {
        let keyword = self.advance();
        let mut declarations = Vec::new();
        loop {
            let start = self.peek().start;
            let id = self.binding_identifier()?;
            let init = if self.eat_punct("=") { Some(self.assignment()?) } else { None };
            declarations.push(Some(build(
                NodeKind::VariableDeclarator,
                self.loc(start),
                vec![("id", node(id)), ("init", opt_node(init))],
            )));
            if !self.eat_punct(",") {
                break;
            }
        }
        self.semicolon()?;
        Ok(build(
            NodeKind::VariableDeclaration,
            self.loc(keyword.start),
            vec![
                ("kind", string(keyword.raw)),
                ("declarations", Value::NodeList(declarations)),
            ],
        ))
    }

    fn function_declaration(&mut self) -> ParseResult<Node> {
        let start = self.advance().start;
        let id = self.binding_identifier()?;
        self.expect_punct("(")?;
        let mut params = Vec::new();
        while !self.peek().is_punct(")") {
            params.push(Some(self.binding_identifier()?));
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;

        self.function_depth += 1;
        let body = self.block();
        self.function_depth -= 1;
        let body = body?;

        Ok(build(
            NodeKind::FunctionDeclaration,
            self.loc(start),
            vec![
                ("id", node(id)),
                ("params", Value::NodeList(params)),
                ("body", node(body)),
            ],
        ))
    }

    fn return_statement(&mut self) -> ParseResult<Node> {
        let keyword = self.advance();
        if self.function_depth == 0 && !self.allow_return_outside_function {
            return Err(self.error_at("'return' outside of function".to_string(), keyword.start));
        }
        let next = self.peek();
        let ends = next.is_punct(";")
            || next.is_punct("}")
            || next.ty == TokenType::Eof
            || next.newline_before;
        let argument = if ends { None } else { Some(self.expression()?) };
        self.semicolon()?;
        Ok(build(
            NodeKind::ReturnStatement,
            self.loc(keyword.start),
            vec![("argument", opt_node(argument))],
        ))
    }

    fn if_statement(&mut self) -> ParseResult<Node> {
        let start = self.advance().start;
        self.expect_punct("(")?;
        let test = self.expression()?;
        self.expect_punct(")")?;
        let consequent = self.statement()?;
        let alternate = if self.peek().is_keyword("else") {
            self.advance();
            Some(self.statement()?)
        } else {
            None
        };
        Ok(build(
            NodeKind::IfStatement,
            self.loc(start),
            vec![
                ("test", node(test)),
                ("consequent", node(consequent)),
                ("alternate", opt_node(alternate)),
            ],
        ))
    }

    fn while_statement(&mut self) -> ParseResult<Node> {
        let start = self.advance().start;
        self.expect_punct("(")?;
        let test = self.expression()?;
        self.expect_punct(")")?;
        let body = self.statement()?;
        Ok(build(
            NodeKind::WhileStatement,
            self.loc(start),
            vec![("test", node(test)), ("body", node(body))],
        ))
    }

    fn block(&mut self) -> ParseResult<Node> {
        let start = self.expect_punct("{")?.start;
        let mut body = Vec::new();
        while !self.peek().is_punct("}") {
            if self.peek().ty == TokenType::Eof {
                return Err(self.unexpected());
            }
            body.push(Some(self.statement()?));
        }
        self.advance();
        Ok(build(
            NodeKind::BlockStatement,
            self.loc(start),
            vec![("body", Value::NodeList(body))],
        ))
    }

    fn expression_statement(&mut self) -> ParseResult<Node> {
        let start = self.peek().start;
        let expression = self.expression()?;
        self.semicolon()?;
        Ok(build(
            NodeKind::ExpressionStatement,
            self.loc(start),
            vec![("expression", node(expression))],
        ))
    }

    fn binding_identifier(&mut self) -> ParseResult<Node> {
        if self.peek().ty != TokenType::Identifier {
            return Err(self.unexpected());
        }
        let tok = self.advance();
        Ok(self.identifier(tok))
    }

    fn identifier(&self, tok: Tok) -> Node {
        build(
            NodeKind::Identifier,
            self.lines.location(tok.start, tok.end),
            vec![("name", string(tok.raw))],
        )
    }

    fn expression(&mut self) -> ParseResult<Node> {
        let start = self.peek().start;
        let first = self.assignment()?;
        if !self.peek().is_punct(",") {
            return Ok(first);
        }
        let mut expressions = vec![Some(first)];
        while self.eat_punct(",") {
            expressions.push(Some(self.assignment()?));
        }
        Ok(build(
            NodeKind::SequenceExpression,
            self.loc(start),
            vec![("expressions", Value::NodeList(expressions))],
        ))
    }

    fn assignment(&mut self) -> ParseResult<Node> {
        let start = self.peek().start;
        let left = self.conditional()?;
        let next = self.peek();
        if next.ty != TokenType::Punctuator || !ASSIGNMENT_OPERATORS.contains(&next.raw.as_str()) {
            return Ok(left);
        }
        if !matches!(left.kind, NodeKind::Identifier | NodeKind::MemberExpression) {
            return Err(self.error_at("invalid assignment target".to_string(), start));
        }
        let operator = self.advance().raw;
        let right = self.assignment()?;
        Ok(build(
            NodeKind::AssignmentExpression,
            self.loc(start),
            vec![("operator", string(operator)), ("left", node(left)), ("right", node(right))],
        ))
    }

    fn conditional(&mut self) -> ParseResult<Node> {
        let start = self.peek().start;
        let test = self.binary(1)?;
        if !self.eat_punct("?") {
            return Ok(test);
        }
        let consequent = self.assignment()?;
        self.expect_punct(":")?;
        let alternate = self.assignment()?;
        Ok(build(
            NodeKind::ConditionalExpression,
            self.loc(start),
            vec![
                ("test", node(test)),
                ("consequent", node(consequent)),
                ("alternate", node(alternate)),
            ],
        ))
    }

    fn binary(&mut self, min_power: u8) -> ParseResult<Node> {
        let start = self.peek().start;
        let mut left = self.unary()?;
        while let Some((power, logical)) = binary_operator(self.peek()) {
            if power < min_power {
                break;
            }
            let operator = self.advance().raw;
            let next_min = if operator == "**" { power } else { power + 1 };
            let right = self.binary(next_min)?;
            let kind = if logical {
                NodeKind::LogicalExpression
            } else {
                NodeKind::BinaryExpression
            };
            left = build(
                kind,
                self.loc(start),
                vec![("left", node(left)), ("right", node(right)), ("operator", string(operator))],
            );
        }
        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<Node> {
        let tok = self.peek();
        let is_unary = match tok.ty {
            TokenType::Punctuator => UNARY_PUNCTUATORS.contains(&tok.raw.as_str()),
            TokenType::Keyword => UNARY_KEYWORDS.contains(&tok.raw.as_str()),
            _ => false,
        };
        if !is_unary {
            return self.call_or_member();
        }
        let operator = self.advance();
        let argument = self.unary()?;
        Ok(build(
            NodeKind::UnaryExpression,
            self.loc(operator.start),
            vec![
                ("operator", string(operator.raw)),
                ("argument", node(argument)),
                ("prefix", Value::Boolean(true)),
            ],
        ))
    }

    fn call_or_member(&mut self) -> ParseResult<Node> {
        let start = self.peek().start;
        let mut expr = self.primary()?;
        loop {
            if self.eat_punct(".") {
                let name = self.peek();
                let is_name = matches!(
                    name.ty,
                    TokenType::Identifier
                        | TokenType::Keyword
                        | TokenType::Boolean
                        | TokenType::Null
                );
                if !is_name {
                    return Err(self.unexpected());
                }
                let tok = self.advance();
                let property = self.identifier(tok);
                expr = build(
                    NodeKind::MemberExpression,
                    self.loc(start),
                    vec![
                        ("object", node(expr)),
                        ("property", node(property)),
                        ("computed", Value::Boolean(false)),
                    ],
                );
            } else if self.eat_punct("[") {
                let property = self.expression()?;
                self.expect_punct("]")?;
                expr = build(
                    NodeKind::MemberExpression,
                    self.loc(start),
                    vec![
                        ("object", node(expr)),
                        ("property", node(property)),
                        ("computed", Value::Boolean(true)),
                    ],
                );
            } else if self.eat_punct("(") {
                let mut arguments = Vec::new();
                while !self.peek().is_punct(")") {
                    arguments.push(Some(self.assignment()?));
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                self.expect_punct(")")?;
                expr = build(
                    NodeKind::CallExpression,
                    self.loc(start),
                    vec![("callee", node(expr)), ("arguments", Value::NodeList(arguments))],
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> ParseResult<Node> {
        let tok = self.peek().clone();
        let literal = |kind, values| build(kind, self.lines.location(tok.start, tok.end), values);
        let node = match tok.ty {
            TokenType::Identifier => self.identifier(tok.clone()),
            TokenType::Numeric => literal(
                NodeKind::NumericLiteral,
                vec![
                    ("value", Value::Number(numeric_value(&tok.raw))),
                    ("raw", string(tok.raw.clone())),
                ],
            ),
            TokenType::String => literal(
                NodeKind::StringLiteral,
                vec![
                    ("value", Value::String(tok.cooked.clone())),
                    ("raw", string(tok.raw.clone())),
                ],
            ),
            TokenType::Boolean => literal(
                NodeKind::BooleanLiteral,
                vec![
                    ("value", Value::Boolean(tok.raw == "true")),
                    ("raw", string(tok.raw.clone())),
                ],
            ),
            TokenType::Null => literal(NodeKind::NullLiteral, Vec::new()),
            TokenType::Keyword if tok.raw == "this" => {
                literal(NodeKind::ThisExpression, Vec::new())
            }
            TokenType::Punctuator if tok.raw == "(" => {
                self.advance();
                let inner = self.expression()?;
                self.expect_punct(")")?;
                return Ok(inner);
            }
            TokenType::Punctuator if tok.raw == "[" => return self.array(),
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(node)
    }

    fn array(&mut self) -> ParseResult<Node> {
        let start = self.advance().start;
        let mut elements = Vec::new();
        let mut trailing_comma = false;
        while !self.peek().is_punct("]") {
            if self.eat_punct(",") {
                elements.push(None);
                continue;
            }
            elements.push(Some(self.assignment()?));
            trailing_comma = false;
            if !self.peek().is_punct("]") {
                self.expect_punct(",")?;
                trailing_comma = true;
            }
        }
        self.advance();
        Ok(build(
            NodeKind::ArrayExpression,
            self.loc(start),
            vec![
                ("elements", Value::NodeList(elements)),
                ("trailingComma", Value::Boolean(trailing_comma)),
            ],
        ))
    }
}

fn numeric_value(raw: &str) -> f64 {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).map_or(f64::INFINITY, |v| v as f64),
        None => raw.parse().unwrap_or(f64::NAN),
    }
}
