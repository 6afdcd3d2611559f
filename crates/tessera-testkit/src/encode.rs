//! Writes an owned tree back into a heap in program-buffer form.

use tessera_ast::{FieldKind, Node, NodeKind, Program, SourceLocation, Value};
use tessera_bridge::deserialize::POSITION_RECORD_SIZE;
use tessera_bridge::NativeError;

use crate::heap::MockHeap;

/// Heap addresses of the first word of each kind, for fault injection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Marks {
    /// Tag of the first node below the root.
    pub first_node_tag: Option<u32>,
    pub first_boolean: Option<u32>,
    pub first_string_ptr: Option<u32>,
}

/// A program buffer and its position buffer, living in a [`MockHeap`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedProgram {
    pub program: u32,
    pub positions: u32,
    pub position_count: u32,
    /// Every block the encoding owns, strings included.
    pub allocations: Vec<u32>,
    pub marks: Marks,
}

/// Word offsets recorded while encoding, turned into addresses once the
/// program buffer has a home.
#[derive(Default)]
struct WordMarks {
    first_node_tag: Option<usize>,
    first_boolean: Option<usize>,
    first_string_ptr: Option<usize>,
}

struct Encoder<'h> {
    heap: &'h mut MockHeap,
    words: Vec<u32>,
    positions: Vec<u32>,
    allocations: Vec<u32>,
    marks: WordMarks,
}

/// Encode `program` into `heap`.
///
/// Token emission follows `tokens`; a program without a token list encodes
/// an empty one if tokens are requested. On allocation failure every block
/// allocated so far is freed again.
pub fn encode(
    heap: &mut MockHeap,
    program: &Program,
    tokens: bool,
) -> Result<EncodedProgram, NativeError> {
    let mut encoder = Encoder {
        heap,
        words: Vec::new(),
        positions: Vec::new(),
        allocations: Vec::new(),
        marks: WordMarks::default(),
    };
    match encoder.program(program, tokens) {
        Ok(encoded) => Ok(encoded),
        Err(err) => {
            for ptr in encoder.allocations.drain(..) {
                encoder.heap.free(ptr);
            }
            Err(err)
        }
    }
}

fn out_of_memory(what: &str) -> NativeError {
    NativeError::Call {
        export: "parse",
        cause: format!("out of memory while encoding {what}"),
    }
}

impl Encoder<'_> {
    fn program(&mut self, program: &Program, tokens: bool) -> Result<EncodedProgram, NativeError> {
        self.words.push(NodeKind::Program.tag());
        self.location(program.loc);
        self.words.push(program.body.len() as u32);
        for statement in &program.body {
            self.node(Some(statement))?;
        }

        self.words.push(program.comments.len() as u32);
        for comment in &program.comments {
            self.words.push(comment.kind.code());
            self.location(comment.loc);
            self.string(Some(&comment.value))?;
        }

        if tokens {
            let list = program.tokens.as_deref().unwrap_or_default();
            self.words.push(list.len() as u32);
            for token in list {
                self.words.push(token.kind.code());
                self.location(token.loc);
                self.string(Some(&token.value))?;
            }
        }

        let program_ptr = self.alloc((self.words.len() * 4) as u32, "program buffer")?;
        let bytes: Vec<u8> = self.words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.heap.write(program_ptr, &bytes);

        let position_count = (self.positions.len() / 4) as u32;
        let positions_ptr = self.alloc(position_count * POSITION_RECORD_SIZE, "position buffer")?;
        let bytes: Vec<u8> = self.positions.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.heap.write(positions_ptr, &bytes);

        let at = |offset: Option<usize>| offset.map(|index| program_ptr + index as u32 * 4);
        Ok(EncodedProgram {
            program: program_ptr,
            positions: positions_ptr,
            position_count,
            allocations: std::mem::take(&mut self.allocations),
            marks: Marks {
                first_node_tag: at(self.marks.first_node_tag),
                first_boolean: at(self.marks.first_boolean),
                first_string_ptr: at(self.marks.first_string_ptr),
            },
        })
    }

    fn node(&mut self, node: Option<&Node>) -> Result<(), NativeError> {
        let Some(node) = node else {
            self.words.push(0);
            return Ok(());
        };
        self.marks.first_node_tag.get_or_insert(self.words.len());
        self.words.push(node.kind.tag());
        self.location(node.loc);

        for field in node.kind.fields() {
            match (field.kind, node.field(field.name)) {
                (FieldKind::Node, Some(Value::Node(child))) => self.node(child.as_deref())?,
                (FieldKind::Node, _) => self.node(None)?,
                (FieldKind::NodeList, Some(Value::NodeList(items))) => {
                    self.words.push(items.len() as u32);
                    for item in items {
                        self.node(item.as_ref())?;
                    }
                }
                (FieldKind::NodeList, _) => self.words.push(0),
                (FieldKind::String, Some(Value::String(text))) => self.string(text.as_deref())?,
                (FieldKind::String, _) => self.string(None)?,
                (FieldKind::Number, Some(Value::Number(value))) => self.number(*value),
                (FieldKind::Number, _) => self.number(0.0),
                (FieldKind::Boolean, Some(Value::Boolean(value))) => self.boolean(*value),
                (FieldKind::Boolean, _) => self.boolean(false),
            }
        }
        Ok(())
    }

    fn location(&mut self, loc: SourceLocation) {
        self.positions.extend([loc.start.line, loc.start.column, loc.end.line, loc.end.column]);
    }

    fn string(&mut self, text: Option<&str>) -> Result<(), NativeError> {
        let Some(text) = text else {
            self.words.push(0);
            return Ok(());
        };
        let ptr = self.alloc(text.len() as u32, "string")?;
        self.heap.write(ptr, text.as_bytes());
        self.marks.first_string_ptr.get_or_insert(self.words.len());
        self.words.extend([ptr, text.len() as u32]);
        Ok(())
    }

    /// Program buffers start 8-byte aligned, so relative alignment is
    /// enough.
    fn number(&mut self, value: f64) {
        if self.words.len() % 2 != 0 {
            self.words.push(0);
        }
        let bits = value.to_bits();
        self.words.extend([bits as u32, (bits >> 32) as u32]);
    }

    fn boolean(&mut self, value: bool) {
        self.marks.first_boolean.get_or_insert(self.words.len());
        self.words.push(u32::from(value));
    }

    fn alloc(&mut self, size: u32, what: &str) -> Result<u32, NativeError> {
        let ptr = self.heap.malloc(size);
        if ptr == 0 {
            return Err(out_of_memory(what));
        }
        self.allocations.push(ptr);
        Ok(ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_ast::{Field, Position};
    use tessera_bridge::deserialize::{deserialize, ResultBuffers};
    use tessera_bridge::ParserOptions;
    use tessera_heap::HeapView;

    fn loc(start: u32, end: u32) -> SourceLocation {
        SourceLocation::new(Position::new(1, start), Position::new(1, end))
    }

    #[test]
    fn decodes_back_to_the_same_tree() {
        let literal = Node::new(
            NodeKind::NumericLiteral,
            loc(0, 3),
            vec![
                Field {
                    name: "value",
                    value: Value::Number(1.5),
                },
                Field {
                    name: "raw",
                    value: Value::String(Some("1.5".into())),
                },
            ],
        );
        let statement = Node::new(
            NodeKind::ExpressionStatement,
            loc(0, 3),
            vec![
                Field {
                    name: "expression",
                    value: Value::Node(Some(Box::new(literal))),
                },
                Field {
                    name: "directive",
                    value: Value::String(None),
                },
            ],
        );
        let program = Program {
            loc: loc(0, 3),
            body: vec![statement],
            comments: Vec::new(),
            tokens: None,
        };

        let mut heap = MockHeap::new();
        let encoded = encode(&mut heap, &program, false).unwrap();
        assert_eq!(encoded.position_count, 3);
        assert_eq!(encoded.program % 8, 0);
        assert!(encoded.marks.first_boolean.is_none());

        let buffers = ResultBuffers {
            program: encoded.program,
            positions: encoded.positions,
            position_count: encoded.position_count,
        };
        let decoded =
            deserialize(buffers, HeapView::new(heap.bytes()), &ParserOptions::default()).unwrap();
        assert_eq!(decoded, program);
    }

    #[test]
    fn allocation_failure_frees_partial_encoding() {
        let program = Program {
            loc: loc(0, 0),
            body: Vec::new(),
            comments: vec![tessera_ast::Comment {
                kind: tessera_ast::CommentKind::Line,
                value: "x".repeat(64),
                loc: loc(0, 66),
            }],
            tokens: None,
        };
        let mut heap = MockHeap::with_limit(96);
        assert!(encode(&mut heap, &program, false).is_err());
        assert_eq!(heap.live_allocations(), 0);
    }
}
