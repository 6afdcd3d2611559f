//! Program-buffer decoding.
//!
//! The parser module serializes its tree as a flat sequence of little-endian
//! words (schema version [`SCHEMA_VERSION`](tessera_ast::SCHEMA_VERSION)):
//!
//! ```text
//! node      := tag:u32 (0 = absent) field*      fields in schema-table order
//! node-list := count:u32 node{count}
//! string    := ptr:u32 (0 = absent) | ptr:u32 len:u32   bytes live at [ptr, ptr+len)
//! number    := [pad:u32] f64                     8-byte aligned
//! boolean   := u32 (0 or 1)
//! program   := Program-node comment-list [token-list]
//! ```
//!
//! Every node, then every comment, then every token takes the next location
//! index as it is decoded; index `i` selects record `i` of the position
//! buffer. Everything is copied into owned values, so the returned tree does
//! not borrow the heap.

mod fault;
mod positions;

pub use fault::ProtocolFault;
pub use positions::{PositionTable, POSITION_RECORD_SIZE};

use tessera_ast::{
    Comment, CommentKind, Field, FieldKind, Node, NodeKind, NodeSchema, Program, SourceLocation,
    Token, TokenKind, Value,
};
use tessera_heap::{HeapView, WordCursor};

use crate::options::ParserOptions;

/// Deepest node nesting accepted before decoding gives up.
pub const MAX_NESTING_DEPTH: usize = 1024;

/// The three values a successful result exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultBuffers {
    pub program: u32,
    pub positions: u32,
    pub position_count: u32,
}

/// Decode a program buffer into an owned tree.
///
/// Either the whole tree is returned or a [`ProtocolFault`]; no partial tree
/// escapes.
pub fn deserialize(
    buffers: ResultBuffers,
    heap: HeapView<'_>,
    options: &ParserOptions,
) -> Result<Program, ProtocolFault> {
    heap.check_aligned("program buffer", buffers.program, 4)?;
    let positions = PositionTable::new(heap, buffers.positions, buffers.position_count)?;
    let mut decoder = Deserializer {
        cursor: heap.cursor(buffers.program),
        positions,
        next_index: 0,
    };
    let program = decoder.program(options.tokens)?;
    log::debug!(
        "decoded {} locations from program buffer at {:#x} ({} position records)",
        decoder.next_index,
        buffers.program,
        buffers.position_count
    );
    Ok(program)
}

struct Deserializer<'h> {
    cursor: WordCursor<'h>,
    positions: PositionTable<'h>,
    next_index: u32,
}

/// What the innermost open node reads next.
enum Next {
    Node,
    List,
    String,
    Number,
    Boolean,
    Done,
}

/// A node whose fields are still being read.
struct Frame {
    schema: &'static NodeSchema,
    loc: SourceLocation,
    fields: Vec<Field>,
    /// The `NodeList` field being read: elements so far and how many remain.
    list: Option<(Vec<Option<Node>>, u32)>,
}

impl Frame {
    fn next(&mut self) -> Next {
        match self.list.take() {
            Some((nodes, 0)) => self.push(Value::NodeList(nodes)),
            Some((nodes, remaining)) => {
                self.list = Some((nodes, remaining - 1));
                return Next::Node;
            }
            None => {}
        }
        match self.schema.fields.get(self.fields.len()).map(|field| field.kind) {
            Some(FieldKind::Node) => Next::Node,
            Some(FieldKind::NodeList) => Next::List,
            Some(FieldKind::String) => Next::String,
            Some(FieldKind::Number) => Next::Number,
            Some(FieldKind::Boolean) => Next::Boolean,
            None => Next::Done,
        }
    }

    /// Store the value of the next schema field.
    fn push(&mut self, value: Value) {
        let name = self.schema.fields[self.fields.len()].name;
        self.fields.push(Field { name, value });
    }

    fn finish(self) -> Node {
        Node::new(self.schema.kind, self.loc, self.fields)
    }
}

fn push_field(stack: &mut [Frame], value: Value) {
    if let Some(frame) = stack.last_mut() {
        frame.push(value);
    }
}

/// Hand a finished (or absent) node to its parent: the open list of the
/// innermost frame, its next node field, or the root list.
fn deliver(stack: &mut [Frame], root: &mut Vec<Option<Node>>, node: Option<Node>) {
    match stack.last_mut() {
        None => root.push(node),
        Some(Frame {
            list: Some((nodes, _)),
            ..
        }) => nodes.push(node),
        Some(frame) => frame.push(Value::Node(node.map(Box::new))),
    }
}

impl<'h> Deserializer<'h> {
    fn program(&mut self, tokens: bool) -> Result<Program, ProtocolFault> {
        let tag = self.cursor.next_u32()?;
        if tag != NodeKind::Program.tag() {
            let found = match NodeKind::schema_for_tag(tag) {
                Some(schema) => schema.name.to_string(),
                None if tag == 0 => "an absent node".to_string(),
                None => format!("unknown tag {tag}"),
            };
            return Err(ProtocolFault::UnexpectedRoot { found });
        }
        let loc = self.location()?;
        let body = self
            .node_list()?
            .into_iter()
            .map(|statement| {
                statement.ok_or(ProtocolFault::UnexpectedNull {
                    kind: "Program",
                    field: "body",
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let comments = self.comments()?;
        let tokens = if tokens { Some(self.tokens()?) } else { None };

        Ok(Program {
            loc,
            body,
            comments,
            tokens,
        })
    }

    /// Decode a node list and everything below it.
    ///
    /// Nodes under construction live on an explicit frame stack rather than
    /// the call stack, so nesting depth costs heap memory only.
    fn node_list(&mut self) -> Result<Vec<Option<Node>>, ProtocolFault> {
        let mut remaining = self.count()?;
        let mut root = Vec::with_capacity(remaining as usize);
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            let next = match stack.last_mut() {
                Some(frame) => frame.next(),
                None if remaining == 0 => return Ok(root),
                None => {
                    remaining -= 1;
                    Next::Node
                }
            };

            match next {
                Next::Node => match self.open(stack.len())? {
                    Some(frame) => stack.push(frame),
                    None => deliver(&mut stack, &mut root, None),
                },
                Next::List => {
                    let count = self.count()?;
                    if let Some(frame) = stack.last_mut() {
                        frame.list = Some((Vec::with_capacity(count as usize), count));
                    }
                }
                Next::String => {
                    let value = Value::String(self.string()?);
                    push_field(&mut stack, value);
                }
                Next::Number => {
                    let value = Value::Number(self.cursor.next_f64()?);
                    push_field(&mut stack, value);
                }
                Next::Boolean => {
                    let value = Value::Boolean(self.boolean()?);
                    push_field(&mut stack, value);
                }
                Next::Done => {
                    if let Some(frame) = stack.pop() {
                        let node = frame.finish();
                        deliver(&mut stack, &mut root, Some(node));
                    }
                }
            }
        }
    }

    /// Read a node tag. A non-zero tag opens a frame for the node at
    /// `depth` and takes the next location index.
    fn open(&mut self, depth: usize) -> Result<Option<Frame>, ProtocolFault> {
        let addr = self.cursor.addr();
        let tag = self.cursor.next_u32()?;
        if tag == 0 {
            return Ok(None);
        }
        let schema =
            NodeKind::schema_for_tag(tag).ok_or(ProtocolFault::UnknownNodeTag { tag, addr })?;
        if depth >= MAX_NESTING_DEPTH {
            return Err(ProtocolFault::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }

        let loc = self.location()?;
        log::trace!("decoding {} at location index {}", schema.name, self.next_index - 1);
        Ok(Some(Frame {
            schema,
            loc,
            fields: Vec::with_capacity(schema.fields.len()),
            list: None,
        }))
    }

    /// Read a list count, rejecting counts that could not possibly fit in
    /// the rest of the heap before anything is allocated for them.
    fn count(&mut self) -> Result<u32, ProtocolFault> {
        let addr = self.cursor.addr();
        let count = self.cursor.next_u32()?;
        let remaining = self.cursor.words_remaining();
        if count as usize > remaining {
            return Err(ProtocolFault::ListTooLong {
                addr,
                count,
                remaining,
            });
        }
        Ok(count)
    }

    fn string(&mut self) -> Result<Option<String>, ProtocolFault> {
        let ptr = self.cursor.next_u32()?;
        if ptr == 0 {
            return Ok(None);
        }
        let len = self.cursor.next_u32()?;
        let bytes = self.cursor.heap().bytes(ptr, len as usize)?;
        let value = match std::str::from_utf8(bytes) {
            Ok(text) => text.to_owned(),
            Err(err) => {
                log::debug!("string at {ptr:#x} is not well-formed UTF-8 ({err}), replacing");
                String::from_utf8_lossy(bytes).into_owned()
            }
        };
        Ok(Some(value))
    }

    fn boolean(&mut self) -> Result<bool, ProtocolFault> {
        let addr = self.cursor.addr();
        match self.cursor.next_u32()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(ProtocolFault::InvalidBoolean { addr, value }),
        }
    }

    fn location(&mut self) -> Result<SourceLocation, ProtocolFault> {
        let index = self.next_index;
        self.next_index = index.saturating_add(1);
        self.positions.get(index)
    }

    fn comments(&mut self) -> Result<Vec<Comment>, ProtocolFault> {
        let count = self.count()?;
        let mut comments = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let addr = self.cursor.addr();
            let code = self.cursor.next_u32()?;
            let kind = CommentKind::from_code(code)
                .ok_or(ProtocolFault::UnknownCommentKind { code, addr })?;
            let loc = self.location()?;
            let value = self.string()?.unwrap_or_default();
            comments.push(Comment { kind, value, loc });
        }
        Ok(comments)
    }

    fn tokens(&mut self) -> Result<Vec<Token>, ProtocolFault> {
        let count = self.count()?;
        let mut tokens = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let addr = self.cursor.addr();
            let code = self.cursor.next_u32()?;
            let kind = TokenKind::from_code(code)
                .ok_or(ProtocolFault::UnknownTokenKind { code, addr })?;
            let loc = self.location()?;
            let value = self.string()?.unwrap_or_default();
            tokens.push(Token { kind, value, loc });
        }
        Ok(tokens)
    }
}
