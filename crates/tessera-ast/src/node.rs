use crate::kind::NodeKind;
use crate::location::SourceLocation;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Node(Option<Box<Node>>),
    NodeList(Vec<Option<Node>>),
    String(Option<String>),
    Number(f64),
    Boolean(bool),
}

/// A named field of a node, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: Value,
}

/// An owned syntax tree node.
///
/// `fields` holds exactly the fields listed for `kind` in the schema table,
/// in the same order. Nodes own their children; nothing in a node refers
/// back into parser module memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub loc: SourceLocation,
    pub fields: Vec<Field>,
}

impl Node {
    pub fn new(kind: NodeKind, loc: SourceLocation, fields: Vec<Field>) -> Self {
        Self { kind, loc, fields }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    /// A single child node, if the field exists and is present.
    pub fn child(&self, name: &str) -> Option<&Node> {
        match self.field(name)? {
            Value::Node(node) => node.as_deref(),
            _ => None,
        }
    }

    /// A child list, if the field exists.
    pub fn list(&self, name: &str) -> Option<&[Option<Node>]> {
        match self.field(name)? {
            Value::NodeList(nodes) => Some(nodes),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.field(name)? {
            Value::String(s) => s.as_deref(),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.field(name)? {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.field(name)? {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// All present child nodes, in field order then list order.
    pub fn children(&self) -> impl Iterator<Item = &Node> + '_ {
        self.fields.iter().flat_map(|field| {
            let (single, list): (Option<&Node>, &[Option<Node>]) = match &field.value {
                Value::Node(node) => (node.as_deref(), &[]),
                Value::NodeList(nodes) => (None, nodes.as_slice()),
                _ => (None, &[]),
            };
            single.into_iter().chain(list.iter().flatten())
        })
    }

    /// Number of nodes in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self.children().map(Node::subtree_len).sum::<usize>()
    }
}
