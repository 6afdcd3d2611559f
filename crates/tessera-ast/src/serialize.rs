//! ESTree-shaped JSON output.
//!
//! Nodes serialize as objects with a `type` key, a `loc` key and one key per
//! schema field, which is the shape JavaScript tooling expects.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::node::{Node, Value};
use crate::program::{Comment, Program, Token};

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
        map.serialize_entry("type", self.kind.name())?;
        map.serialize_entry("loc", &self.loc)?;
        for field in &self.fields {
            map.serialize_entry(field.name, &field.value)?;
        }
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Node(node) => node.serialize(serializer),
            Value::NodeList(nodes) => nodes.serialize(serializer),
            Value::String(s) => s.serialize(serializer),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl Serialize for Program {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.tokens.is_some() { 5 } else { 4 };
        let mut program = serializer.serialize_struct("Program", len)?;
        program.serialize_field("type", "Program")?;
        program.serialize_field("loc", &self.loc)?;
        program.serialize_field("body", &self.body)?;
        program.serialize_field("comments", &self.comments)?;
        if let Some(tokens) = &self.tokens {
            program.serialize_field("tokens", tokens)?;
        }
        program.end()
    }
}

impl Serialize for Comment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut comment = serializer.serialize_struct("Comment", 3)?;
        comment.serialize_field("type", self.kind.name())?;
        comment.serialize_field("value", &self.value)?;
        comment.serialize_field("loc", &self.loc)?;
        comment.end()
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut token = serializer.serialize_struct("Token", 3)?;
        token.serialize_field("type", self.kind.name())?;
        token.serialize_field("value", &self.value)?;
        token.serialize_field("loc", &self.loc)?;
        token.end()
    }
}
