use crate::node::Node;
use crate::program::{Comment, Program, Token};

/// Trait for implementing the visitor pattern over a decoded tree.
///
/// Every method has a default that keeps walking, so implementors override
/// only what they care about. Returning an error stops the walk.
pub trait Visitor: Sized {
    type Error;

    fn visit_program(&mut self, program: &Program) -> Result<(), Self::Error> {
        walk_program(self, program)
    }

    fn visit_node(&mut self, node: &Node) -> Result<(), Self::Error> {
        walk_node(self, node)
    }

    fn visit_comment(&mut self, _comment: &Comment) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_token(&mut self, _token: &Token) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub fn walk_program<V: Visitor>(visitor: &mut V, program: &Program) -> Result<(), V::Error> {
    for statement in &program.body {
        visitor.visit_node(statement)?;
    }
    for comment in &program.comments {
        visitor.visit_comment(comment)?;
    }
    for token in program.tokens.iter().flatten() {
        visitor.visit_token(token)?;
    }
    Ok(())
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) -> Result<(), V::Error> {
    for child in node.children() {
        visitor.visit_node(child)?;
    }
    Ok(())
}
