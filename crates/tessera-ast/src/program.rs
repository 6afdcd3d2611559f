use crate::location::SourceLocation;
use crate::node::Node;

/// Root of a decoded syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub loc: SourceLocation,
    pub body: Vec<Node>,
    pub comments: Vec<Comment>,
    /// Raw tokens, present only when token emission was requested.
    pub tokens: Option<Vec<Token>>,
}

impl Program {
    /// Number of nodes in the tree, including the root.
    pub fn node_count(&self) -> usize {
        1 + self.body.iter().map(Node::subtree_len).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
    Line,
    Block,
    InterpreterDirective,
}

impl CommentKind {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Line),
            1 => Some(Self::Block),
            2 => Some(Self::InterpreterDirective),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    /// ESTree `type` of the comment.
    pub fn name(self) -> &'static str {
        match self {
            Self::Line => "CommentLine",
            Self::Block => "CommentBlock",
            Self::InterpreterDirective => "InterpreterDirective",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub value: String,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Boolean,
    Identifier,
    Keyword,
    Null,
    Numeric,
    BigInt,
    Punctuator,
    String,
    RegularExpression,
    Template,
    JsxText,
}

impl TokenKind {
    const ALL: [TokenKind; 11] = [
        Self::Boolean,
        Self::Identifier,
        Self::Keyword,
        Self::Null,
        Self::Numeric,
        Self::BigInt,
        Self::Punctuator,
        Self::String,
        Self::RegularExpression,
        Self::Template,
        Self::JsxText,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Identifier => "Identifier",
            Self::Keyword => "Keyword",
            Self::Null => "Null",
            Self::Numeric => "Numeric",
            Self::BigInt => "BigInt",
            Self::Punctuator => "Punctuator",
            Self::String => "String",
            Self::RegularExpression => "RegularExpression",
            Self::Template => "Template",
            Self::JsxText => "JSXText",
        }
    }
}

/// A raw lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub loc: SourceLocation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..3 {
            assert_eq!(CommentKind::from_code(code).map(CommentKind::code), Some(code));
        }
        for code in 0..11 {
            assert_eq!(TokenKind::from_code(code).map(TokenKind::code), Some(code));
        }
        assert_eq!(CommentKind::from_code(3), None);
        assert_eq!(TokenKind::from_code(11), None);
    }
}
