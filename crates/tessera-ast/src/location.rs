use serde::Serialize;

/// A point in the source text. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Start and end of a node, comment or token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

impl SourceLocation {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// True if `start` does not come after `end` in document order.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// True if this location ends at or before `other` starts.
    pub fn precedes(&self, other: &SourceLocation) -> bool {
        self.end <= other.start
    }

    /// True if `other` lies entirely within this location.
    pub fn contains(&self, other: &SourceLocation) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}
