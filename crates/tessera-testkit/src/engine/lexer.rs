use tessera_ast::{Comment, CommentKind, Position, SourceLocation, TokenKind};

use super::EngineError;

const KEYWORDS: &[&str] = &[
    "break", "const", "continue", "delete", "do", "else", "for", "function", "if", "in",
    "instanceof", "let", "new", "return", "this", "throw", "typeof", "var", "void", "while",
];

/// Longest first, so the first prefix match is the longest one.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "**", "==", "!=", "<=", ">=", "&&", "||", "??", "+=", "-=", "*=", "/=", "%=",
    "(", ")", "{", "}", "[", "]", ";", ",", "<", ">", "+", "-", "*", "/", "%", "!", "=", ".",
    "?", ":", "~",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenType {
    Identifier,
    Keyword,
    Boolean,
    Null,
    Numeric,
    String,
    Punctuator,
    Eof,
}

impl TokenType {
    pub(crate) fn token_kind(self) -> Option<TokenKind> {
        Some(match self {
            TokenType::Identifier => TokenKind::Identifier,
            TokenType::Keyword => TokenKind::Keyword,
            TokenType::Boolean => TokenKind::Boolean,
            TokenType::Null => TokenKind::Null,
            TokenType::Numeric => TokenKind::Numeric,
            TokenType::String => TokenKind::String,
            TokenType::Punctuator => TokenKind::Punctuator,
            TokenType::Eof => return None,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Tok {
    pub ty: TokenType,
    /// Source text of the token.
    pub raw: String,
    /// Cooked value of a string literal.
    pub cooked: Option<String>,
    pub start: usize,
    pub end: usize,
    pub newline_before: bool,
}

impl Tok {
    pub(crate) fn is(&self, ty: TokenType, raw: &str) -> bool {
        self.ty == ty && self.raw == raw
    }

    pub(crate) fn is_punct(&self, raw: &str) -> bool {
        self.is(TokenType::Punctuator, raw)
    }

    pub(crate) fn is_keyword(&self, raw: &str) -> bool {
        self.is(TokenType::Keyword, raw)
    }
}

/// Maps byte offsets to 1-based lines and 0-based character columns.
pub(crate) struct LineIndex<'s> {
    source: &'s str,
    line_starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { source, line_starts }
    }

    pub(crate) fn position(&self, offset: usize) -> Position {
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        let column = self.source[start..offset].chars().count();
        Position::new(line as u32 + 1, column as u32)
    }

    pub(crate) fn location(&self, start: usize, end: usize) -> SourceLocation {
        SourceLocation::new(self.position(start), self.position(end))
    }
}

pub(crate) struct Lexer<'s> {
    source: &'s str,
    pos: usize,
    lines: &'s LineIndex<'s>,
    comments: Vec<Comment>,
}

impl<'s> Lexer<'s> {
    pub(crate) fn new(source: &'s str, lines: &'s LineIndex<'s>) -> Self {
        Self {
            source,
            pos: 0,
            lines,
            comments: Vec::new(),
        }
    }

    /// Lex the whole source. The last token is always `Eof`.
    pub(crate) fn tokenize(mut self) -> Result<(Vec<Tok>, Vec<Comment>), EngineError> {
        let mut tokens = Vec::new();
        if self.source.starts_with("#!") {
            let end = self.line_end(0);
            self.push_comment(CommentKind::InterpreterDirective, 0, end, 2, end);
            self.pos = end;
        }
        loop {
            let newline_before = self.skip_trivia()?;
            let token = self.next_token(newline_before)?;
            let done = token.ty == TokenType::Eof;
            tokens.push(token);
            if done {
                return Ok((tokens, self.comments));
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn rest(&self) -> &'s str {
        &self.source[self.pos..]
    }

    fn line_end(&self, from: usize) -> usize {
        self.source[from..].find('\n').map_or(self.source.len(), |i| from + i)
    }

    fn error(&self, message: String, offset: usize) -> EngineError {
        let at = self.lines.position(offset);
        EngineError::new(message, at.line, at.column)
    }

    fn push_comment(
        &mut self,
        kind: CommentKind,
        start: usize,
        end: usize,
        value_start: usize,
        value_end: usize,
    ) {
        self.comments.push(Comment {
            kind,
            value: self.source[value_start..value_end].to_string(),
            loc: self.lines.location(start, end),
        });
    }

    /// Skip whitespace and comments, reporting whether a line break was
    /// crossed.
    fn skip_trivia(&mut self) -> Result<bool, EngineError> {
        let mut newline = false;
        loop {
            let rest = self.rest();
            if let Some(ch) = rest.chars().next().filter(|c| c.is_whitespace()) {
                newline |= ch == '\n';
                self.pos += ch.len_utf8();
            } else if rest.starts_with("//") {
                let start = self.pos;
                let end = self.line_end(start);
                self.push_comment(CommentKind::Line, start, end, start + 2, end);
                self.pos = end;
            } else if rest.starts_with("/*") {
                let start = self.pos;
                let close = rest[2..]
                    .find("*/")
                    .ok_or_else(|| self.error("unterminated comment".to_string(), start))?;
                let end = start + 2 + close + 2;
                newline |= self.source[start..end].contains('\n');
                self.push_comment(CommentKind::Block, start, end, start + 2, end - 2);
                self.pos = end;
            } else {
                return Ok(newline);
            }
        }
    }

    fn next_token(&mut self, newline_before: bool) -> Result<Tok, EngineError> {
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(self.token(TokenType::Eof, start, None, newline_before));
        };

        let (ty, cooked) = if is_identifier_start(ch) {
            self.take_while(is_identifier_part);
            let word = &self.source[start..self.pos];
            let ty = match word {
                "true" | "false" => TokenType::Boolean,
                "null" => TokenType::Null,
                _ if KEYWORDS.contains(&word) => TokenType::Keyword,
                _ => TokenType::Identifier,
            };
            (ty, None)
        } else if ch.is_ascii_digit()
            || (ch == '.' && self.rest()[1..].starts_with(|c: char| c.is_ascii_digit()))
        {
            self.number(start)?;
            (TokenType::Numeric, None)
        } else if ch == '"' || ch == '\'' {
            (TokenType::String, Some(self.string(ch, start)?))
        } else if let Some(punct) = PUNCTUATORS.iter().find(|p| self.rest().starts_with(**p)) {
            self.pos += punct.len();
            (TokenType::Punctuator, None)
        } else {
            return Err(self.error(format!("unexpected character '{ch}'"), start));
        };
        Ok(self.token(ty, start, cooked, newline_before))
    }

    fn token(
        &self,
        ty: TokenType,
        start: usize,
        cooked: Option<String>,
        newline_before: bool,
    ) -> Tok {
        Tok {
            ty,
            raw: self.source[start..self.pos].to_string(),
            cooked,
            start,
            end: self.pos,
            newline_before,
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek().filter(|c| pred(*c)) {
            self.pos += ch.len_utf8();
        }
    }

    fn number(&mut self, start: usize) -> Result<(), EngineError> {
        if self.rest().starts_with("0x") || self.rest().starts_with("0X") {
            self.pos += 2;
            self.take_while(|c| c.is_ascii_hexdigit());
            if self.pos == start + 2 {
                return Err(self.error("invalid hexadecimal literal".to_string(), start));
            }
        } else {
            self.take_while(|c| c.is_ascii_digit());
            if self.peek() == Some('.') {
                self.pos += 1;
                self.take_while(|c| c.is_ascii_digit());
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                self.pos += 1;
                if matches!(self.peek(), Some('+' | '-')) {
                    self.pos += 1;
                }
                let digits = self.pos;
                self.take_while(|c| c.is_ascii_digit());
                if self.pos == digits {
                    return Err(self.error("invalid numeric literal".to_string(), start));
                }
            }
        }
        if self.peek().is_some_and(is_identifier_start) {
            return Err(self.error("identifier directly after number".to_string(), self.pos));
        }
        Ok(())
    }

    fn string(&mut self, quote: char, start: usize) -> Result<String, EngineError> {
        self.pos += 1;
        let mut cooked = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(self.error("unterminated string literal".to_string(), start));
            };
            self.pos += ch.len_utf8();
            match ch {
                '\n' => return Err(self.error("unterminated string literal".to_string(), start)),
                c if c == quote => return Ok(cooked),
                '\\' => {
                    let Some(escaped) = self.peek() else {
                        return Err(self.error("unterminated string literal".to_string(), start));
                    };
                    self.pos += escaped.len_utf8();
                    match escaped {
                        'n' => cooked.push('\n'),
                        't' => cooked.push('\t'),
                        'r' => cooked.push('\r'),
                        '0' => cooked.push('\0'),
                        'u' => cooked.push(self.unicode_escape()?),
                        '\n' => {}
                        other => cooked.push(other),
                    }
                }
                c => cooked.push(c),
            }
        }
    }

    /// `\uXXXX`. Lone surrogates are kept as U+FFFD.
    fn unicode_escape(&mut self) -> Result<char, EngineError> {
        let digits = self.rest().get(..4).filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()));
        let Some(digits) = digits else {
            return Err(self.error("invalid unicode escape".to_string(), self.pos));
        };
        self.pos += 4;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| self.error("invalid unicode escape".to_string(), self.pos))?;
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Tok>, Vec<Comment>) {
        let lines = LineIndex::new(source);
        Lexer::new(source, &lines).tokenize().unwrap()
    }

    #[test]
    fn splits_punctuators_greedily() {
        let (tokens, _) = lex("a !== b ?? c");
        let raw: Vec<_> = tokens.iter().map(|t| t.raw.as_str()).collect();
        assert_eq!(raw, ["a", "!==", "b", "??", "c", ""]);
        assert_eq!(tokens[1].ty, TokenType::Punctuator);
        assert_eq!(tokens.last().map(|t| t.ty), Some(TokenType::Eof));
    }

    #[test]
    fn classifies_words() {
        let (tokens, _) = lex("const t = true; null");
        let types: Vec<_> = tokens.iter().map(|t| t.ty).collect();
        assert_eq!(
            types,
            [
                TokenType::Keyword,
                TokenType::Identifier,
                TokenType::Punctuator,
                TokenType::Boolean,
                TokenType::Punctuator,
                TokenType::Null,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn collects_comments_with_locations() {
        let (tokens, comments) = lex("#!/usr/bin/env node\n// line\nx /* block\n */ y");
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[0].kind, CommentKind::InterpreterDirective);
        assert_eq!(comments[0].value, "/usr/bin/env node");
        assert_eq!(comments[1].value, " line");
        assert_eq!(comments[1].loc.start, Position::new(2, 0));
        assert_eq!(comments[2].kind, CommentKind::Block);
        assert_eq!(comments[2].loc.end, Position::new(4, 3));
        assert!(tokens[1].newline_before);
    }

    #[test]
    fn cooks_string_escapes() {
        let (tokens, _) = lex(r#"'a\né\'' "q""#);
        assert_eq!(tokens[0].cooked.as_deref(), Some("a\né'"));
        assert_eq!(tokens[0].raw, r"'a\né\''");
        assert_eq!(tokens[1].cooked.as_deref(), Some("q"));
    }

    #[test]
    fn columns_count_characters() {
        let source = "'é' + x";
        let lines = LineIndex::new(source);
        let offset = source.find('x').unwrap();
        assert_eq!(lines.position(offset), Position::new(1, 6));
    }

    #[test]
    fn reports_unterminated_strings() {
        let lines = LineIndex::new("x = 'abc");
        let err = Lexer::new("x = 'abc", &lines).tokenize().unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!((err.line, err.column), (1, 4));
    }
}
