use thiserror::Error;

use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagKind {
    Lex,
    Parse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    pub kind: DiagKind,
    pub span: Span,
    pub message: String,
}

impl Diag {
    #[inline]
    pub fn parse(span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: DiagKind::Parse,
            span,
            message: message.into(),
        }
    }
}

/// Every diagnostic collected while lexing and parsing one file.
///
/// The first entry is the one that stopped the parser; lexer diagnostics come
/// first when both are present.
#[derive(Debug, Clone, Error)]
#[error("{}", self.first_message())]
pub struct ParseFailure {
    pub diags: Vec<Diag>,
}

impl ParseFailure {
    pub fn first(&self) -> Option<&Diag> {
        self.diags.first()
    }

    fn first_message(&self) -> &str {
        self.first().map_or("parse failed", |d| d.message.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    #[default]
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid numeric literal")]
    InvalidNumber,
    #[error("unterminated raw string")]
    UnterminatedString,
    #[error("unterminated comment")]
    UnterminatedComment,
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Default)]
#[error("{kind}: {span:?}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    #[inline]
    pub fn diag(&self) -> Diag {
        Diag {
            kind: DiagKind::Lex,
            span: self.span,
            message: self.kind.to_string(),
        }
    }
}

/// 1-based line/column pair, columns counted in bytes like `go/token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Byte offset to line/column translation for one source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(src: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            memchr::memchr_iter(b'\n', src.as_bytes()).map(|nl| (nl + 1) as u32),
        );
        Self { line_starts }
    }

    pub fn position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        Position {
            line: line as u32 + 1,
            column: offset - self.line_starts[line] + 1,
        }
    }
}
