//! Declaration-level Go parser (Logos lexer + recursive descent).
//!
//! - The lexer uses Logos and implements Go semicolon insertion.
//! - The parser builds an arena syntax tree of package clause, imports and
//!   declarations; function bodies and initializers are kept as spans.

pub mod ast;
pub mod error;
pub mod lexer;
mod parser;
pub mod parser_support;
pub mod walk;

pub use error::{Diag, DiagKind, LineIndex, ParseFailure, Position};
pub use lexer::{Lexer, Tok};

use ast::{AstArena, IdentName, Interner, SourceFile};

/// A successfully parsed file. Owns every node and interned name.
#[derive(Debug)]
pub struct ParsedFile {
    pub arena: AstArena,
    pub interner: Interner,
    pub file: SourceFile,
}

impl ParsedFile {
    #[inline]
    pub fn name(&self, ident: IdentName) -> &str {
        self.interner.resolve(ident.sym)
    }

    pub fn package_name(&self) -> &str {
        self.name(self.file.name)
    }
}

/// Parses one Go source file.
///
/// Lexer diagnostics are fatal: if any were produced, they are returned
/// without running the parser.
pub fn parse_source(src: &str) -> Result<ParsedFile, ParseFailure> {
    let mut lexer = Lexer::new(src);
    let toks: Vec<_> = lexer.by_ref().collect();
    let diags = lexer.take_diags();
    if !diags.is_empty() {
        return Err(ParseFailure { diags });
    }

    let mut parser = parser::Parser::new(toks, src.len());
    let file = parser
        .parse_file()
        .map_err(|diag| ParseFailure { diags: vec![diag] })?;
    Ok(ParsedFile {
        arena: parser.arena,
        interner: parser.interner,
        file,
    })
}

/// Name from the package clause, read without parsing the rest of the file.
pub fn package_name_of(src: &str) -> Option<&str> {
    let mut toks = Lexer::new(src).map(|(_, tok, _)| tok);
    match (toks.next(), toks.next()) {
        (Some(Tok::KwPackage), Some(Tok::Ident(name))) => Some(name),
        _ => None,
    }
}
