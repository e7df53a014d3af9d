use crate::ast::Span;
use crate::error::{Diag, LexError, LexErrorKind};
use logos::{Lexer as LogosLexer, Logos};
use std::ops::Range;

// =============================================================================
// 1. Trivia and raw string scanners (manual; memchr)
// =============================================================================

#[inline]
fn lex_block_comment(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    let rem = lex.remainder().as_bytes();
    let mut search_start = 0;

    while let Some(star_pos) = memchr::memchr(b'*', &rem[search_start..]) {
        let abs_pos = search_start + star_pos;
        if rem.get(abs_pos + 1) == Some(&b'/') {
            lex.bump(abs_pos + 2);
            return Ok(());
        }
        search_start = abs_pos + 1;
    }

    lex.bump(rem.len());
    Err(LexErrorKind::UnterminatedComment)
}

#[inline]
fn lex_line_comment(lex: &mut LogosLexer<'_, RawTok>) {
    let rem = lex.remainder().as_bytes();
    let end = memchr::memchr2(b'\n', b'\r', rem).unwrap_or(rem.len());
    lex.bump(end);
}

#[inline]
fn lex_raw_string(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    let rem = lex.remainder().as_bytes();
    match memchr::memchr(b'`', rem) {
        Some(close) => {
            lex.bump(close + 1);
            Ok(())
        }
        None => {
            lex.bump(rem.len());
            Err(LexErrorKind::UnterminatedString)
        }
    }
}

#[inline(always)]
fn first_newline_offset(s: &str) -> Option<usize> {
    memchr::memchr2(b'\n', b'\r', s.as_bytes())
}

// =============================================================================
// 2. Token Definition (RawTok)
// =============================================================================

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t]+")]
#[rustfmt::skip]
enum RawTok {
    #[token("\u{FEFF}")] Bom,

    // Trivia
    #[regex(r"\r\n|\n|\r")] Newline,
    #[token("//", lex_line_comment)] LineComment,
    #[token("/*", lex_block_comment)] BlockComment,

    // Keywords (before Ident)
    #[token("break")] KwBreak,
    #[token("case")] KwCase,
    #[token("chan")] KwChan,
    #[token("const")] KwConst,
    #[token("continue")] KwContinue,
    #[token("default")] KwDefault,
    #[token("defer")] KwDefer,
    #[token("else")] KwElse,
    #[token("fallthrough")] KwFallthrough,
    #[token("for")] KwFor,
    #[token("func")] KwFunc,
    #[token("go")] KwGo,
    #[token("goto")] KwGoto,
    #[token("if")] KwIf,
    #[token("import")] KwImport,
    #[token("interface")] KwInterface,
    #[token("map")] KwMap,
    #[token("package")] KwPackage,
    #[token("range")] KwRange,
    #[token("return")] KwReturn,
    #[token("select")] KwSelect,
    #[token("struct")] KwStruct,
    #[token("switch")] KwSwitch,
    #[token("type")] KwType,
    #[token("var")] KwVar,

    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*")] Ident,

    // Numbers; the imaginary suffix is picked up by the wrapper.
    #[regex(r"[0-9][0-9_]*")]
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"0[oO][0-7_]+")]
    #[regex(r"0[bB][01_]+")]
    Int,
    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9_]+")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"0[xX][0-9a-fA-F_]*(\.[0-9a-fA-F_]*)?[pP][+-]?[0-9_]+")]
    Float,

    // Strings / runes
    #[token("`", lex_raw_string)] RawString,
    #[regex(r#""([^"\\\n\r]|\\.)*""#)] String,
    #[regex(r"'([^'\\\n\r]|\\.)+'")] Rune,

    // Operators
    #[token("...")] Ellipsis,
    #[token("<<=")] ShlAssign,
    #[token(">>=")] ShrAssign,
    #[token("&^=")] AndNotAssign,
    #[token("+=")] AddAssign,
    #[token("-=")] SubAssign,
    #[token("*=")] MulAssign,
    #[token("/=")] DivAssign,
    #[token("%=")] ModAssign,
    #[token("&=")] AndAssign,
    #[token("|=")] OrAssign,
    #[token("^=")] XorAssign,
    #[token("<<")] Shl,
    #[token(">>")] Shr,
    #[token("&^")] AndNot,
    #[token("&&")] LAnd,
    #[token("||")] LOr,
    #[token("==")] EqEq,
    #[token("!=")] NotEq,
    #[token("<=")] Le,
    #[token(">=")] Ge,
    #[token("++")] Inc,
    #[token("--")] Dec,
    #[token(":=")] Define,
    #[token("<-")] Arrow,
    #[token("=")] Assign,
    #[token("+")] Plus,
    #[token("-")] Minus,
    #[token("*")] Star,
    #[token("/")] Slash,
    #[token("%")] Percent,
    #[token("&")] Amp,
    #[token("|")] Pipe,
    #[token("^")] Caret,
    #[token("~")] Tilde,
    #[token("!")] Bang,
    #[token("<")] Lt,
    #[token(">")] Gt,

    // Delimiters
    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBrack,
    #[token("]")] RBrack,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token(",")] Comma,
    #[token(";")] Semi,
    #[token(":")] Colon,
    #[token(".")] Dot,
}

impl RawTok {
    #[inline(always)]
    const fn can_insert_semicolon(self) -> bool {
        matches!(
            self,
            Self::Ident
                | Self::Int
                | Self::Float
                | Self::Rune
                | Self::String
                | Self::RawString
                | Self::KwBreak
                | Self::KwContinue
                | Self::KwFallthrough
                | Self::KwReturn
                | Self::Inc
                | Self::Dec
                | Self::RParen
                | Self::RBrack
                | Self::RBrace
        )
    }

    #[inline]
    fn to_token<'src>(self, slice: &'src str) -> Tok<'src> {
        macro_rules! simple_tok {
            ($($raw:ident),* $(,)?) => {
                match self {
                    Self::Ident => Tok::Ident(slice),
                    Self::Int => Tok::IntLit(slice),
                    Self::Float => Tok::FloatLit(slice),
                    Self::Rune => Tok::RuneLit(slice),
                    Self::String => Tok::StringLit(slice),
                    Self::RawString => Tok::RawStringLit(slice),
                    $(Self::$raw => Tok::$raw,)*
                    Self::Bom | Self::Newline | Self::LineComment | Self::BlockComment => Tok::Error,
                }
            };
        }

        simple_tok! {
            KwBreak, KwCase, KwChan, KwConst, KwContinue, KwDefault, KwDefer, KwElse,
            KwFallthrough, KwFor, KwFunc, KwGo, KwGoto, KwIf, KwImport, KwInterface,
            KwMap, KwPackage, KwRange, KwReturn, KwSelect, KwStruct, KwSwitch, KwType, KwVar,

            Ellipsis, ShlAssign, ShrAssign, AndNotAssign, AddAssign, SubAssign, MulAssign,
            DivAssign, ModAssign, AndAssign, OrAssign, XorAssign, Shl, Shr, AndNot, LAnd,
            LOr, EqEq, NotEq, Le, Ge, Inc, Dec, Define, Arrow, Assign, Plus, Minus, Star,
            Slash, Percent, Amp, Pipe, Caret, Tilde, Bang, Lt, Gt,

            LParen, RParen, LBrack, RBrack, LBrace, RBrace, Comma, Semi, Colon, Dot,
        }
    }
}

// =============================================================================
// 3. Public Token Definition (zero-copy)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tok<'input> {
    Ident(&'input str),
    IntLit(&'input str),
    FloatLit(&'input str),
    ImagLit(&'input str),
    RuneLit(&'input str),
    StringLit(&'input str),
    RawStringLit(&'input str),

    // Keywords
    KwBreak,
    KwCase,
    KwChan,
    KwConst,
    KwContinue,
    KwDefault,
    KwDefer,
    KwElse,
    KwFallthrough,
    KwFor,
    KwFunc,
    KwGo,
    KwGoto,
    KwIf,
    KwImport,
    KwInterface,
    KwMap,
    KwPackage,
    KwRange,
    KwReturn,
    KwSelect,
    KwStruct,
    KwSwitch,
    KwType,
    KwVar,

    // Operators / Delimiters
    Ellipsis,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    EqEq,
    NotEq,
    Le,
    Ge,
    Inc,
    Dec,
    Define,
    Arrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    Lt,
    Gt,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Dot,

    Error,
}

impl<'input> std::fmt::Display for Tok<'input> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tok::Ident(s)
            | Tok::IntLit(s)
            | Tok::FloatLit(s)
            | Tok::ImagLit(s)
            | Tok::RuneLit(s)
            | Tok::StringLit(s)
            | Tok::RawStringLit(s) => f.write_str(s),
            Tok::Error => f.write_str("<error>"),
            other => f.write_str(other.fixed_text()),
        }
    }
}

impl Tok<'_> {
    /// Source spelling of keywords and punctuation; empty for literals.
    pub fn fixed_text(&self) -> &'static str {
        match self {
            Tok::KwBreak => "break",
            Tok::KwCase => "case",
            Tok::KwChan => "chan",
            Tok::KwConst => "const",
            Tok::KwContinue => "continue",
            Tok::KwDefault => "default",
            Tok::KwDefer => "defer",
            Tok::KwElse => "else",
            Tok::KwFallthrough => "fallthrough",
            Tok::KwFor => "for",
            Tok::KwFunc => "func",
            Tok::KwGo => "go",
            Tok::KwGoto => "goto",
            Tok::KwIf => "if",
            Tok::KwImport => "import",
            Tok::KwInterface => "interface",
            Tok::KwMap => "map",
            Tok::KwPackage => "package",
            Tok::KwRange => "range",
            Tok::KwReturn => "return",
            Tok::KwSelect => "select",
            Tok::KwStruct => "struct",
            Tok::KwSwitch => "switch",
            Tok::KwType => "type",
            Tok::KwVar => "var",
            Tok::Ellipsis => "...",
            Tok::ShlAssign => "<<=",
            Tok::ShrAssign => ">>=",
            Tok::AndNotAssign => "&^=",
            Tok::AddAssign => "+=",
            Tok::SubAssign => "-=",
            Tok::MulAssign => "*=",
            Tok::DivAssign => "/=",
            Tok::ModAssign => "%=",
            Tok::AndAssign => "&=",
            Tok::OrAssign => "|=",
            Tok::XorAssign => "^=",
            Tok::Shl => "<<",
            Tok::Shr => ">>",
            Tok::AndNot => "&^",
            Tok::LAnd => "&&",
            Tok::LOr => "||",
            Tok::EqEq => "==",
            Tok::NotEq => "!=",
            Tok::Le => "<=",
            Tok::Ge => ">=",
            Tok::Inc => "++",
            Tok::Dec => "--",
            Tok::Define => ":=",
            Tok::Arrow => "<-",
            Tok::Assign => "=",
            Tok::Plus => "+",
            Tok::Minus => "-",
            Tok::Star => "*",
            Tok::Slash => "/",
            Tok::Percent => "%",
            Tok::Amp => "&",
            Tok::Pipe => "|",
            Tok::Caret => "^",
            Tok::Tilde => "~",
            Tok::Bang => "!",
            Tok::Lt => "<",
            Tok::Gt => ">",
            Tok::LParen => "(",
            Tok::RParen => ")",
            Tok::LBrack => "[",
            Tok::RBrack => "]",
            Tok::LBrace => "{",
            Tok::RBrace => "}",
            Tok::Comma => ",",
            Tok::Semi => ";",
            Tok::Colon => ":",
            Tok::Dot => ".",
            Tok::Ident(_)
            | Tok::IntLit(_)
            | Tok::FloatLit(_)
            | Tok::ImagLit(_)
            | Tok::RuneLit(_)
            | Tok::StringLit(_)
            | Tok::RawStringLit(_)
            | Tok::Error => "",
        }
    }
}

// =============================================================================
// 4. Lexer wrapper: semicolon insertion + imag lookahead + diags
// =============================================================================

pub struct Lexer<'src> {
    logos: LogosLexer<'src, RawTok>,
    pending: Option<(usize, Tok<'src>, usize)>,
    diags: Vec<Diag>,
    last_can_insert_semi: bool,
    src_len: usize,
    eof_done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            logos: RawTok::lexer(input),
            pending: None,
            diags: Vec::with_capacity(16),
            last_can_insert_semi: false,
            src_len: input.len(),
            eof_done: false,
        }
    }

    pub fn take_diags(&mut self) -> Vec<Diag> {
        std::mem::take(&mut self.diags)
    }

    #[inline]
    fn push_lex_diag(&mut self, kind: LexErrorKind, span: Range<usize>) {
        let span = Span::new(span.start, span.end);
        self.diags.push(LexError { kind, span }.diag());
    }

    #[inline]
    fn emit_semi_at(&mut self, pos: usize) {
        self.pending = Some((pos, Tok::Semi, pos));
    }

    #[inline]
    fn handle_trivia(&mut self, raw: RawTok, span: &Range<usize>, slice: &str) -> bool {
        match raw {
            RawTok::Newline => {
                if self.last_can_insert_semi {
                    self.last_can_insert_semi = false;
                    self.emit_semi_at(span.start);
                }
                true
            }
            RawTok::BlockComment => {
                if self.last_can_insert_semi {
                    if let Some(off) = first_newline_offset(slice) {
                        self.last_can_insert_semi = false;
                        self.emit_semi_at(span.start + off);
                    }
                }
                true
            }
            RawTok::LineComment => true,
            _ => false,
        }
    }

    #[inline]
    fn handle_eof(&mut self) {
        self.eof_done = true;
        if self.last_can_insert_semi {
            self.last_can_insert_semi = false;
            self.emit_semi_at(self.src_len);
        }
    }

    #[inline]
    fn handle_lex_error(&mut self, kind: LexErrorKind) -> (usize, Tok<'src>, usize) {
        let span = self.logos.span();
        self.push_lex_diag(kind, span.clone());
        self.last_can_insert_semi = false;
        (span.start, Tok::Error, span.end)
    }

    #[inline]
    fn handle_raw_token(&mut self, raw: RawTok) -> Option<(usize, Tok<'src>, usize)> {
        let span = self.logos.span();
        let slice = self.logos.slice();

        if raw == RawTok::Bom {
            if span.start == 0 {
                return None;
            }
            return Some(self.handle_lex_error(LexErrorKind::InvalidToken));
        }

        if self.handle_trivia(raw, &span, slice) {
            return None;
        }

        if matches!(raw, RawTok::Int | RawTok::Float) {
            return Some(self.handle_number_token(raw, span, slice));
        }

        self.last_can_insert_semi = raw.can_insert_semicolon();
        Some((span.start, raw.to_token(slice), span.end))
    }

    #[inline]
    fn handle_number_token(
        &mut self,
        raw: RawTok,
        span: Range<usize>,
        slice: &'src str,
    ) -> (usize, Tok<'src>, usize) {
        let src = self.logos.source();
        let bytes = slice.as_bytes();

        // `_` must separate digits: no trailing, no doubled.
        let bad_separator = bytes.last() == Some(&b'_') || slice.contains("__");
        if bad_separator {
            self.push_lex_diag(LexErrorKind::InvalidNumber, span.clone());
            self.last_can_insert_semi = false;
            return (span.start, Tok::Error, span.end);
        }

        self.last_can_insert_semi = true;
        if src.as_bytes().get(span.end) == Some(&b'i') {
            self.logos.bump(1);
            let end = span.end + 1;
            return (span.start, Tok::ImagLit(&src[span.start..end]), end);
        }

        let tok = match raw {
            RawTok::Float => Tok::FloatLit(slice),
            _ => Tok::IntLit(slice),
        };
        (span.start, tok, span.end)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = (usize, Tok<'src>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // 1) Emit pending token (injected ';')
            if let Some(tok) = self.pending.take() {
                return Some(tok);
            }

            // 2) Hard EOF
            if self.eof_done {
                return None;
            }

            // 3) Next raw token
            match self.logos.next() {
                None => {
                    // Don't return here; a pending ';' may still be queued.
                    self.handle_eof();
                    continue;
                }
                Some(Err(kind)) => return Some(self.handle_lex_error(kind)),
                Some(Ok(raw)) => {
                    if let Some(item) = self.handle_raw_token(raw) {
                        return Some(item);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok<'_>> {
        Lexer::new(src).map(|(_, t, _)| t).collect()
    }

    #[test]
    fn imaginary_suffix_is_glued() {
        assert_eq!(toks("1.5i"), vec![Tok::ImagLit("1.5i"), Tok::Semi]);
    }

    #[test]
    fn doubled_separator_is_an_error() {
        let mut lx = Lexer::new("1__0");
        let all: Vec<_> = lx.by_ref().collect();
        assert!(all.iter().any(|(_, t, _)| *t == Tok::Error));
        assert_eq!(lx.take_diags().len(), 1);
    }
}
