//! Recursive-descent parser for the declaration level of a Go file.
//!
//! Types are parsed in full. Function bodies and initializer expressions are
//! consumed as balanced token runs, so a body can only fail to parse if its
//! brackets do not match.

use smallvec::SmallVec;

use crate::ast::*;
use crate::error::Diag;
use crate::lexer::Tok;
use crate::parser_support::{resolve_param_list, ParamDecl};

type PResult<T> = Result<T, Diag>;

/// Deepest type nesting accepted before parsing gives up.
pub(crate) const MAX_NESTING: u32 = 100;

pub(crate) struct Parser<'src> {
    toks: Vec<(usize, Tok<'src>, usize)>,
    pos: usize,
    last: Span,
    eof: Span,
    depth: u32,
    pub(crate) arena: AstArena,
    pub(crate) interner: Interner,
}

#[inline]
fn same_kind(a: Tok<'_>, b: Tok<'_>) -> bool {
    core::mem::discriminant(&a) == core::mem::discriminant(&b)
}

#[inline]
fn closer_of(open: Tok<'_>) -> Option<Tok<'static>> {
    match open {
        Tok::LParen => Some(Tok::RParen),
        Tok::LBrack => Some(Tok::RBrack),
        Tok::LBrace => Some(Tok::RBrace),
        _ => None,
    }
}

#[inline]
fn is_closer(tok: Tok<'_>) -> bool {
    matches!(tok, Tok::RParen | Tok::RBrack | Tok::RBrace)
}

#[inline]
fn starts_type(tok: Option<Tok<'_>>) -> bool {
    matches!(
        tok,
        Some(
            Tok::Ident(_)
                | Tok::Star
                | Tok::LBrack
                | Tok::LParen
                | Tok::Arrow
                | Tok::KwMap
                | Tok::KwChan
                | Tok::KwFunc
                | Tok::KwInterface
                | Tok::KwStruct
        )
    )
}

impl<'src> Parser<'src> {
    pub(crate) fn new(toks: Vec<(usize, Tok<'src>, usize)>, src_len: usize) -> Self {
        Self {
            toks,
            pos: 0,
            last: Span::default(),
            eof: Span::new(src_len, src_len),
            depth: 0,
            arena: AstArena::new(),
            interner: Interner::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Token cursor
    // -------------------------------------------------------------------------

    #[inline]
    fn peek(&self) -> Option<Tok<'src>> {
        self.peek_at(0)
    }

    #[inline]
    fn peek_at(&self, n: usize) -> Option<Tok<'src>> {
        self.toks.get(self.pos + n).map(|&(_, t, _)| t)
    }

    #[inline]
    fn at(&self, tok: Tok<'_>) -> bool {
        self.peek().is_some_and(|t| same_kind(t, tok))
    }

    #[inline]
    fn at_eof(&self) -> bool {
        self.pos >= self.toks.len()
    }

    #[inline]
    fn here(&self) -> Span {
        self.toks
            .get(self.pos)
            .map_or(self.eof, |&(s, _, e)| Span::new(s, e))
    }

    fn bump(&mut self) -> (Span, Tok<'src>) {
        match self.toks.get(self.pos) {
            Some(&(s, tok, e)) => {
                self.pos += 1;
                self.last = Span::new(s, e);
                (self.last, tok)
            }
            None => (self.eof, Tok::Error),
        }
    }

    fn eat(&mut self, tok: Tok<'_>) -> Option<Span> {
        if self.at(tok) {
            Some(self.bump().0)
        } else {
            None
        }
    }

    fn unexpected(&self, what: &str) -> Diag {
        let found = match self.peek() {
            None => "EOF".to_string(),
            Some(Tok::Semi) if self.here().is_empty() => "newline".to_string(),
            Some(tok) => format!("'{tok}'"),
        };
        Diag::parse(self.here(), format!("expected {what}, found {found}"))
    }

    fn expect(&mut self, tok: Tok<'_>, what: &str) -> PResult<Span> {
        self.eat(tok).ok_or_else(|| self.unexpected(what))
    }

    fn expect_ident(&mut self) -> PResult<IdentName> {
        match self.peek() {
            Some(Tok::Ident(name)) => {
                let (pos, _) = self.bump();
                let sym = self.interner.intern(name);
                Ok(IdentName { sym, pos })
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// A `;` is optional right before a closing `)` or `}`.
    fn expect_semi_before(&mut self, close: Tok<'_>) -> PResult<()> {
        if self.at(close) || self.eat(Tok::Semi).is_some() {
            return Ok(());
        }
        Err(self.unexpected("';' or newline"))
    }

    // -------------------------------------------------------------------------
    // Balanced skipping
    // -------------------------------------------------------------------------

    /// Consumes an opening bracket and everything up to its matching closer.
    fn skip_balanced(&mut self) -> PResult<Span> {
        let start = self.here();
        let mut stack: SmallVec<[Tok<'static>; 8]> = SmallVec::new();
        loop {
            let Some(tok) = self.peek() else {
                return Err(Diag::parse(start, "unbalanced brackets: missing closer"));
            };
            self.bump();
            if let Some(close) = closer_of(tok) {
                stack.push(close);
            } else if is_closer(tok) {
                match stack.pop() {
                    Some(want) if same_kind(want, tok) => {}
                    _ => return Err(Diag::parse(self.last, format!("unexpected '{tok}'"))),
                }
            }
            if stack.is_empty() {
                return Ok(start.to(self.last));
            }
        }
    }

    /// Skips tokens until `stop` returns true for a token at nesting depth
    /// zero. The stopping token is left in place; the returned span covers
    /// what was skipped.
    fn skip_until(&mut self, what: &str, stop: impl Fn(Tok<'_>) -> bool) -> PResult<Span> {
        let start = self.here();
        let mut skipped = false;
        while let Some(tok) = self.peek() {
            if stop(tok) {
                break;
            }
            if closer_of(tok).is_some() {
                self.skip_balanced()?;
            } else if is_closer(tok) {
                return Err(Diag::parse(self.here(), format!("unexpected '{tok}'")));
            } else {
                self.bump();
            }
            skipped = true;
        }
        if !skipped {
            return Err(self.unexpected(what));
        }
        Ok(start.to(self.last))
    }

    /// After `ident [`: does the bracket hold type arguments (`List[int]`)
    /// rather than an array length (`buf [4]byte`)? `n` is the offset of `[`.
    fn bracket_is_type_args(&self, n: usize) -> bool {
        let mut depth = 0usize;
        let mut i = n;
        while let Some(tok) = self.peek_at(i) {
            if closer_of(tok).is_some() {
                depth += 1;
            } else if is_closer(tok) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return !starts_type(self.peek_at(i + 1));
                }
            }
            i += 1;
        }
        false
    }

    /// `type T[P any] ...` versus `type T [N]int`.
    fn looks_like_type_params(&self) -> bool {
        matches!(self.peek_at(1), Some(Tok::Ident(_)))
            && matches!(
                self.peek_at(2),
                Some(
                    Tok::Ident(_)
                        | Tok::Star
                        | Tok::LBrack
                        | Tok::LParen
                        | Tok::Comma
                        | Tok::Tilde
                        | Tok::KwInterface
                        | Tok::KwFunc
                        | Tok::KwMap
                        | Tok::KwChan
                        | Tok::KwStruct
                )
            )
    }

    // -------------------------------------------------------------------------
    // File and declarations
    // -------------------------------------------------------------------------

    pub(crate) fn parse_file(&mut self) -> PResult<SourceFile> {
        let package_pos = self.expect(Tok::KwPackage, "'package'")?;
        let name = self.expect_ident()?;
        self.expect(Tok::Semi, "';' or newline")?;

        let mut imports = Vec::new();
        while self.at(Tok::KwImport) {
            self.parse_import_decl(&mut imports)?;
            self.expect_semi_at_top()?;
        }

        let mut decls = Vec::new();
        while let Some(tok) = self.peek() {
            let decl = match tok {
                Tok::KwConst => TopLevelDecl::Decl(self.parse_gen_decl(GenDeclKind::Const)?),
                Tok::KwType => TopLevelDecl::Decl(self.parse_gen_decl(GenDeclKind::Type)?),
                Tok::KwVar => TopLevelDecl::Decl(self.parse_gen_decl(GenDeclKind::Var)?),
                Tok::KwFunc => TopLevelDecl::Func(self.parse_func_decl()?),
                Tok::KwImport => {
                    return Err(Diag::parse(
                        self.here(),
                        "imports must appear before other declarations",
                    ))
                }
                _ => return Err(self.unexpected("declaration")),
            };
            decls.push(decl);
            self.expect_semi_at_top()?;
        }

        Ok(SourceFile {
            package_pos,
            name,
            imports: self.arena.list_imports(imports),
            decls: self.arena.list_top_decls(decls),
        })
    }

    fn expect_semi_at_top(&mut self) -> PResult<()> {
        if self.at_eof() || self.eat(Tok::Semi).is_some() {
            return Ok(());
        }
        Err(self.unexpected("';' or newline after top level declaration"))
    }

    fn parse_import_decl(&mut self, out: &mut Vec<ImportSpec>) -> PResult<()> {
        self.bump();
        if self.eat(Tok::LParen).is_none() {
            out.push(self.parse_import_spec()?);
            return Ok(());
        }
        while !self.at(Tok::RParen) && !self.at_eof() {
            out.push(self.parse_import_spec()?);
            self.expect_semi_before(Tok::RParen)?;
        }
        self.expect(Tok::RParen, "')'")?;
        Ok(())
    }

    fn parse_import_spec(&mut self) -> PResult<ImportSpec> {
        let name = match self.peek() {
            Some(Tok::Dot) => Some(ImportName::Dot(self.bump().0)),
            Some(Tok::Ident("_")) => Some(ImportName::Blank(self.bump().0)),
            Some(Tok::Ident(_)) => Some(ImportName::Name(self.expect_ident()?)),
            _ => None,
        };
        match self.peek() {
            Some(Tok::StringLit(_) | Tok::RawStringLit(_)) => {
                let (raw, _) = self.bump();
                Ok(ImportSpec {
                    name,
                    path: StringLit { raw },
                })
            }
            _ => Err(self.unexpected("import path")),
        }
    }

    fn parse_gen_decl(&mut self, kind: GenDeclKind) -> PResult<DeclId> {
        let (kw_pos, _) = self.bump();
        let mut specs = Vec::new();

        let (l_paren, r_paren) = match self.eat(Tok::LParen) {
            Some(l_paren) => {
                while !self.at(Tok::RParen) && !self.at_eof() {
                    specs.push(self.parse_spec(kind)?);
                    self.expect_semi_before(Tok::RParen)?;
                }
                let r_paren = self.expect(Tok::RParen, "')'")?;
                (Some(l_paren), Some(r_paren))
            }
            None => {
                specs.push(self.parse_spec(kind)?);
                (None, None)
            }
        };

        let span = kw_pos.to(self.last);
        let specs = self.arena.list_specs(specs);
        let decl = GenDecl {
            kw_pos,
            kind,
            l_paren,
            specs,
            r_paren,
        };
        Ok(self.arena.decls.alloc(decl, span))
    }

    fn parse_spec(&mut self, kind: GenDeclKind) -> PResult<Spec> {
        match kind {
            GenDeclKind::Type => self.parse_type_spec().map(Spec::Type),
            GenDeclKind::Const | GenDeclKind::Var => self.parse_value_spec().map(Spec::Value),
        }
    }

    fn parse_type_spec(&mut self) -> PResult<TypeSpec> {
        let name = self.expect_ident()?;
        let type_params = if self.at(Tok::LBrack) && self.looks_like_type_params() {
            Some(self.skip_balanced()?)
        } else {
            None
        };
        let assign_pos = self.eat(Tok::Assign);
        let typ = self.parse_type()?;
        Ok(TypeSpec {
            name,
            type_params,
            assign_pos,
            typ,
        })
    }

    fn parse_value_spec(&mut self) -> PResult<ValueSpec> {
        let mut names = vec![self.expect_ident()?];
        while self.eat(Tok::Comma).is_some() {
            names.push(self.expect_ident()?);
        }
        let typ = if starts_type(self.peek()) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let values = match self.eat(Tok::Assign) {
            Some(_) => Some(self.skip_until("expression", |t| {
                matches!(t, Tok::Semi | Tok::RParen)
            })?),
            None => None,
        };
        Ok(ValueSpec {
            names: self.arena.list_ident_names(names),
            typ,
            values,
        })
    }

    fn parse_func_decl(&mut self) -> PResult<FuncDeclId> {
        let (func_pos, _) = self.bump();
        let recv = if self.at(Tok::LParen) {
            Some(self.parse_parameters()?)
        } else {
            None
        };
        let name = self.expect_ident()?;
        let type_params = if recv.is_none() && self.at(Tok::LBrack) {
            Some(self.skip_balanced()?)
        } else {
            None
        };
        let signature = self.parse_signature()?;
        let body = if self.at(Tok::LBrace) {
            Some(self.skip_balanced()?)
        } else {
            None
        };

        let span = func_pos.to(self.last);
        let func = FuncDecl {
            func_pos,
            recv,
            name,
            type_params,
            signature,
            body,
        };
        Ok(self.arena.funcs.alloc(func, span))
    }

    // -------------------------------------------------------------------------
    // Signatures
    // -------------------------------------------------------------------------

    fn parse_signature(&mut self) -> PResult<SignatureId> {
        let params = self.parse_parameters()?;
        let results = if self.at(Tok::LParen) {
            Some(Results::Params(self.parse_parameters()?))
        } else if starts_type(self.peek()) {
            Some(Results::Type(self.parse_type()?))
        } else {
            None
        };
        let span = params.l_paren.to(self.last);
        Ok(self.arena.signatures.alloc(Signature { params, results }, span))
    }

    fn parse_parameters(&mut self) -> PResult<FieldList> {
        let l_paren = self.expect(Tok::LParen, "'('")?;
        let mut params = Vec::new();
        while !self.at(Tok::RParen) && !self.at_eof() {
            params.push(self.parse_param_decl()?);
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        let r_paren = self.expect(Tok::RParen, "')'")?;
        let fields = resolve_param_list(&mut self.arena, params)?;
        Ok(FieldList {
            l_paren,
            fields: self.arena.list_fields(fields),
            r_paren,
        })
    }

    fn parse_param_decl(&mut self) -> PResult<ParamDecl> {
        let start = self.here();
        let named = match (self.peek(), self.peek_at(1)) {
            (Some(Tok::Ident(_)), Some(Tok::Comma | Tok::RParen)) => {
                let name = self.expect_ident()?;
                return Ok(ParamDecl {
                    names: vec![name],
                    ellipsis_pos: None,
                    typ: None,
                    span: name.pos,
                });
            }
            (Some(Tok::Ident(_)), Some(Tok::Dot)) => false,
            (Some(Tok::Ident(_)), Some(Tok::LBrack)) => !self.bracket_is_type_args(1),
            (Some(Tok::Ident(_)), Some(Tok::Ellipsis)) => true,
            (Some(Tok::Ident(_)), next) => starts_type(next),
            _ => false,
        };

        let names = if named {
            vec![self.expect_ident()?]
        } else {
            Vec::new()
        };
        let ellipsis_pos = self.eat(Tok::Ellipsis);
        let typ = self.parse_type()?;
        Ok(ParamDecl {
            names,
            ellipsis_pos,
            typ: Some(typ),
            span: start.to(self.last),
        })
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    pub(crate) fn parse_type(&mut self) -> PResult<TypeId> {
        if self.depth >= MAX_NESTING {
            return Err(Diag::parse(self.here(), "exceeded max nesting depth"));
        }
        self.depth += 1;
        let ty = self.parse_type_inner();
        self.depth -= 1;
        ty
    }

    fn parse_type_inner(&mut self) -> PResult<TypeId> {
        let start = self.here();
        let ty = match self.peek() {
            Some(Tok::Ident(_)) => self.parse_type_name()?,
            Some(Tok::Star) => {
                let (star_pos, _) = self.bump();
                let elem = self.parse_type()?;
                Type::Pointer { star_pos, elem }
            }
            Some(Tok::LBrack) => {
                let (l_brack, _) = self.bump();
                if self.eat(Tok::RBrack).is_some() {
                    let elem = self.parse_type()?;
                    Type::Slice { l_brack, elem }
                } else {
                    if self.at(Tok::Ellipsis) {
                        return Err(Diag::parse(
                            self.here(),
                            "[...] array type outside a composite literal",
                        ));
                    }
                    let len = self.skip_until("array length", |t| matches!(t, Tok::RBrack))?;
                    self.expect(Tok::RBrack, "']'")?;
                    let elem = self.parse_type()?;
                    Type::Array { len, elem }
                }
            }
            Some(Tok::KwMap) => {
                let (map_pos, _) = self.bump();
                self.expect(Tok::LBrack, "'['")?;
                let key = self.parse_type()?;
                self.expect(Tok::RBrack, "']'")?;
                let val = self.parse_type()?;
                Type::Map { map_pos, key, val }
            }
            Some(Tok::KwChan) => {
                let (chan_pos, _) = self.bump();
                let dir = match self.eat(Tok::Arrow) {
                    Some(_) => ChanDir::Send,
                    None => ChanDir::Both,
                };
                let elem = self.parse_type()?;
                Type::Chan {
                    dir,
                    chan_pos,
                    elem,
                }
            }
            Some(Tok::Arrow) => {
                self.bump();
                let chan_pos = self.expect(Tok::KwChan, "'chan'")?;
                let elem = self.parse_type()?;
                Type::Chan {
                    dir: ChanDir::Recv,
                    chan_pos,
                    elem,
                }
            }
            Some(Tok::KwFunc) => {
                let (func_pos, _) = self.bump();
                let sig = self.parse_signature()?;
                Type::Func { func_pos, sig }
            }
            Some(Tok::KwInterface) => self.parse_interface_type()?,
            Some(Tok::KwStruct) => self.parse_struct_type()?,
            Some(Tok::LParen) => {
                let (l_paren, _) = self.bump();
                let typ = self.parse_type()?;
                self.expect(Tok::RParen, "')'")?;
                Type::Paren { l_paren, typ }
            }
            _ => return Err(self.unexpected("type")),
        };
        let span = start.to(self.last);
        Ok(self.arena.types.alloc(ty, span))
    }

    fn parse_type_name(&mut self) -> PResult<Type> {
        let first = self.expect_ident()?;
        let (pkg, name) = match self.eat(Tok::Dot) {
            Some(_) => (Some(first), self.expect_ident()?),
            None => (None, first),
        };

        let mut args = Vec::new();
        if self.eat(Tok::LBrack).is_some() {
            while !self.at(Tok::RBrack) {
                args.push(self.parse_type()?);
                if self.eat(Tok::Comma).is_none() {
                    break;
                }
            }
            self.expect(Tok::RBrack, "']'")?;
            if args.is_empty() {
                return Err(Diag::parse(self.last, "expected type argument list"));
            }
        }

        Ok(Type::Named {
            pkg,
            name,
            args: self.arena.list_types(args),
        })
    }

    fn parse_interface_type(&mut self) -> PResult<Type> {
        let (interface_pos, _) = self.bump();
        self.expect(Tok::LBrace, "'{'")?;
        let mut elems = Vec::new();
        while !self.at(Tok::RBrace) && !self.at_eof() {
            elems.push(self.parse_interface_elem()?);
            self.expect_semi_before(Tok::RBrace)?;
        }
        self.expect(Tok::RBrace, "'}'")?;
        Ok(Type::Interface {
            interface_pos,
            elems: self.arena.list_interface_elems(elems),
        })
    }

    fn parse_interface_elem(&mut self) -> PResult<InterfaceElem> {
        if let (Some(Tok::Ident(_)), Some(Tok::LParen)) = (self.peek(), self.peek_at(1)) {
            let name = self.expect_ident()?;
            let sig = self.parse_signature()?;
            return Ok(InterfaceElem::Method { name, sig });
        }

        let mut terms = Vec::new();
        loop {
            let term = match self.eat(Tok::Tilde) {
                Some(tilde_pos) => TypeTerm::Tilde {
                    tilde_pos,
                    typ: self.parse_type()?,
                },
                None => TypeTerm::Type {
                    typ: self.parse_type()?,
                },
            };
            terms.push(term);
            if self.eat(Tok::Pipe).is_none() {
                break;
            }
        }
        Ok(InterfaceElem::TypeElem(TypeElem {
            terms: self.arena.list_type_terms(terms),
        }))
    }

    fn parse_struct_type(&mut self) -> PResult<Type> {
        let (struct_pos, _) = self.bump();
        self.expect(Tok::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while !self.at(Tok::RBrace) && !self.at_eof() {
            fields.push(self.parse_field_decl()?);
            self.expect_semi_before(Tok::RBrace)?;
        }
        self.expect(Tok::RBrace, "'}'")?;
        Ok(Type::Struct {
            struct_pos,
            fields: self.arena.list_fields(fields),
        })
    }

    fn parse_field_decl(&mut self) -> PResult<FieldId> {
        let start = self.here();
        let embedded = match (self.peek(), self.peek_at(1)) {
            (Some(Tok::Star), _) => true,
            (
                Some(Tok::Ident(_)),
                None
                | Some(
                    Tok::Dot | Tok::Semi | Tok::RBrace | Tok::StringLit(_) | Tok::RawStringLit(_),
                ),
            ) => true,
            (Some(Tok::Ident(_)), Some(Tok::LBrack)) => self.bracket_is_type_args(1),
            (Some(Tok::Ident(_)), _) => false,
            _ => return Err(self.unexpected("field name or embedded type")),
        };

        let mut names = Vec::new();
        if !embedded {
            names.push(self.expect_ident()?);
            while self.eat(Tok::Comma).is_some() {
                names.push(self.expect_ident()?);
            }
        }
        let typ = self.parse_type()?;
        let tag = match self.peek() {
            Some(Tok::StringLit(_) | Tok::RawStringLit(_)) => Some(StringLit { raw: self.bump().0 }),
            _ => None,
        };

        let field = Field {
            names: self.arena.list_ident_names(names),
            ellipsis_pos: None,
            typ,
            tag,
            is_embed: embedded,
        };
        let span = start.to(self.last);
        Ok(self.arena.fields.alloc(field, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parser(src: &str) -> Parser<'_> {
        Parser::new(Lexer::new(src).collect(), src.len())
    }

    #[test]
    fn chan_direction_binds_to_the_left() {
        let mut p = parser("chan<- chan int");
        let id = p.parse_type().expect("type");
        let Type::Chan { dir, elem, .. } = p.arena.types[id] else {
            panic!("not a chan")
        };
        assert_eq!(dir, ChanDir::Send);
        assert!(matches!(
            p.arena.types[elem],
            Type::Chan {
                dir: ChanDir::Both,
                ..
            }
        ));
    }

    #[test]
    fn array_length_is_kept_as_source_span() {
        let src = "[2 * N]byte";
        let mut p = parser(src);
        let id = p.parse_type().expect("type");
        let Type::Array { len, .. } = p.arena.types[id] else {
            panic!("not an array")
        };
        assert_eq!(len.text(src), "2 * N");
    }

    #[test]
    fn generic_instantiation_is_not_an_array_parameter() {
        let mut p = parser("(xs List[int], buf [4]byte)");
        let fl = p.parse_parameters().expect("params");
        let fields = p.arena.fields_list(fl.fields).to_vec();
        assert_eq!(fields.len(), 2);
        let first = p.arena.fields[fields[0]];
        assert!(matches!(p.arena.types[first.typ], Type::Named { .. }));
        let second = p.arena.fields[fields[1]];
        assert!(matches!(p.arena.types[second.typ], Type::Array { .. }));
    }

    #[test]
    fn nesting_limit_stops_deep_types() {
        let at_limit = format!("{}int", "*".repeat(MAX_NESTING as usize - 1));
        assert!(parser(&at_limit).parse_type().is_ok());

        let src = format!("{}int", "[]".repeat(MAX_NESTING as usize));
        let err = parser(&src).parse_type().expect_err("too deep");
        assert_eq!(err.message, "exceeded max nesting depth");
        assert_eq!(err.span.start as usize, 2 * MAX_NESTING as usize);
    }
}
