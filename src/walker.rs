//! Go syntax -> interface model.
//!
//! Each file is handled on its own: its imports become an alias table, its
//! top-level interface declarations are collected by a visitor, and every
//! method signature is converted recursively. The first unsupported construct
//! aborts the whole walk.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;

use interfake_syntax::ast::{
    AstArena, ChanDir as SynChanDir, FieldList, FuncDeclId, IdentName, ImportName, InterfaceElem,
    ListRef, Results, SignatureId, Span, Type, TypeId, TypeSpec, TypeTerm,
};
use interfake_syntax::walk::{Visitor, Walk};
use interfake_syntax::{parse_source, LineIndex, ParsedFile};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{ChanDir, Interface, Method, Parameter, SourceFile, TypeExpr};
use crate::resolver::PackageResolver;

/// Turns Go files into `SourceFile`s, resolving unaliased imports through `R`.
#[derive(Debug, Clone)]
pub struct Walker<R> {
    resolver: R,
}

impl<R: PackageResolver> Walker<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Walks `files` in order. `import_path` is the import path of the
    /// package they declare; empty when unknown.
    ///
    /// Names without a `.go` suffix are skipped.
    pub fn walk(&self, files: &[PathBuf], import_path: &str) -> Result<Vec<SourceFile>> {
        let mut out = Vec::with_capacity(files.len());
        for path in files {
            if path.extension() != Some(OsStr::new("go")) {
                continue;
            }
            let src = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            out.push(self.walk_source(&path.display().to_string(), &src, import_path)?);
        }
        Ok(out)
    }

    /// Walks one file's text. `file_name` only labels errors.
    pub fn walk_source(&self, file_name: &str, src: &str, import_path: &str) -> Result<SourceFile> {
        debug!(file = file_name, import_path, "walking");
        let lines = LineIndex::new(src);
        let parsed = parse_source(src).map_err(|failure| {
            let (span, message) = match failure.first() {
                Some(diag) => (diag.span, diag.message.clone()),
                None => (Span::default(), failure.to_string()),
            };
            let pos = lines.position(span.start);
            Error::Syntax {
                file: file_name.to_string(),
                line: pos.line,
                column: pos.column,
                message,
            }
        })?;

        let mut fw = FileWalk {
            resolver: &self.resolver,
            file_name,
            src,
            lines,
            parsed: &parsed,
            import_path,
            imports: HashMap::new(),
        };
        fw.collect_imports()?;

        let mut found = InterfaceDecls::default();
        parsed.file.walk(&parsed.arena, &mut found);

        let interfaces = found
            .decls
            .into_iter()
            .map(|decl| fw.interface(decl))
            .collect::<Result<Vec<_>>>()?;

        Ok(SourceFile {
            package_name: parsed.package_name().to_string(),
            interfaces,
        })
    }
}

// =============================================================================
// Interface discovery
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct InterfaceDecl {
    name: IdentName,
    type_params: Option<Span>,
    elems: ListRef<InterfaceElem>,
}

/// Top-level `type X interface { ... }` specs, grouped or not, in order.
#[derive(Default)]
struct InterfaceDecls {
    decls: Vec<InterfaceDecl>,
}

impl<'ast> Visitor<'ast> for InterfaceDecls {
    fn visit_func_decl(&mut self, _: &'ast AstArena, _: FuncDeclId) {}

    fn visit_type_spec(&mut self, a: &'ast AstArena, spec: &'ast TypeSpec) {
        if let Type::Interface { elems, .. } = a.types[spec.typ] {
            self.decls.push(InterfaceDecl {
                name: spec.name,
                type_params: spec.type_params,
                elems,
            });
        }
    }
}

// =============================================================================
// Conversion
// =============================================================================

struct FileWalk<'w, R> {
    resolver: &'w R,
    file_name: &'w str,
    src: &'w str,
    lines: LineIndex,
    parsed: &'w ParsedFile,
    /// Declaring package's import path.
    import_path: &'w str,
    /// In-file package identifier -> import path.
    imports: HashMap<String, String>,
}

impl<R: PackageResolver> FileWalk<'_, R> {
    fn arena(&self) -> &AstArena {
        &self.parsed.arena
    }

    fn unsupported(&self, span: Span, message: impl Into<String>) -> Error {
        let pos = self.lines.position(span.start);
        Error::Unsupported {
            file: self.file_name.to_string(),
            line: pos.line,
            column: pos.column,
            message: message.into(),
        }
    }

    fn text(&self, span: Span) -> &str {
        span.text(self.src)
    }

    fn collect_imports(&mut self) -> Result<()> {
        let parsed = self.parsed;
        for spec in parsed.arena.imports_list(parsed.file.imports) {
            let path = spec.path.value(self.src);
            let name = match spec.name {
                Some(ImportName::Blank(_)) => continue,
                // Never used as a qualifier, but a second dot import collides.
                Some(ImportName::Dot(_)) => ".".to_string(),
                Some(ImportName::Name(id)) => parsed.name(id).to_string(),
                None => self.resolve_import_name(path),
            };

            if self.imports.contains_key(&name) {
                return Err(Error::ImportCollision {
                    file: self.file_name.to_string(),
                    name,
                });
            }
            debug!(name = %name, path, "import");
            self.imports.insert(name, path.to_string());
        }
        Ok(())
    }

    fn resolve_import_name(&self, path: &str) -> String {
        if let Some(name) = self.resolver.package_name(path) {
            return name;
        }
        let guess = guess_package_name(path);
        warn!(path, guess, "package name not resolved, guessing from import path");
        guess.to_string()
    }

    fn interface(&self, decl: InterfaceDecl) -> Result<Interface> {
        let name = self.parsed.name(decl.name).to_string();
        if let Some(params) = decl.type_params {
            return Err(self.unsupported(
                params,
                format!("generic interface {name} is not supported"),
            ));
        }

        let mut methods = Vec::new();
        for elem in self.arena().interface_elems(decl.elems) {
            match *elem {
                InterfaceElem::Method { name, sig } => {
                    let (args, results) = self.signature(sig)?;
                    methods.push(Method {
                        name: self.parsed.name(name).to_string(),
                        args,
                        results,
                    });
                }
                InterfaceElem::TypeElem(te) => {
                    let span = self.terms_span(te.terms);
                    return Err(self.unsupported(
                        span,
                        format!("don't know how to mock method of type {}", self.text(span)),
                    ));
                }
            }
        }
        Ok(Interface { name, methods })
    }

    fn terms_span(&self, terms: ListRef<TypeTerm>) -> Span {
        let a = self.arena();
        a.type_terms(terms)
            .iter()
            .map(|term| match *term {
                TypeTerm::Tilde { tilde_pos, typ } => tilde_pos.to(a.types.span(typ)),
                TypeTerm::Type { typ } => a.types.span(typ),
            })
            .reduce(Span::to)
            .unwrap_or_default()
    }

    fn signature(&self, sig: SignatureId) -> Result<(Vec<Parameter>, Vec<Parameter>)> {
        let sig = self.arena().signatures[sig];
        let args = self.field_list(sig.params)?;
        let results = match sig.results {
            None => Vec::new(),
            Some(Results::Type(ty)) => vec![Parameter::anonymous(self.type_expr(ty)?)],
            Some(Results::Params(list)) => self.field_list(list)?,
        };
        Ok((args, results))
    }

    fn field_list(&self, list: FieldList) -> Result<Vec<Parameter>> {
        let a = self.arena();
        let mut params = Vec::new();
        for &id in a.fields_list(list.fields) {
            let field = a.fields[id];
            let mut ty = self.type_expr(field.typ)?;
            let variadic = field.ellipsis_pos.is_some();
            if variadic {
                ty = TypeExpr::slice(ty);
            }

            let names = a.ident_names(field.names);
            if names.is_empty() {
                params.push(Parameter {
                    name: String::new(),
                    ty,
                    variadic,
                });
                continue;
            }
            for &name in names {
                params.push(Parameter {
                    name: self.parsed.name(name).to_string(),
                    ty: ty.clone(),
                    variadic,
                });
            }
        }
        Ok(params)
    }

    fn type_expr(&self, id: TypeId) -> Result<TypeExpr> {
        let a = self.arena();
        let span = a.types.span(id);
        let ty = match a.types[id] {
            Type::Named { pkg, name, args } => {
                if !args.is_empty() {
                    return Err(self.unsupported(
                        span,
                        format!("generic type {} is not supported", self.text(span)),
                    ));
                }
                self.named(pkg, name)?
            }
            Type::Pointer { elem, .. } => TypeExpr::pointer(self.type_expr(elem)?),
            Type::Array { len, elem } => {
                let text = self.text(len).trim();
                let len: usize = text
                    .parse()
                    .map_err(|e| self.unsupported(len, format!("bad array size {text:?}: {e}")))?;
                TypeExpr::array(len, self.type_expr(elem)?)
            }
            Type::Slice { elem, .. } => TypeExpr::slice(self.type_expr(elem)?),
            Type::Map { key, val, .. } => TypeExpr::map(self.type_expr(key)?, self.type_expr(val)?),
            Type::Chan { dir, elem, .. } => {
                let dir = match dir {
                    SynChanDir::Both => ChanDir::Both,
                    SynChanDir::Send => ChanDir::Send,
                    SynChanDir::Recv => ChanDir::Recv,
                };
                TypeExpr::chan(dir, self.type_expr(elem)?)
            }
            Type::Func { sig, .. } => {
                let (args, results) = self.signature(sig)?;
                TypeExpr::Func { args, results }
            }
            Type::Struct { fields, .. } => {
                if !fields.is_empty() {
                    return Err(self.unsupported(span, "can't handle non-empty unnamed struct types"));
                }
                TypeExpr::predeclared("struct{}")
            }
            Type::Interface { elems, .. } => {
                if !elems.is_empty() {
                    return Err(
                        self.unsupported(span, "can't handle non-empty unnamed interface types")
                    );
                }
                TypeExpr::predeclared("interface{}")
            }
            Type::Paren { typ, .. } => self.type_expr(typ)?,
        };
        Ok(ty)
    }

    fn named(&self, pkg: Option<IdentName>, name: IdentName) -> Result<TypeExpr> {
        let type_name = self.parsed.name(name);
        match pkg {
            Some(pkg) => {
                let qualifier = self.parsed.name(pkg);
                match self.imports.get(qualifier) {
                    Some(path) => Ok(TypeExpr::named(path.as_str(), type_name)),
                    None => Err(self.unsupported(
                        pkg.pos,
                        format!("unknown package {qualifier:?}"),
                    )),
                }
            }
            None if is_exported(type_name) => {
                // The declaring path may itself be an in-file alias.
                let package = self
                    .imports
                    .get(self.import_path)
                    .map_or(self.import_path, String::as_str);
                Ok(TypeExpr::named(package, type_name))
            }
            None => Ok(TypeExpr::predeclared(type_name)),
        }
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Package name guessed from an import path: the last segment up to its
/// first dot (`gopkg.in/yaml.v3` -> `yaml`).
pub fn guess_package_name(import_path: &str) -> &str {
    let last = import_path.rsplit('/').next().unwrap_or(import_path);
    last.split('.').next().unwrap_or(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guessed_names() {
        assert_eq!(guess_package_name("io"), "io");
        assert_eq!(guess_package_name("github.com/acme/store"), "store");
        assert_eq!(guess_package_name("gopkg.in/yaml.v3"), "yaml");
    }

    #[test]
    fn exported_names() {
        assert!(is_exported("Reader"));
        assert!(is_exported("Ärger"));
        assert!(!is_exported("reader"));
        assert!(!is_exported("_X"));
        assert!(!is_exported(""));
    }
}
