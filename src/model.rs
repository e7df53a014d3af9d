//! # Interface model
//!
//! Language-agnostic description of a Go interface's method set. Types form a
//! closed, owned tree (`TypeExpr`) that can render itself back into Go type
//! syntax and report which import paths it depends on.
//!
//! Rendering takes the package table as an argument: the same model is
//! rendered differently for every output file.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Import path -> identifier the generated file uses for it.
pub type PackageTable = HashMap<String, String>;

/// Import paths referenced by a model, ordered for deterministic output.
pub type PackagePathSet = BTreeSet<String>;

// =============================================================================
// Type expressions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChanDir {
    #[default]
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `[len]elem`
    Array { len: usize, elem: Box<TypeExpr> },
    /// `[]elem`
    Slice { elem: Box<TypeExpr> },
    /// `chan T`, `chan<- T`, `<-chan T`
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    /// `func(args) results`
    Func {
        args: Vec<Parameter>,
        results: Vec<Parameter>,
    },
    /// `map[key]value`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// Exported type; `package` is an import path, empty for the local package.
    Named { package: String, name: String },
    /// `*elem`
    Pointer { elem: Box<TypeExpr> },
    /// Built-in or assumed-local identifier, rendered verbatim.
    Predeclared(String),
}

impl TypeExpr {
    pub fn predeclared(name: impl Into<String>) -> Self {
        Self::Predeclared(name.into())
    }

    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Named {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn slice(elem: TypeExpr) -> Self {
        Self::Slice {
            elem: Box::new(elem),
        }
    }

    pub fn array(len: usize, elem: TypeExpr) -> Self {
        Self::Array {
            len,
            elem: Box::new(elem),
        }
    }

    pub fn pointer(elem: TypeExpr) -> Self {
        Self::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn chan(dir: ChanDir, elem: TypeExpr) -> Self {
        Self::Chan {
            dir,
            elem: Box::new(elem),
        }
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Go type syntax, qualifying named types through `table`.
    ///
    /// A package missing from `table` is rendered with the last segment of
    /// its import path.
    pub fn render(&self, table: &PackageTable) -> String {
        let mut out = String::new();
        self.render_into(table, &mut out);
        out
    }

    fn render_into(&self, table: &PackageTable, out: &mut String) {
        match self {
            Self::Array { len, elem } => {
                out.push('[');
                out.push_str(&len.to_string());
                out.push(']');
                elem.render_into(table, out);
            }
            Self::Slice { elem } => {
                out.push_str("[]");
                elem.render_into(table, out);
            }
            Self::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                elem.render_into(table, out);
            }
            Self::Func { args, results } => {
                out.push_str("func(");
                render_list(args, table, out);
                out.push(')');
                match results.len() {
                    0 => {}
                    1 => {
                        out.push(' ');
                        render_list(results, table, out);
                    }
                    _ => {
                        out.push_str(" (");
                        render_list(results, table, out);
                        out.push(')');
                    }
                }
            }
            Self::Map { key, value } => {
                out.push_str("map[");
                key.render_into(table, out);
                out.push(']');
                value.render_into(table, out);
            }
            Self::Named { package, name } => {
                if !package.is_empty() {
                    out.push_str(qualifier(package, table));
                    out.push('.');
                }
                out.push_str(name);
            }
            Self::Pointer { elem } => {
                out.push('*');
                elem.render_into(table, out);
            }
            Self::Predeclared(name) => out.push_str(name),
        }
    }

    /// Adds every non-local import path reachable from `self` to `set`.
    pub fn collect_package_paths(&self, set: &mut PackagePathSet) {
        match self {
            Self::Array { elem, .. }
            | Self::Slice { elem }
            | Self::Chan { elem, .. }
            | Self::Pointer { elem } => elem.collect_package_paths(set),
            Self::Func { args, results } => {
                for p in args.iter().chain(results) {
                    p.ty.collect_package_paths(set);
                }
            }
            Self::Map { key, value } => {
                key.collect_package_paths(set);
                value.collect_package_paths(set);
            }
            Self::Named { package, .. } => {
                if !package.is_empty() && !set.contains(package) {
                    set.insert(package.clone());
                }
            }
            Self::Predeclared(_) => {}
        }
    }
}

fn qualifier<'t>(package: &'t str, table: &'t PackageTable) -> &'t str {
    match table.get(package) {
        Some(alias) => alias,
        None => package.rsplit('/').next().unwrap_or(package),
    }
}

fn render_list(params: &[Parameter], table: &PackageTable, out: &mut String) {
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        p.render_type_into(table, out);
    }
}

// =============================================================================
// Methods and interfaces
// =============================================================================

/// Argument or result of a method. `name` may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeExpr,
    /// `...T`; `ty` then holds `[]T`.
    pub variadic: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            variadic: false,
        }
    }

    pub fn anonymous(ty: TypeExpr) -> Self {
        Self::new("", ty)
    }

    /// The parameter's type as written in a signature: `...T` when variadic.
    pub fn render_type(&self, table: &PackageTable) -> String {
        let mut out = String::new();
        self.render_type_into(table, &mut out);
        out
    }

    fn render_type_into(&self, table: &PackageTable, out: &mut String) {
        match (&self.ty, self.variadic) {
            (TypeExpr::Slice { elem }, true) => {
                out.push_str("...");
                elem.render_into(table, out);
            }
            (ty, _) => ty.render_into(table, out),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub args: Vec<Parameter>,
    pub results: Vec<Parameter>,
}

impl Method {
    fn collect_package_paths(&self, set: &mut PackagePathSet) {
        for p in self.args.iter().chain(&self.results) {
            p.ty.collect_package_paths(set);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    /// In declaration order.
    pub methods: Vec<Method>,
}

impl Interface {
    /// Every import path the method set refers to. Computed on each call.
    pub fn referenced_package_paths(&self) -> PackagePathSet {
        let mut set = PackagePathSet::new();
        for m in &self.methods {
            m.collect_package_paths(&mut set);
        }
        set
    }
}

/// Interfaces declared by one walked Go file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub package_name: String,
    pub interfaces: Vec<Interface>,
}

// =============================================================================
// Debug dump
// =============================================================================

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "go file package {}", self.package_name)?;
        for intf in &self.interfaces {
            write!(f, "{intf}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "interface {}", self.name)?;
        for m in &self.methods {
            write!(f, "{m}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  - method {}", self.name)?;
        if !self.args.is_empty() {
            writeln!(f, "    args:")?;
            for p in &self.args {
                write!(f, "{p}")?;
            }
        }
        if !self.results.is_empty() {
            writeln!(f, "    results:")?;
            for p in &self.results {
                write!(f, "{p}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() {
            "\"\""
        } else {
            self.name.as_str()
        };
        writeln!(f, "    - {name}: {}", self.render_type(&PackageTable::new()))
    }
}
