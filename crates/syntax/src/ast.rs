//! # Declaration-level Go syntax tree
//!
//! Models the parts of a Go source file that describe *shapes*: the package
//! clause, imports, and the type expressions appearing in `type`, `var`,
//! `const` and `func` declarations. Function bodies and initializer
//! expressions are recognised only as balanced token runs and kept as spans.
//!
//! ## Layout
//!
//! - **Nodes** live in typed arenas (`SpannedArena<T>`), addressed by `Id<T>`
//! - **Lists** are slices of central buffers in `ExtraData`, addressed by `ListRef<T>`
//! - **Spans** sit in side tables next to each arena
//! - **Identifiers** are interned `Symbol`s; resolve them through `Interner`
//!
//! Traversal lives in `crate::walk`; `#[derive(WalkAst)]` generates the
//! `Walk` impls for the node types below.

use ast_derive::WalkAst;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::hash::{BuildHasher, BuildHasherDefault, Hasher, RandomState};

// =============================================================================
// Core Foundation Types
// =============================================================================

/// Byte range in the source text. Positions are `u32`, capping files at 4GiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= u32::MAX as usize);
        debug_assert!(end <= u32::MAX as usize);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Source text covered by the span.
    #[inline]
    pub fn text<'src>(&self, src: &'src str) -> &'src str {
        &src[self.start as usize..self.end as usize]
    }
}

/// Typed index into a `SpannedArena<T>`.
#[derive(Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Id<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for Id<T> {}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Id<T> {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn to_usize(&self) -> usize {
        self.raw as usize
    }
}

/// Typed reference into one of the `ExtraData` list buffers.
#[derive(Debug, PartialEq, Eq)]
pub struct ListRef<T> {
    start: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for ListRef<T> {}

impl<T> Clone for ListRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Default for ListRef<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> ListRef<T> {
    pub const EMPTY: Self = Self {
        start: 0,
        len: 0,
        _marker: PhantomData,
    };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        Self {
            start,
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    const fn range(&self) -> core::ops::Range<usize> {
        self.start as usize..(self.start + self.len) as usize
    }
}

// =============================================================================
// Symbol Interning
// =============================================================================

/// Interned identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Symbol(u32);

pub type Ident = Symbol;

/// Identifier occurrence: symbol plus where it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct IdentName {
    pub sym: Ident,
    pub pos: Span,
}

/// Pass-through hasher; bucket keys are already hashes.
#[derive(Default)]
struct U64IdentityHasher(u64);

impl Hasher for U64IdentityHasher {
    fn write(&mut self, _b: &[u8]) {
        unreachable!("U64IdentityHasher only supports write_u64")
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

type U64IdentityBuild = BuildHasherDefault<U64IdentityHasher>;

#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    buckets: HashMap<u64, SmallVec<[Symbol; 1]>, U64IdentityBuild>,
    state: RandomState,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        let h = self.state.hash_one(s);
        let entry = self.buckets.entry(h).or_default();

        for &sym in entry.iter() {
            if self.strings[sym.0 as usize].as_ref() == s {
                return sym;
            }
        }

        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(s.into());
        entry.push(sym);
        sym
    }

    /// Resolves a symbol produced by this interner.
    ///
    /// # Panics
    /// Panics if `sym` came from a different interner.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.strings
            .get(sym.0 as usize)
            .expect("invalid symbol")
            .as_ref()
    }
}

// =============================================================================
// Arena Allocation
// =============================================================================

/// Nodes plus their spans, stored in parallel vectors.
#[derive(Debug)]
pub struct SpannedArena<T> {
    data: Vec<T>,
    spans: Vec<Span>,
}

impl<T> Default for SpannedArena<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            spans: Vec::new(),
        }
    }
}

impl<T> SpannedArena<T> {
    #[inline]
    pub fn alloc(&mut self, node: T, span: Span) -> Id<T> {
        let id = Id::from_raw(self.data.len() as u32);
        self.data.push(node);
        self.spans.push(span);
        id
    }

    #[inline]
    pub fn span(&self, id: Id<T>) -> Span {
        self.spans[id.to_usize()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Index<Id<T>> for SpannedArena<T> {
    type Output = T;
    fn index(&self, id: Id<T>) -> &T {
        &self.data[id.to_usize()]
    }
}

impl<T> IndexMut<Id<T>> for SpannedArena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.data[id.to_usize()]
    }
}

pub type DeclId = Id<GenDecl>;
pub type FuncDeclId = Id<FuncDecl>;
pub type TypeId = Id<Type>;
pub type FieldId = Id<Field>;
pub type SignatureId = Id<Signature>;

// =============================================================================
// Centralized List Storage
// =============================================================================

#[derive(Debug, Default)]
pub struct ExtraData {
    pub ident_names: Vec<IdentName>,
    pub types: Vec<TypeId>,
    pub fields: Vec<FieldId>,
    pub specs: Vec<Spec>,
    pub imports: Vec<ImportSpec>,
    pub top_decls: Vec<TopLevelDecl>,
    pub interface_elems: Vec<InterfaceElem>,
    pub type_terms: Vec<TypeTerm>,
}

/// Owner of every node of one parsed file.
#[derive(Debug, Default)]
pub struct AstArena {
    pub decls: SpannedArena<GenDecl>,
    pub funcs: SpannedArena<FuncDecl>,
    pub types: SpannedArena<Type>,
    pub fields: SpannedArena<Field>,
    pub signatures: SpannedArena<Signature>,
    pub extras: ExtraData,
}

macro_rules! list_buffers {
    ($($t:ty => $buf:ident, $push:ident, $get:ident;)*) => {
        impl AstArena {
            $(
                pub fn $push(&mut self, items: impl IntoIterator<Item = $t>) -> ListRef<$t> {
                    Self::push_list(&mut self.extras.$buf, items)
                }

                pub fn $get(&self, r: ListRef<$t>) -> &[$t] {
                    &self.extras.$buf[r.range()]
                }
            )*
        }
    };
}

list_buffers! {
    IdentName => ident_names, list_ident_names, ident_names;
    TypeId => types, list_types, types_list;
    FieldId => fields, list_fields, fields_list;
    Spec => specs, list_specs, specs_list;
    ImportSpec => imports, list_imports, imports_list;
    TopLevelDecl => top_decls, list_top_decls, top_decls;
    InterfaceElem => interface_elems, list_interface_elems, interface_elems;
    TypeTerm => type_terms, list_type_terms, type_terms;
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn push_list<T>(buf: &mut Vec<T>, items: impl IntoIterator<Item = T>) -> ListRef<T> {
        let start = buf.len();
        buf.extend(items);
        let len = buf.len() - start;
        debug_assert!(len <= u32::MAX as usize);
        ListRef::new(start as u32, len as u32)
    }
}

// =============================================================================
// Source File (Root Node)
// =============================================================================

/// ```text
/// SourceFile = PackageClause ";" { ImportDecl ";" } { TopLevelDecl ";" }
/// ```
///
/// Imports of every `import` declaration are flattened into `imports`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct SourceFile {
    pub package_pos: Span,
    pub name: IdentName,
    pub imports: ListRef<ImportSpec>,
    pub decls: ListRef<TopLevelDecl>,
}

// =============================================================================
// Declarations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum TopLevelDecl {
    Decl(DeclId),
    Func(FuncDeclId),
}

/// `const`, `type` or `var` declaration, single or grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct GenDecl {
    pub kw_pos: Span,
    pub kind: GenDeclKind,
    pub l_paren: Option<Span>,
    pub specs: ListRef<Spec>,
    pub r_paren: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GenDeclKind {
    Const,
    Type,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Spec {
    Value(ValueSpec),
    Type(TypeSpec),
}

/// `ImportSpec = [ "." | PackageName ] ImportPath`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSpec {
    pub name: Option<ImportName>,
    pub path: StringLit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportName {
    /// `import . "pkg"`
    Dot(Span),
    /// `import _ "pkg"`
    Blank(Span),
    /// `import name "pkg"`
    Name(IdentName),
}

/// `IdentifierList [ Type ] [ "=" ExpressionList ]`; the initializer is kept
/// as a span only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct ValueSpec {
    pub names: ListRef<IdentName>,
    pub typ: Option<TypeId>,
    pub values: Option<Span>,
}

/// `TypeSpec = AliasDecl | TypeDef`
/// `Walk` for this node is hand-written in `crate::walk` so visitors get a
/// `visit_type_spec` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: IdentName,
    /// Bracketed type parameter list, unparsed.
    pub type_params: Option<Span>,
    pub assign_pos: Option<Span>,
    pub typ: TypeId,
}

impl TypeSpec {
    #[inline]
    pub fn is_alias(&self) -> bool {
        self.assign_pos.is_some()
    }
}

/// ```text
/// FunctionDecl = "func" FunctionName [ TypeParameters ] Signature [ FunctionBody ]
/// MethodDecl   = "func" Receiver MethodName Signature [ FunctionBody ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FuncDecl {
    pub func_pos: Span,
    pub recv: Option<FieldList>,
    pub name: IdentName,
    pub type_params: Option<Span>,
    pub signature: SignatureId,
    /// Braces and everything between them.
    pub body: Option<Span>,
}

// =============================================================================
// Signatures and Fields
// =============================================================================

/// `Signature = Parameters [ Result ]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Signature {
    pub params: FieldList,
    pub results: Option<Results>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Results {
    /// `(x int, err error)` or `(int, error)`
    Params(FieldList),
    /// `int`
    Type(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FieldList {
    pub l_paren: Span,
    pub fields: ListRef<FieldId>,
    pub r_paren: Span,
}

/// Parameter declaration or struct field.
///
/// `ParameterDecl = [ IdentifierList ] [ "..." ] Type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Field {
    pub names: ListRef<IdentName>,
    pub ellipsis_pos: Option<Span>,
    pub typ: TypeId,
    pub tag: Option<StringLit>,
    pub is_embed: bool,
}

/// Quoted string token, interpreted or raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLit {
    pub raw: Span,
}

impl StringLit {
    /// Contents between the quotes, escapes left as written.
    pub fn value<'src>(&self, src: &'src str) -> &'src str {
        let text = self.raw.text(src);
        if text.len() < 2 {
            return "";
        }
        &text[1..text.len() - 1]
    }
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Type {
    /// `Name`, `pkg.Name`, `Name[T1, T2]`
    Named {
        pkg: Option<IdentName>,
        name: IdentName,
        args: ListRef<TypeId>,
    },
    /// `*T`
    Pointer { star_pos: Span, elem: TypeId },
    /// `[N]T`; the length expression is kept unparsed.
    Array { len: Span, elem: TypeId },
    /// `[]T`
    Slice { l_brack: Span, elem: TypeId },
    /// `map[K]V`
    Map {
        map_pos: Span,
        key: TypeId,
        val: TypeId,
    },
    /// `chan T`, `<-chan T`, `chan<- T`
    Chan {
        dir: ChanDir,
        chan_pos: Span,
        elem: TypeId,
    },
    /// `struct { ... }`
    Struct {
        struct_pos: Span,
        fields: ListRef<FieldId>,
    },
    /// `interface { ... }`
    Interface {
        interface_pos: Span,
        elems: ListRef<InterfaceElem>,
    },
    /// `func(...) ...`
    Func { func_pos: Span, sig: SignatureId },
    /// `(T)`
    Paren { l_paren: Span, typ: TypeId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum InterfaceElem {
    /// `Method(...) ...`
    Method { name: IdentName, sig: SignatureId },
    /// Embedded type (`io.Reader`) or union (`~int | string`).
    TypeElem(TypeElem),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeElem {
    pub terms: ListRef<TypeTerm>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum TypeTerm {
    /// `~T`
    Tilde { tilde_pos: Span, typ: TypeId },
    /// `T`
    Type { typ: TypeId },
}
