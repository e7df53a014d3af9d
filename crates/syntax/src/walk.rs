use crate::ast::*;

// Core traits
pub trait Walk<'ast> {
    fn walk<V: Visitor<'ast> + ?Sized>(&'ast self, a: &'ast AstArena, v: &mut V);
}

/// Read-only traversal over a parsed file.
///
/// Every method defaults to walking the node's children; override the ones
/// you care about and call the default (or `walk`) to keep descending.
pub trait Visitor<'ast> {
    #[inline(always)]
    fn visit_source_file(&mut self, a: &'ast AstArena, f: &'ast SourceFile) {
        f.walk(a, self);
    }

    #[inline(always)]
    fn visit_decl(&mut self, a: &'ast AstArena, id: DeclId) {
        a.decls[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_func_decl(&mut self, a: &'ast AstArena, id: FuncDeclId) {
        a.funcs[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_type_spec(&mut self, a: &'ast AstArena, spec: &'ast TypeSpec) {
        walk_type_spec(spec, a, self);
    }

    #[inline(always)]
    fn visit_type(&mut self, a: &'ast AstArena, id: TypeId) {
        a.types[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_field(&mut self, a: &'ast AstArena, id: FieldId) {
        a.fields[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_signature(&mut self, a: &'ast AstArena, id: SignatureId) {
        a.signatures[id].walk(a, self);
    }
}

/// Children of a type spec: only its type; type parameters are unparsed.
#[inline(always)]
pub fn walk_type_spec<'ast, V: Visitor<'ast> + ?Sized>(
    spec: &'ast TypeSpec,
    a: &'ast AstArena,
    v: &mut V,
) {
    spec.typ.walk(a, v);
}

impl<'ast> Walk<'ast> for TypeSpec {
    #[inline(always)]
    fn walk<V: Visitor<'ast> + ?Sized>(&'ast self, a: &'ast AstArena, v: &mut V) {
        v.visit_type_spec(a, self);
    }
}

macro_rules! impl_walk_for_ids {
    ($($id:ty => $visit:ident),* $(,)?) => {
        $(
            impl<'ast> Walk<'ast> for $id {
                #[inline(always)]
                fn walk<V: Visitor<'ast> + ?Sized>(&'ast self, a: &'ast AstArena, v: &mut V) {
                    v.$visit(a, *self);
                }
            }
        )*
    };
}

impl_walk_for_ids! {
    DeclId => visit_decl,
    FuncDeclId => visit_func_decl,
    TypeId => visit_type,
    FieldId => visit_field,
    SignatureId => visit_signature,
}

pub trait ListSlice<T> {
    fn slice(&self, r: ListRef<T>) -> &[T];
}

impl<'ast, T> Walk<'ast> for ListRef<T>
where
    AstArena: ListSlice<T>,
    T: Walk<'ast> + 'ast,
{
    #[inline(always)]
    fn walk<V: Visitor<'ast> + ?Sized>(&'ast self, a: &'ast AstArena, v: &mut V) {
        for item in a.slice(*self) {
            item.walk(a, v);
        }
    }
}

macro_rules! impl_list_slice {
    ($($t:ty => $getter:ident),* $(,)?) => {
        $(
            impl ListSlice<$t> for AstArena {
                #[inline(always)]
                fn slice(&self, r: ListRef<$t>) -> &[$t] {
                    self.$getter(r)
                }
            }
        )*
    };
}

impl_list_slice! {
    IdentName => ident_names,
    ImportSpec => imports_list,
    TypeId => types_list,
    FieldId => fields_list,
    Spec => specs_list,
    TopLevelDecl => top_decls,
    InterfaceElem => interface_elems,
    TypeTerm => type_terms,
}

impl<'ast, T: Walk<'ast>> Walk<'ast> for Option<T> {
    #[inline(always)]
    fn walk<V: Visitor<'ast> + ?Sized>(&'ast self, a: &'ast AstArena, v: &mut V) {
        if let Some(x) = self {
            x.walk(a, v);
        }
    }
}

macro_rules! impl_walk_noop {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'ast> Walk<'ast> for $ty {
                #[inline(always)]
                fn walk<V: Visitor<'ast> + ?Sized>(&'ast self, _: &'ast AstArena, _: &mut V) {}
            }
        )*
    };
}

// Leaves carry nothing to visit.
impl_walk_noop! {
    bool,
    ImportSpec,
    Span,
    Symbol,
    StringLit,
    GenDeclKind,
    ChanDir,
}
