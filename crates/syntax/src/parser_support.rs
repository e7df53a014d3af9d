use crate::ast::{self, ListRef, Span};
use crate::error::Diag;

/// One comma-separated entry of a parameter list before grouping.
///
/// `a, b int` arrives as `[a]` (no type) then `[b] int`; whether a bare
/// identifier is a name or a type is only known once the whole list is read.
#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub names: Vec<ast::IdentName>,
    pub ellipsis_pos: Option<Span>,
    pub typ: Option<ast::TypeId>,
    pub span: Span,
}

/// Groups raw parameter entries into fields.
///
/// Pending untyped identifiers attach to the next typed entry; identifiers
/// still pending at the end are types of anonymous parameters.
pub fn resolve_param_list(
    arena: &mut ast::AstArena,
    params: Vec<ParamDecl>,
) -> Result<Vec<ast::FieldId>, Diag> {
    let mut out = Vec::new();
    let mut pending_names: Vec<ast::IdentName> = Vec::new();
    let mut pending_start: Option<u32> = None;
    let mut named = None;
    let mut anonymous = None;

    for param in params {
        let Some(typ) = param.typ else {
            if pending_names.is_empty() {
                pending_start = Some(param.span.start);
            }
            pending_names.extend(param.names);
            continue;
        };

        let mut names = std::mem::take(&mut pending_names);
        names.extend(param.names);
        if names.is_empty() {
            anonymous.get_or_insert(param.span);
        } else {
            named.get_or_insert(param.span);
        }

        let names_ref = if names.is_empty() {
            ListRef::EMPTY
        } else {
            arena.list_ident_names(names)
        };
        let span = Span {
            start: pending_start.take().unwrap_or(param.span.start),
            end: param.span.end,
        };
        let field = ast::Field {
            names: names_ref,
            ellipsis_pos: param.ellipsis_pos,
            typ,
            tag: None,
            is_embed: false,
        };
        out.push(arena.fields.alloc(field, span));
    }

    for name in pending_names {
        anonymous.get_or_insert(name.pos);
        let typ = named_type_from_ident(arena, name);
        let field = ast::Field {
            names: ListRef::EMPTY,
            ellipsis_pos: None,
            typ,
            tag: None,
            is_embed: false,
        };
        out.push(arena.fields.alloc(field, name.pos));
    }

    if let (Some(_), Some(at)) = (named, anonymous) {
        return Err(Diag::parse(at, "mixed named and unnamed parameters"));
    }

    Ok(out)
}

fn named_type_from_ident(arena: &mut ast::AstArena, name: ast::IdentName) -> ast::TypeId {
    arena.types.alloc(
        ast::Type::Named {
            pkg: None,
            name,
            args: ListRef::EMPTY,
        },
        name.pos,
    )
}
