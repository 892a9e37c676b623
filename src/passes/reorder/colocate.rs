//! Backing fields that belong next to their property.

use crate::error::RewriteError;
use crate::model::ProgramModel;
use crate::pipeline::UnitContext;
use crate::syntax::query;
use crate::syntax::{Node, NodeKind, NodePath, SyntaxIndex};
use tracing::debug;

/// Child indices, within one member list, of a field and the property it
/// backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Colocation {
    pub field: usize,
    pub property: usize,
}

/// `_userName` and `UserName` both read as `username`.
fn canonical(name: &str) -> String {
    name.trim_start_matches('_')
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_private_instance_field(field: &Node) -> bool {
    let modifiers = query::modifiers(field);
    !modifiers
        .iter()
        .any(|m| matches!(*m, "public" | "protected" | "internal" | "const" | "static"))
}

/// Every field of `list` that is only ever used inside one property whose
/// name matches its own.
pub(crate) fn plan(
    cx: &UnitContext<'_>,
    model: &dyn ProgramModel,
    index: &SyntaxIndex,
    list_path: &NodePath,
    list: &Node,
) -> Result<Vec<Colocation>, RewriteError> {
    let properties: Vec<(usize, String)> = list
        .child_nodes()
        .filter(|(_, member)| member.kind == NodeKind::PropertyDeclaration)
        .filter_map(|(i, member)| Some((i, canonical(query::name(member)?))))
        .collect();
    if properties.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for (field_index, field) in list.child_nodes() {
        if field.kind != NodeKind::FieldDeclaration || !is_private_instance_field(field) {
            continue;
        }
        let declarators = query::declarators(field);
        let [(rel, declarator)] = declarators.as_slice() else {
            continue;
        };
        let (Some(name_at), Some(name)) = (query::name_index(declarator), query::name(declarator))
        else {
            continue;
        };
        let key = canonical(name);
        let mut matching = properties.iter().filter(|(_, p)| *p == key);
        let (Some((property_index, _)), None) = (matching.next(), matching.next()) else {
            continue;
        };

        let mut name_path = list_path.child(field_index);
        for &step in rel {
            name_path = name_path.child(step);
        }
        let name_path = name_path.child(name_at);
        let (Some(name_span), Some(property_span)) = (
            index.token_span(&name_path),
            index.node_span(&list_path.child(*property_index)),
        ) else {
            continue;
        };
        let Some(symbol) = model.declared_symbol(cx.unit, name_span)? else {
            continue;
        };
        let references = model.find_references(&symbol)?;
        let confined = !references.is_empty()
            && references
                .iter()
                .all(|r| r.unit == cx.unit && property_span.contains(r.span));
        if confined {
            debug!(unit = cx.name, field = name, "colocating backing field");
            out.push(Colocation {
                field: field_index,
                property: *property_index,
            });
        }
    }
    Ok(out)
}
