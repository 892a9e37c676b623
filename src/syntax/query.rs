//! Read-only helpers that pick declarations and lists apart.

use super::kind::NodeKind;
use super::node::{Element, Node};
use super::token::Token;
use std::ops::Range;

const MODIFIER_KEYWORDS: &[&str] = &[
    "abstract", "async", "const", "extern", "file", "internal", "new", "override", "partial",
    "private", "protected", "public", "readonly", "required", "sealed", "static", "unsafe",
    "virtual", "volatile", "fixed", "ref", "scoped",
];

/// Modifier keywords written directly on a declaration, in source order.
pub fn modifiers(node: &Node) -> Vec<&str> {
    let mut out = Vec::new();
    for child in &node.children {
        match child {
            Element::Node(child) if child.kind == NodeKind::Modifier => {
                out.extend(child.tokens().into_iter().map(|t| t.text.as_str()));
            }
            Element::Token(token) if MODIFIER_KEYWORDS.contains(&token.text.as_str()) => {
                out.push(token.text.as_str());
            }
            Element::Token(token) if token.is_identifier() => break,
            _ => {}
        }
    }
    out
}

pub fn has_modifier(node: &Node, modifier: &str) -> bool {
    modifiers(node).contains(&modifier)
}

/// Child index of the token naming a declaration.
pub fn name_index(node: &Node) -> Option<usize> {
    match node.kind {
        NodeKind::ClassDeclaration
        | NodeKind::StructDeclaration
        | NodeKind::InterfaceDeclaration
        | NodeKind::RecordDeclaration
        | NodeKind::EnumDeclaration
        | NodeKind::VariableDeclarator => first_identifier(node, node.children.len()),
        NodeKind::MethodDeclaration
        | NodeKind::ConstructorDeclaration
        | NodeKind::DestructorDeclaration
        | NodeKind::DelegateDeclaration => {
            let end = node
                .find_child(&NodeKind::ParameterList)
                .map_or(node.children.len(), |(i, _)| i);
            last_identifier(node, end)
        }
        NodeKind::PropertyDeclaration | NodeKind::EventDeclaration => {
            let end = node
                .children
                .iter()
                .position(|child| match child {
                    Element::Node(n) => matches!(
                        n.kind,
                        NodeKind::AccessorList | NodeKind::ArrowExpression | NodeKind::EqualsValue
                    ),
                    Element::Token(t) => t.is("{") || t.is("=>") || t.is("=") || t.is(";"),
                })
                .unwrap_or(node.children.len());
            last_identifier(node, end)
        }
        NodeKind::Parameter => {
            let end = node
                .children
                .iter()
                .position(|child| match child {
                    Element::Node(n) => n.kind == NodeKind::EqualsValue,
                    Element::Token(t) => t.is("="),
                })
                .unwrap_or(node.children.len());
            last_identifier(node, end)
        }
        _ => None,
    }
}

pub fn name_token(node: &Node) -> Option<&Token> {
    name_index(node).and_then(|i| node.children[i].as_token())
}

pub fn name(node: &Node) -> Option<&str> {
    name_token(node).map(|t| t.text.as_str())
}

fn first_identifier(node: &Node, end: usize) -> Option<usize> {
    node.children[..end]
        .iter()
        .position(|child| child.as_token().is_some_and(Token::is_identifier))
}

fn last_identifier(node: &Node, end: usize) -> Option<usize> {
    node.children[..end]
        .iter()
        .rposition(|child| child.as_token().is_some_and(Token::is_identifier))
}

/// Declarators of a field, event field or local declaration, with their
/// child-index path relative to `node`.
pub fn declarators(node: &Node) -> Vec<(Vec<usize>, &Node)> {
    let Some((decl_index, declaration)) = node.find_child(&NodeKind::VariableDeclaration) else {
        return Vec::new();
    };
    declaration
        .child_nodes()
        .filter(|(_, child)| child.kind == NodeKind::VariableDeclarator)
        .map(|(i, child)| (vec![decl_index, i], child))
        .collect()
}

/// Parameter nodes of a declaration's parameter list, with their
/// child-index path relative to `node`.
pub fn parameters(node: &Node) -> Vec<(Vec<usize>, &Node)> {
    let Some((list_index, list)) = node.find_child(&NodeKind::ParameterList) else {
        return Vec::new();
    };
    list.child_nodes()
        .filter(|(_, child)| child.kind == NodeKind::Parameter)
        .map(|(i, child)| (vec![list_index, i], child))
        .collect()
}

pub fn parameter_count(node: &Node) -> usize {
    parameters(node).len()
}

/// Text of a parameter's type: everything between its modifiers and its name.
pub fn parameter_type(parameter: &Node) -> String {
    let Some(name) = name_index(parameter) else {
        return String::new();
    };
    parameter.children[..name]
        .iter()
        .filter(|child| match child {
            Element::Node(n) => !matches!(n.kind, NodeKind::AttributeList | NodeKind::Modifier),
            Element::Token(t) => !MODIFIER_KEYWORDS.contains(&t.text.as_str()) && !t.is("this"),
        })
        .map(|child| match child {
            Element::Node(n) => n.compact_text(),
            Element::Token(t) => t.text.clone(),
        })
        .collect()
}

pub fn has_explicit_interface(node: &Node) -> bool {
    node.find_child(&NodeKind::ExplicitInterfaceSpecifier).is_some()
}

/// Child index of a method's return type.
pub fn return_type_index(method: &Node) -> Option<usize> {
    let name = name_index(method)?;
    let mut i = name.checked_sub(1)?;
    if method.children[i]
        .as_node()
        .is_some_and(|n| n.kind == NodeKind::ExplicitInterfaceSpecifier)
    {
        i = i.checked_sub(1)?;
    }
    match &method.children[i] {
        Element::Node(n) if matches!(n.kind, NodeKind::Modifier | NodeKind::AttributeList) => None,
        Element::Token(t) if MODIFIER_KEYWORDS.contains(&t.text.as_str()) => None,
        _ => Some(i),
    }
}

/// `get`, `set`, `init`, `add` or `remove`.
pub fn accessor_keyword(accessor: &Node) -> Option<&str> {
    accessor
        .child_tokens()
        .map(|(_, t)| t.text.as_str())
        .find(|text| matches!(*text, "get" | "set" | "init" | "add" | "remove"))
}

/// Child index of a type's member list.
pub fn member_list_index(node: &Node) -> Option<usize> {
    node.find_child(&NodeKind::DeclarationList).map(|(i, _)| i)
}

/// Delimiters, separators and element ranges of a delimited list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParts {
    pub open: usize,
    pub close: usize,
    /// Child ranges of the elements between the delimiters
    pub elements: Vec<Range<usize>>,
    pub commas: Vec<usize>,
}

impl ListParts {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// A separator after the last element (`{ a, b, }`).
    pub fn has_trailing_comma(&self) -> bool {
        match (self.commas.last(), self.elements.last()) {
            (Some(comma), Some(last)) => *comma >= last.end,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

pub fn list_parts(node: &Node) -> Option<ListParts> {
    let is_open = |t: &Token| t.is("(") || t.is("{") || t.is("[");
    let is_close = |t: &Token| t.is(")") || t.is("}") || t.is("]");
    let open = node
        .children
        .iter()
        .position(|c| c.as_token().is_some_and(is_open))?;
    let close = node
        .children
        .iter()
        .rposition(|c| c.as_token().is_some_and(is_close))?;
    if close <= open {
        return None;
    }

    let mut elements = Vec::new();
    let mut commas = Vec::new();
    let mut start = open + 1;
    for i in open + 1..close {
        if node.children[i].as_token().is_some_and(|t| t.is(",")) {
            if start < i {
                elements.push(start..i);
            }
            commas.push(i);
            start = i + 1;
        }
    }
    if start < close {
        elements.push(start..close);
    }
    Some(ListParts {
        open,
        close,
        elements,
        commas,
    })
}
