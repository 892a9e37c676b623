//! Width of a list's enclosing construct, measured as if it were collapsed.
//!
//! Gaps are scored by their position, not their content, so a broken list
//! measures the same as its one-line form.

use crate::syntax::{Element, Node, NodeKind, Token};

fn is_open(token: &Token) -> bool {
    token.is("(") || token.is("[") || token.is("{")
}

fn is_close(token: &Token) -> bool {
    token.is(")") || token.is("]") || token.is("}")
}

/// Tokens of `parent` up to and including the child at `list_child`,
/// attribute lists left out.
fn measured_tokens(parent: &Node, list_child: usize) -> Vec<&Token> {
    let mut tokens = Vec::new();
    for child in parent.children.iter().take(list_child + 1) {
        match child {
            Element::Node(node) if node.kind == NodeKind::AttributeList => {}
            Element::Node(node) => tokens.extend(node.tokens()),
            Element::Token(token) => tokens.push(token),
        }
    }
    tokens
}

fn gap_width(before: &Token, after: &Token) -> usize {
    if is_open(before) || is_close(after) || after.is(",") {
        0
    } else if before.is(",") || !before.trailing.is_empty() || !after.leading.is_empty() {
        1
    } else {
        0
    }
}

/// Collapsed width of `parent`, cut at the end of its child `list_child`.
pub(super) fn measure(parent: &Node, list_child: usize) -> usize {
    let tokens = measured_tokens(parent, list_child);
    let text: usize = tokens.iter().map(|t| t.text.chars().count()).sum();
    let gaps: usize = tokens
        .windows(2)
        .map(|pair| gap_width(pair[0], pair[1]))
        .sum();
    text + gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse_csharp;
    use crate::syntax::SyntaxIndex;

    fn width_of(source: &str, kind: NodeKind) -> usize {
        let tree = parse_csharp(source).unwrap();
        let index = SyntaxIndex::build(&tree);
        let entry = index.nodes().iter().find(|e| e.kind == kind).unwrap();
        let parent = tree.node_at(&entry.path.parent().unwrap()).unwrap();
        measure(parent, entry.path.last_index().unwrap())
    }

    #[test]
    fn measures_collapsed_form() {
        let one_line = width_of("class A { void M() { Foo(a, b); } }", NodeKind::ArgumentList);
        let broken = width_of(
            "class A { void M() { Foo(\n    a,\n    b\n); } }",
            NodeKind::ArgumentList,
        );
        assert_eq!(one_line, "Foo(a, b)".len());
        assert_eq!(broken, one_line);
    }

    #[test]
    fn header_width_skips_attributes() {
        let width = width_of(
            "class A { [Obsolete] public void Run(int a) { } }",
            NodeKind::ParameterList,
        );
        assert_eq!(width, "public void Run(int a)".len());
    }

    #[test]
    fn comma_spacing_is_normalised() {
        let width = width_of("class A { void M() { Foo(a ,b); } }", NodeKind::ArgumentList);
        assert_eq!(width, "Foo(a, b)".len());
    }
}
