//! Indentation of broken list lines.

use crate::syntax::{NodeEntry, NodePath, SyntaxIndex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ListIndent {
    pub elements: String,
    pub close: String,
}

/// Elements sit one unit deeper than the line of the enclosing statement or
/// member, plus one unit for each call or creation between the list's
/// owner and that statement. The closing delimiter sits one unit out from
/// the elements.
pub(super) fn list_indent(index: &SyntaxIndex, list: &NodePath, unit: &str) -> ListIndent {
    let ancestors: Vec<&NodeEntry> = index.ancestors(list).collect();
    let anchor = ancestors.iter().position(|a| a.kind.is_layout_anchor());
    let base = anchor
        .map(|at| index.line_indent(ancestors[at].span.start))
        .unwrap_or("");
    let calls = ancestors
        .iter()
        .take(anchor.unwrap_or(ancestors.len()))
        .skip(1)
        .filter(|a| a.kind.is_call_like())
        .count();
    let level = 1 + calls;
    ListIndent {
        elements: format!("{base}{}", unit.repeat(level)),
        close: format!("{base}{}", unit.repeat(level - 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse_csharp;
    use crate::syntax::NodeKind;

    fn indents(source: &str, kind: NodeKind, nth: usize) -> ListIndent {
        let tree = parse_csharp(source).unwrap();
        let index = SyntaxIndex::build(&tree);
        let entry = index
            .nodes()
            .iter()
            .filter(|e| e.kind == kind)
            .nth(nth)
            .unwrap();
        list_indent(&index, &entry.path, "    ")
    }

    #[test]
    fn statement_lists_indent_one_level() {
        let source = "class A\n{\n    void M()\n    {\n        Foo(a, b);\n    }\n}\n";
        let indent = indents(source, NodeKind::ArgumentList, 0);
        assert_eq!(indent.elements, " ".repeat(12));
        assert_eq!(indent.close, " ".repeat(8));
    }

    #[test]
    fn parameter_lists_anchor_on_the_member() {
        let source = "class A\n{\n    void M(int a) { }\n}\n";
        let indent = indents(source, NodeKind::ParameterList, 0);
        assert_eq!(indent.elements, " ".repeat(8));
        assert_eq!(indent.close, " ".repeat(4));
    }

    #[test]
    fn nested_calls_add_levels() {
        let source = "class A\n{\n    void M()\n    {\n        Foo(Bar(a, b));\n    }\n}\n";
        let inner = indents(source, NodeKind::ArgumentList, 1);
        assert_eq!(inner.elements, " ".repeat(16));
        assert_eq!(inner.close, " ".repeat(12));
    }
}
