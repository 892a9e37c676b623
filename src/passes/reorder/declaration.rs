//! Sort keys of type members.

use crate::syntax::query;
use crate::syntax::{Node, NodeKind};

/// Member groups in the order they appear in a reordered body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum MemberCategory {
    Field,
    Event,
    Property,
    Indexer,
    Constructor,
    Destructor,
    Operator,
    Method,
    Struct,
    Class,
    Interface,
    Enum,
    Record,
    Delegate,
    Other,
}

impl MemberCategory {
    pub(crate) fn of(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::FieldDeclaration => Self::Field,
            NodeKind::EventFieldDeclaration | NodeKind::EventDeclaration => Self::Event,
            NodeKind::PropertyDeclaration => Self::Property,
            NodeKind::IndexerDeclaration => Self::Indexer,
            NodeKind::ConstructorDeclaration => Self::Constructor,
            NodeKind::DestructorDeclaration => Self::Destructor,
            NodeKind::OperatorDeclaration => Self::Operator,
            NodeKind::MethodDeclaration => Self::Method,
            NodeKind::StructDeclaration => Self::Struct,
            NodeKind::ClassDeclaration => Self::Class,
            NodeKind::InterfaceDeclaration => Self::Interface,
            NodeKind::EnumDeclaration => Self::Enum,
            NodeKind::RecordDeclaration => Self::Record,
            NodeKind::DelegateDeclaration => Self::Delegate,
            _ => Self::Other,
        }
    }
}

/// Rank of private members outside the field and constructor groups.
pub(crate) const PRIVATE_RANK: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct MemberKey {
    pub category: MemberCategory,
    pub rank: usize,
    pub name: String,
}

impl MemberKey {
    pub(crate) fn of(member: &Node) -> Self {
        let category = MemberCategory::of(&member.kind);
        Self {
            category,
            rank: rank(member, category),
            name: clean_name(&member_name(member)),
        }
    }

    pub(crate) fn is_private_method(&self) -> bool {
        self.category == MemberCategory::Method && self.rank == PRIVATE_RANK
    }
}

fn rank(member: &Node, category: MemberCategory) -> usize {
    let modifiers = query::modifiers(member);
    let has = |m: &str| modifiers.contains(&m);
    match category {
        MemberCategory::Field => {
            if has("const") {
                1
            } else if has("static") {
                2
            } else if has("readonly") {
                3
            } else {
                4
            }
        }
        MemberCategory::Constructor => query::parameter_count(member),
        _ => {
            if has("public") && has("static") {
                1
            } else if has("public") {
                2
            } else if has("protected") {
                3
            } else if has("internal") {
                4
            } else if has("private") {
                PRIVATE_RANK
            } else if has("static") {
                6
            } else {
                7
            }
        }
    }
}

/// Declared name; the first declarator for fields, the operator token for
/// operators.
fn member_name(member: &Node) -> String {
    if matches!(
        member.kind,
        NodeKind::FieldDeclaration | NodeKind::EventFieldDeclaration
    ) {
        return query::declarators(member)
            .first()
            .and_then(|(_, declarator)| query::name(declarator))
            .unwrap_or_default()
            .to_string();
    }
    if let Some(name) = query::name(member) {
        return name.to_string();
    }
    let tokens = member.tokens();
    tokens
        .iter()
        .position(|t| t.is("operator") || t.is("this"))
        .and_then(|i| tokens.get(i + usize::from(tokens[i].is("operator"))))
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

/// Alphanumeric projection used for name ordering.
pub(crate) fn clean_name(name: &str) -> String {
    name.chars().filter(|c| c.is_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse_csharp;
    use crate::syntax::{SyntaxIndex, SyntaxTree};

    fn keys(source: &str) -> Vec<MemberKey> {
        let tree: SyntaxTree = parse_csharp(source).unwrap();
        let index = SyntaxIndex::build(&tree);
        index
            .nodes()
            .iter()
            .filter(|entry| {
                entry.kind.is_member_declaration()
                    && index
                        .ancestors(&entry.path)
                        .filter(|a| a.kind.is_type_declaration())
                        .count()
                        == 1
            })
            .map(|entry| MemberKey::of(tree.node_at(&entry.path).unwrap()))
            .collect()
    }

    #[test]
    fn field_ranks() {
        let keys = keys(
            "class A { int a; readonly int b; static int c; const int D = 1; static readonly int e; }",
        );
        let ranks: Vec<_> = keys.iter().map(|k| k.rank).collect();
        assert_eq!(ranks, vec![4, 3, 2, 1, 2]);
        assert!(keys.iter().all(|k| k.category == MemberCategory::Field));
    }

    #[test]
    fn access_ranks() {
        let keys = keys(
            "class A { public static void A1() { } public void A2() { } protected void A3() { } \
             internal void A4() { } private void A5() { } static void A6() { } void A7() { } }",
        );
        let ranks: Vec<_> = keys.iter().map(|k| k.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(keys[4].is_private_method());
        assert!(!keys[6].is_private_method());
    }

    #[test]
    fn constructors_rank_by_arity() {
        let keys = keys("class A { A(int a, int b) { } A() { } }");
        assert_eq!(keys[0].rank, 2);
        assert_eq!(keys[1].rank, 0);
        assert_eq!(keys[0].category, MemberCategory::Constructor);
    }

    #[test]
    fn categories_follow_member_order() {
        assert!(MemberCategory::Field < MemberCategory::Event);
        assert!(MemberCategory::Property < MemberCategory::Indexer);
        assert!(MemberCategory::Constructor < MemberCategory::Operator);
        assert!(MemberCategory::Method < MemberCategory::Struct);
        assert!(MemberCategory::Class < MemberCategory::Interface);
        assert!(MemberCategory::Interface < MemberCategory::Other);
    }

    #[test]
    fn names_are_cleaned() {
        assert_eq!(clean_name("_my_field2"), "myfield2");
        let keys = keys("class A { int _b, c; public static A operator +(A x, A y) => x; }");
        assert_eq!(keys[0].name, "b");
        assert_eq!(keys[1].name, "");
    }
}
