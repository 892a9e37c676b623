//! Per-unit declaration and identifier facts.
//!
//! Everything here is derived from one tree version and thrown away when
//! the tree changes. Cross-unit resolution happens in the model on top of
//! these facts.

use crate::syntax::{query, Element, Node, NodeKind, NodePath, Span, SyntaxIndex, SyntaxTree};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclKind {
    Type,
    Field,
    Event,
    Property,
    Method,
    /// Constructors and destructors: named after their type, never renamed
    Constructor,
    Parameter,
    Local,
}

impl DeclKind {
    pub(crate) fn is_member(self) -> bool {
        matches!(
            self,
            DeclKind::Field | DeclKind::Event | DeclKind::Property | DeclKind::Method
        )
    }

    pub(crate) fn is_local(self) -> bool {
        matches!(self, DeclKind::Parameter | DeclKind::Local)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Declaration {
    pub kind: DeclKind,
    pub name: String,
    pub name_span: Span,
    /// Qualified name of the innermost enclosing type, empty at top level
    pub owner: String,
    /// Member span for locals and parameters, declaration span otherwise
    pub scope: Span,
}

#[derive(Debug, Clone)]
pub(crate) struct TypeScope {
    pub qualified: String,
    pub span: Span,
}

/// Syntactic shape of an identifier occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Site {
    /// Name token of a declaration
    Declaration,
    /// `name:` label of a named argument
    Label,
    /// Right of a `.` (or the target of an object initializer assignment)
    Qualified { this_receiver: bool },
    Simple,
}

#[derive(Debug, Clone)]
pub(crate) struct Occurrence {
    pub name: String,
    pub span: Span,
    pub site: Site,
    /// Qualified name of the innermost enclosing type, empty at top level
    pub enclosing_type: String,
    /// Scope of the local or parameter this simple name resolves to
    pub local_scope: Option<Span>,
    pub is_write: bool,
}

#[derive(Debug)]
pub(crate) struct UnitFacts {
    pub index: SyntaxIndex,
    pub declarations: Vec<Declaration>,
    pub types: Vec<TypeScope>,
    pub occurrences: Vec<Occurrence>,
    pub entry_point: bool,
}

impl UnitFacts {
    pub(crate) fn analyze(tree: &SyntaxTree) -> Self {
        let index = SyntaxIndex::build(tree);
        let mut walker = Walker {
            index: &index,
            declarations: Vec::new(),
            types: Vec::new(),
            entry_point: false,
        };
        walker.walk(tree.root(), &NodePath::root(), "", None);
        let Walker {
            declarations,
            types,
            mut entry_point,
            ..
        } = walker;
        entry_point |= tree
            .root()
            .child_nodes()
            .any(|(_, node)| node.kind == NodeKind::Statement);

        let occurrences = collect_occurrences(tree, &index, &declarations, &types);
        Self {
            index,
            declarations,
            types,
            occurrences,
            entry_point,
        }
    }

    /// Qualified names of the types enclosing `span`, innermost first.
    pub(crate) fn enclosing_type(&self, span: Span) -> String {
        innermost_type(&self.types, span)
    }
}

pub(crate) fn qualify(owner: &str, name: &str) -> String {
    if owner.is_empty() {
        name.to_string()
    } else {
        format!("{owner}.{name}")
    }
}

/// `Outer.Inner` yields `Outer.Inner`, then `Outer`.
pub(crate) fn type_chain(qualified: &str) -> impl Iterator<Item = &str> {
    let mut current = Some(qualified).filter(|q| !q.is_empty());
    std::iter::from_fn(move || {
        let this = current?;
        current = this.rfind('.').map(|dot| &this[..dot]);
        Some(this)
    })
}

fn innermost_type(types: &[TypeScope], span: Span) -> String {
    types
        .iter()
        .filter(|t| t.span.contains(span))
        .min_by_key(|t| t.span.len())
        .map(|t| t.qualified.clone())
        .unwrap_or_default()
}

struct Walker<'a> {
    index: &'a SyntaxIndex,
    declarations: Vec<Declaration>,
    types: Vec<TypeScope>,
    entry_point: bool,
}

impl Walker<'_> {
    fn span(&self, path: &NodePath) -> Span {
        self.index
            .element_span(path)
            .unwrap_or_else(|| Span::empty(0))
    }

    fn declare(
        &mut self,
        kind: DeclKind,
        node: &Node,
        path: &NodePath,
        name_index: usize,
        owner: &str,
        scope: Span,
    ) {
        let Some(token) = node.children[name_index].as_token() else {
            return;
        };
        self.declarations.push(Declaration {
            kind,
            name: token.text.clone(),
            name_span: self.span(&path.child(name_index)),
            owner: owner.to_string(),
            scope,
        });
    }

    fn walk_children(&mut self, node: &Node, path: &NodePath, owner: &str, member: Option<Span>) {
        for (i, child) in node.child_nodes() {
            self.walk(child, &path.child(i), owner, member);
        }
    }

    fn walk(&mut self, node: &Node, path: &NodePath, owner: &str, member: Option<Span>) {
        let span = self.span(path);
        match &node.kind {
            kind if kind.is_type_declaration() || *kind == NodeKind::EnumDeclaration => {
                let Some(name_index) = query::name_index(node) else {
                    self.walk_children(node, path, owner, member);
                    return;
                };
                self.declare(DeclKind::Type, node, path, name_index, owner, span);
                let qualified = qualify(owner, query::name(node).unwrap_or_default());
                self.types.push(TypeScope {
                    qualified: qualified.clone(),
                    span,
                });
                self.walk_children(node, path, &qualified, None);
            }
            NodeKind::DelegateDeclaration => {
                if let Some(name_index) = query::name_index(node) {
                    self.declare(DeclKind::Type, node, path, name_index, owner, span);
                }
                self.walk_children(node, path, owner, Some(span));
            }
            NodeKind::FieldDeclaration | NodeKind::EventFieldDeclaration => {
                let kind = if node.kind == NodeKind::FieldDeclaration {
                    DeclKind::Field
                } else {
                    DeclKind::Event
                };
                for (relative, declarator) in query::declarators(node) {
                    let declarator_path = relative.iter().fold(path.clone(), |p, &i| p.child(i));
                    if let Some(name_index) = query::name_index(declarator) {
                        self.declare(kind, declarator, &declarator_path, name_index, owner, span);
                    }
                }
            }
            NodeKind::MethodDeclaration
            | NodeKind::PropertyDeclaration
            | NodeKind::EventDeclaration => {
                let kind = match node.kind {
                    NodeKind::MethodDeclaration => DeclKind::Method,
                    NodeKind::PropertyDeclaration => DeclKind::Property,
                    _ => DeclKind::Event,
                };
                if let Some(name_index) = query::name_index(node) {
                    self.declare(kind, node, path, name_index, owner, span);
                    if kind == DeclKind::Method
                        && query::name(node) == Some("Main")
                        && query::has_modifier(node, "static")
                    {
                        self.entry_point = true;
                    }
                }
                self.walk_children(node, path, owner, Some(span));
            }
            NodeKind::ConstructorDeclaration | NodeKind::DestructorDeclaration => {
                if let Some(name_index) = query::name_index(node) {
                    self.declare(DeclKind::Constructor, node, path, name_index, owner, span);
                }
                self.walk_children(node, path, owner, Some(span));
            }
            NodeKind::OperatorDeclaration | NodeKind::IndexerDeclaration => {
                self.walk_children(node, path, owner, Some(span));
            }
            NodeKind::Parameter | NodeKind::VariableDeclarator => {
                if let (Some(scope), Some(name_index)) = (member, query::name_index(node)) {
                    let kind = if node.kind == NodeKind::Parameter {
                        DeclKind::Parameter
                    } else {
                        DeclKind::Local
                    };
                    self.declare(kind, node, path, name_index, owner, scope);
                }
                self.walk_children(node, path, owner, member);
            }
            NodeKind::Lambda => {
                // `x => ...` declares `x` without a parameter node
                if let Some(scope) = member {
                    let arrow = node
                        .children
                        .iter()
                        .position(|c| c.as_token().is_some_and(|t| t.is("=>")));
                    if let Some(i) = arrow.and_then(|end| {
                        node.children[..end]
                            .iter()
                            .rposition(|c| c.as_token().is_some_and(|t| t.is_identifier()))
                    }) {
                        self.declare(DeclKind::Parameter, node, path, i, owner, scope);
                    }
                }
                self.walk_children(node, path, owner, member);
            }
            NodeKind::Statement if node.first_token().is_some_and(|t| t.is("foreach")) => {
                if let Some(scope) = member {
                    let in_index = node
                        .children
                        .iter()
                        .position(|c| c.as_token().is_some_and(|t| t.is("in")));
                    if let Some(i) = in_index.and_then(|end| {
                        node.children[..end]
                            .iter()
                            .rposition(|c| c.as_token().is_some_and(|t| t.is_identifier()))
                    }) {
                        self.declare(DeclKind::Local, node, path, i, owner, scope);
                    }
                }
                self.walk_children(node, path, owner, member);
            }
            NodeKind::Other(kind)
                if matches!(
                    kind.as_str(),
                    "catch_declaration" | "declaration_expression" | "declaration_pattern"
                ) =>
            {
                if let Some(scope) = member {
                    if let Some(i) = node
                        .children
                        .iter()
                        .rposition(|c| c.as_token().is_some_and(|t| t.is_identifier()))
                    {
                        self.declare(DeclKind::Local, node, path, i, owner, scope);
                    }
                }
                self.walk_children(node, path, owner, member);
            }
            _ => self.walk_children(node, path, owner, member),
        }
    }
}

fn collect_occurrences(
    tree: &SyntaxTree,
    index: &SyntaxIndex,
    declarations: &[Declaration],
    types: &[TypeScope],
) -> Vec<Occurrence> {
    let declared: HashSet<Span> = declarations.iter().map(|d| d.name_span).collect();
    let tokens = index.tokens();
    let text_of = |i: usize| {
        tokens
            .get(i)
            .and_then(|entry| tree.token_at(&entry.path).ok())
            .map_or("", |t| t.text.as_str())
    };

    let mut out = Vec::new();
    for (i, entry) in tokens.iter().enumerate() {
        let Ok(token) = tree.token_at(&entry.path) else {
            continue;
        };
        if !token.is_identifier() {
            continue;
        }
        let parent = entry.path.parent().and_then(|p| index.node(&p));
        let grandparent = parent
            .and_then(|p| p.path.parent())
            .and_then(|p| index.node(&p));

        let site = if declared.contains(&entry.span) {
            Site::Declaration
        } else if parent.is_some_and(|p| p.kind == NodeKind::Other("name_colon".to_string())) {
            Site::Label
        } else if i > 0 && matches!(text_of(i - 1), "." | "?." | "->") {
            Site::Qualified {
                this_receiver: i > 1 && text_of(i - 2) == "this",
            }
        } else if parent.is_some_and(|p| p.kind == NodeKind::Assignment)
            && grandparent.is_some_and(|g| g.kind == NodeKind::Initializer)
            && entry.path.last_index() == Some(0)
        {
            Site::Qualified {
                this_receiver: false,
            }
        } else {
            Site::Simple
        };

        let local_scope = if site == Site::Simple {
            declarations
                .iter()
                .filter(|d| d.kind.is_local() && d.name == token.text && d.scope.contains(entry.span))
                .map(|d| d.scope)
                .min_by_key(|scope| scope.len())
        } else {
            None
        };

        out.push(Occurrence {
            name: token.text.clone(),
            span: entry.span,
            site,
            enclosing_type: innermost_type(types, entry.span),
            local_scope,
            is_write: is_write_context(tree, index, &entry.path),
        });
    }
    out
}

/// Assignment target, `++`/`--` operand, `ref`/`out` argument, or
/// anywhere inside a `set`/`init` accessor.
fn is_write_context(tree: &SyntaxTree, index: &SyntaxIndex, path: &NodePath) -> bool {
    for ancestor in index.ancestors(path) {
        let Ok(node) = tree.node_at(&ancestor.path) else {
            continue;
        };
        match ancestor.kind {
            NodeKind::Accessor => {
                if matches!(query::accessor_keyword(node), Some("set" | "init")) {
                    return true;
                }
            }
            NodeKind::Assignment => {
                let target = node
                    .children
                    .first()
                    .and_then(|c| last_token_path(c, ancestor.path.child(0)));
                if target.as_ref() == Some(path) {
                    return true;
                }
            }
            NodeKind::UpdateExpression => {
                let is_step = node.child_tokens().any(|(_, t)| t.is("++") || t.is("--"));
                let operand = node
                    .children
                    .iter()
                    .enumerate()
                    .find(|(_, c)| !c.as_token().is_some_and(|t| t.is("++") || t.is("--")))
                    .and_then(|(i, c)| last_token_path(c, ancestor.path.child(i)));
                if is_step && operand.as_ref() == Some(path) {
                    return true;
                }
            }
            NodeKind::Argument => {
                let by_ref = node.first_token().is_some_and(|t| t.is("ref") || t.is("out"));
                let last = node
                    .children
                    .iter()
                    .enumerate()
                    .next_back()
                    .and_then(|(i, c)| last_token_path(c, ancestor.path.child(i)));
                if by_ref && last.as_ref() == Some(path) {
                    return true;
                }
            }
            ref kind if kind.is_member_declaration() => return false,
            _ => {}
        }
    }
    false
}

fn last_token_path(element: &Element, path: NodePath) -> Option<NodePath> {
    match element {
        Element::Token(_) => Some(path),
        Element::Node(node) => node
            .children
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, child)| last_token_path(child, path.child(i))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse_csharp;

    fn facts(source: &str) -> UnitFacts {
        UnitFacts::analyze(&parse_csharp(source).unwrap())
    }

    fn occurrences<'a>(facts: &'a UnitFacts, name: &str) -> Vec<&'a Occurrence> {
        facts.occurrences.iter().filter(|o| o.name == name).collect()
    }

    #[test]
    fn collects_declarations() {
        let facts = facts(
            "class A { int count; public int Count { get; } void Run(int step) { var total = step; } class B { } }",
        );
        let kinds: Vec<_> = facts
            .declarations
            .iter()
            .map(|d| (d.kind, d.name.as_str(), d.owner.as_str()))
            .collect();
        assert!(kinds.contains(&(DeclKind::Type, "A", "")));
        assert!(kinds.contains(&(DeclKind::Field, "count", "A")));
        assert!(kinds.contains(&(DeclKind::Property, "Count", "A")));
        assert!(kinds.contains(&(DeclKind::Method, "Run", "A")));
        assert!(kinds.contains(&(DeclKind::Parameter, "step", "A")));
        assert!(kinds.contains(&(DeclKind::Local, "total", "A")));
        assert!(kinds.contains(&(DeclKind::Type, "B", "A")));
        assert_eq!(facts.types.len(), 2);
    }

    #[test]
    fn classifies_sites() {
        let facts = facts(
            "class A { int count; void Run(A other, int step) { count = step; other.count++; this.count = 1; } }",
        );
        let counts = occurrences(&facts, "count");
        assert_eq!(counts[0].site, Site::Declaration);
        assert_eq!(counts[1].site, Site::Simple);
        assert!(counts[1].is_write);
        assert_eq!(
            counts[2].site,
            Site::Qualified {
                this_receiver: false
            }
        );
        assert!(counts[2].is_write);
        assert_eq!(
            counts[3].site,
            Site::Qualified {
                this_receiver: true
            }
        );
        let steps = occurrences(&facts, "step");
        assert!(steps[1].local_scope.is_some());
        assert!(!steps[1].is_write);
    }

    #[test]
    fn setter_body_is_write_context() {
        let facts = facts(
            "class A { int count; public int Count { get { return count; } set { Log(count); } } }",
        );
        let counts = occurrences(&facts, "count");
        assert!(!counts[1].is_write);
        assert!(counts[2].is_write);
    }

    #[test]
    fn detects_entry_point() {
        assert!(facts("class P { static void Main(string[] args) { } }").entry_point);
        assert!(!facts("class P { void Main() { } }").entry_point);
    }

    #[test]
    fn type_chain_walks_outwards() {
        let chain: Vec<_> = type_chain("A.B.C").collect();
        assert_eq!(chain, vec!["A.B.C", "A.B", "A"]);
        assert_eq!(type_chain("").count(), 0);
    }
}
