use super::kind::NodeKind;
use super::token::Token;
use super::SyntaxError;
use serde::Serialize;
use std::fmt;

/// Child of a node: either another node or a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element {
    Node(Node),
    Token(Token),
}

impl Element {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Element::Node(node) => Some(node),
            Element::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Element::Token(token) => Some(token),
            Element::Node(_) => None,
        }
    }

    pub fn first_token(&self) -> Option<&Token> {
        match self {
            Element::Token(token) => Some(token),
            Element::Node(node) => node.first_token(),
        }
    }

    pub fn last_token(&self) -> Option<&Token> {
        match self {
            Element::Token(token) => Some(token),
            Element::Node(node) => node.last_token(),
        }
    }

    pub fn first_token_mut(&mut self) -> Option<&mut Token> {
        match self {
            Element::Token(token) => Some(token),
            Element::Node(node) => node.first_token_mut(),
        }
    }

    pub fn last_token_mut(&mut self) -> Option<&mut Token> {
        match self {
            Element::Token(token) => Some(token),
            Element::Node(node) => node.last_token_mut(),
        }
    }

    pub fn write_to(&self, out: &mut String) {
        match self {
            Element::Token(token) => token.write_to(out),
            Element::Node(node) => node.write_to(out),
        }
    }

    /// Number of elements in this subtree, itself included.
    pub fn element_count(&self) -> usize {
        match self {
            Element::Token(_) => 1,
            Element::Node(node) => node.element_count(),
        }
    }
}

/// Interior CST node. Equality is structural, which is what the scheduler
/// uses to detect that a pass made no change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Element>,
}

impl Node {
    pub fn new(kind: NodeKind, children: Vec<Element>) -> Self {
        Self { kind, children }
    }

    pub fn first_token(&self) -> Option<&Token> {
        self.children.iter().find_map(Element::first_token)
    }

    pub fn last_token(&self) -> Option<&Token> {
        self.children.iter().rev().find_map(Element::last_token)
    }

    pub fn first_token_mut(&mut self) -> Option<&mut Token> {
        self.children.iter_mut().find_map(Element::first_token_mut)
    }

    pub fn last_token_mut(&mut self) -> Option<&mut Token> {
        self.children.iter_mut().rev().find_map(Element::last_token_mut)
    }

    /// Direct node children with their child index.
    pub fn child_nodes(&self) -> impl Iterator<Item = (usize, &Node)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, child)| child.as_node().map(|node| (i, node)))
    }

    /// Direct token children with their child index.
    pub fn child_tokens(&self) -> impl Iterator<Item = (usize, &Token)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, child)| child.as_token().map(|token| (i, token)))
    }

    pub fn find_child(&self, kind: &NodeKind) -> Option<(usize, &Node)> {
        self.child_nodes().find(|(_, node)| &node.kind == kind)
    }

    /// Every token of the subtree, in document order.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        collect_tokens(self, &mut out);
        out
    }

    pub fn tokens_mut(&mut self) -> Vec<&mut Token> {
        let mut out = Vec::new();
        collect_tokens_mut(self, &mut out);
        out
    }

    /// True when any node of the subtree (itself excluded) matches.
    pub fn contains_kind(&self, pred: &dyn Fn(&NodeKind) -> bool) -> bool {
        self.child_nodes()
            .any(|(_, child)| pred(&child.kind) || child.contains_kind(pred))
    }

    pub fn element_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Element::element_count)
            .sum::<usize>()
    }

    pub fn write_to(&self, out: &mut String) {
        for child in &self.children {
            child.write_to(out);
        }
    }

    /// Rendered text, layout included.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    /// Token texts joined without any layout (`Task<int>`, `System.IO`).
    pub fn compact_text(&self) -> String {
        self.tokens().iter().map(|t| t.text.as_str()).collect()
    }
}

fn collect_tokens<'a>(node: &'a Node, out: &mut Vec<&'a Token>) {
    for child in &node.children {
        match child {
            Element::Token(token) => out.push(token),
            Element::Node(node) => collect_tokens(node, out),
        }
    }
}

fn collect_tokens_mut<'a>(node: &'a mut Node, out: &mut Vec<&'a mut Token>) {
    for child in node.children.iter_mut() {
        match child {
            Element::Token(token) => out.push(token),
            Element::Node(node) => collect_tokens_mut(node, out),
        }
    }
}

/// Child-index path from the root. Lexicographic order is document
/// (pre-)order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    pub fn last_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// True when `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> + '_ {
        (0..self.0.len()).rev().map(|len| Self(self.0[..len].to_vec()))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// Byte range over the rendered text of one tree version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self::new(at, at)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One compilation unit's CST.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntaxTree {
    root: Node,
}

impl SyntaxTree {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    pub fn text(&self) -> String {
        self.root.text()
    }

    pub fn element_count(&self) -> usize {
        self.root.element_count()
    }

    pub fn element_at(&self, path: &NodePath) -> Result<&Element, SyntaxError> {
        let (last, parents) = path
            .indices()
            .split_last()
            .ok_or_else(|| SyntaxError::InvalidPath(path.clone()))?;
        let mut node = &self.root;
        for &index in parents {
            node = node
                .children
                .get(index)
                .and_then(Element::as_node)
                .ok_or_else(|| SyntaxError::InvalidPath(path.clone()))?;
        }
        node.children
            .get(*last)
            .ok_or_else(|| SyntaxError::InvalidPath(path.clone()))
    }

    fn element_at_mut(&mut self, path: &NodePath) -> Result<&mut Element, SyntaxError> {
        let (last, parents) = path
            .indices()
            .split_last()
            .ok_or_else(|| SyntaxError::InvalidPath(path.clone()))?;
        let mut node = &mut self.root;
        for &index in parents {
            node = match node.children.get_mut(index) {
                Some(Element::Node(child)) => child,
                _ => return Err(SyntaxError::InvalidPath(path.clone())),
            };
        }
        node.children
            .get_mut(*last)
            .ok_or_else(|| SyntaxError::InvalidPath(path.clone()))
    }

    pub fn node_at(&self, path: &NodePath) -> Result<&Node, SyntaxError> {
        if path.depth() == 0 {
            return Ok(&self.root);
        }
        self.element_at(path)?
            .as_node()
            .ok_or_else(|| SyntaxError::InvalidPath(path.clone()))
    }

    pub fn token_at(&self, path: &NodePath) -> Result<&Token, SyntaxError> {
        self.element_at(path)?
            .as_token()
            .ok_or_else(|| SyntaxError::InvalidPath(path.clone()))
    }

    pub fn token_at_mut(&mut self, path: &NodePath) -> Result<&mut Token, SyntaxError> {
        match self.element_at_mut(path)? {
            Element::Token(token) => Ok(token),
            Element::Node(_) => Err(SyntaxError::InvalidPath(path.clone())),
        }
    }

    /// Swap the node at `path` for `node`.
    pub fn replace_node(&mut self, path: &NodePath, node: Node) -> Result<(), SyntaxError> {
        if path.depth() == 0 {
            self.root = node;
            return Ok(());
        }
        let slot = self.element_at_mut(path)?;
        if slot.as_node().is_none() {
            return Err(SyntaxError::InvalidPath(path.clone()));
        }
        *slot = Element::Node(node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::layout::lex_layout;
    use crate::syntax::TokenKind;

    fn sample() -> SyntaxTree {
        let call = Node::new(
            NodeKind::Invocation,
            vec![
                Element::Token(Token::new(TokenKind::Identifier, "Run")),
                Element::Node(Node::new(
                    NodeKind::ArgumentList,
                    vec![
                        Element::Token(Token::new(TokenKind::Punctuation, "(")),
                        Element::Token(Token::new(TokenKind::Punctuation, ")")),
                    ],
                )),
            ],
        );
        let statement = Node::new(
            NodeKind::Statement,
            vec![
                Element::Node(call),
                Element::Token(
                    Token::new(TokenKind::Punctuation, ";").with_trailing(lex_layout("\n")),
                ),
            ],
        );
        SyntaxTree::new(Node::new(
            NodeKind::CompilationUnit,
            vec![
                Element::Node(statement),
                Element::Token(Token::end_of_file()),
            ],
        ))
    }

    #[test]
    fn renders_text() {
        assert_eq!(sample().text(), "Run();\n");
    }

    #[test]
    fn counts_elements() {
        // root, statement, invocation, Run, list, (, ), ;, eof
        assert_eq!(sample().element_count(), 9);
    }

    #[test]
    fn resolves_paths() {
        let tree = sample();
        let list = tree
            .node_at(&NodePath::from_indices(vec![0, 0, 1]))
            .unwrap();
        assert_eq!(list.kind, NodeKind::ArgumentList);
        let paren = tree
            .token_at(&NodePath::from_indices(vec![0, 0, 1, 1]))
            .unwrap();
        assert_eq!(paren.text, ")");
        assert!(matches!(
            tree.node_at(&NodePath::from_indices(vec![0, 5])),
            Err(SyntaxError::InvalidPath(_))
        ));
        assert!(tree.token_at(&NodePath::from_indices(vec![0])).is_err());
    }

    #[test]
    fn replace_node_swaps_subtree() {
        let mut tree = sample();
        let path = NodePath::from_indices(vec![0, 0, 1]);
        let mut list = tree.node_at(&path).unwrap().clone();
        list.children[0] = Element::Token(
            Token::new(TokenKind::Punctuation, "(").with_trailing(lex_layout(" ")),
        );
        tree.replace_node(&path, list).unwrap();
        assert_eq!(tree.text(), "Run( );\n");
    }

    #[test]
    fn path_ancestry() {
        let path = NodePath::from_indices(vec![1, 2, 3]);
        let ancestors: Vec<_> = path.ancestors().collect();
        assert_eq!(ancestors.len(), 3);
        assert_eq!(ancestors[0], NodePath::from_indices(vec![1, 2]));
        assert_eq!(ancestors[2], NodePath::root());
        assert!(NodePath::from_indices(vec![1]).is_ancestor_of(&path));
        assert!(!path.is_ancestor_of(&path));
        assert_eq!(path.to_string(), "/1/2/3");
    }

    #[test]
    fn structural_equality_detects_layout_changes() {
        let a = sample();
        let mut b = sample();
        assert_eq!(a, b);
        b.root_mut().last_token_mut().unwrap().leading = lex_layout("\n");
        assert_ne!(a, b);
    }
}
