//! Span bookkeeping for one tree version.
//!
//! A [`SyntaxIndex`] is rebuilt from scratch whenever a pass needs
//! positions. It is never carried across tree versions.

use super::kind::NodeKind;
use super::node::{Element, Node, NodePath, Span, SyntaxTree};
use super::SyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEntry {
    pub path: NodePath,
    /// Span of the token text, layout excluded
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub path: NodePath,
    pub kind: NodeKind,
    /// From the first token's text to the last token's text
    pub span: Span,
}

/// Token and node positions of a tree, both in document order.
#[derive(Debug, Clone)]
pub struct SyntaxIndex {
    text: String,
    tokens: Vec<TokenEntry>,
    nodes: Vec<NodeEntry>,
}

impl SyntaxIndex {
    pub fn build(tree: &SyntaxTree) -> Self {
        let mut index = Self {
            text: tree.text(),
            tokens: Vec::new(),
            nodes: Vec::new(),
        };
        let mut offset = 0;
        index.visit(tree.root(), NodePath::root(), &mut offset);
        index
    }

    fn visit(&mut self, node: &Node, path: NodePath, offset: &mut usize) -> Option<Span> {
        let slot = self.nodes.len();
        self.nodes.push(NodeEntry {
            path: path.clone(),
            kind: node.kind.clone(),
            span: Span::empty(*offset),
        });

        let mut covered: Option<Span> = None;
        for (i, child) in node.children.iter().enumerate() {
            let child_span = match child {
                Element::Token(token) => {
                    let start = *offset + token.leading_len();
                    let span = Span::new(start, start + token.text.len());
                    *offset += token.full_len();
                    self.tokens.push(TokenEntry {
                        path: path.child(i),
                        span,
                    });
                    (!token.is_end_of_file()).then_some(span)
                }
                Element::Node(child) => self.visit(child, path.child(i), offset),
            };
            if let Some(span) = child_span {
                covered = Some(match covered {
                    Some(prev) => Span::new(prev.start, span.end),
                    None => span,
                });
            }
        }

        if let Some(span) = covered {
            self.nodes[slot].span = span;
        } else {
            self.nodes[slot].span = Span::empty(*offset);
        }
        covered
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[TokenEntry] {
        &self.tokens
    }

    /// Nodes in pre-order, root first.
    pub fn nodes(&self) -> &[NodeEntry] {
        &self.nodes
    }

    /// The token whose text covers exactly `span`.
    pub fn token_at_span(&self, span: Span) -> Result<&TokenEntry, SyntaxError> {
        self.tokens
            .binary_search_by(|entry| entry.span.start.cmp(&span.start))
            .ok()
            .map(|i| &self.tokens[i])
            .filter(|entry| entry.span == span)
            .or_else(|| {
                // zero-width tokens share a start with their successor
                self.tokens.iter().find(|entry| entry.span == span)
            })
            .ok_or(SyntaxError::SpanOutOfRange {
                span,
                len: self.text.len(),
            })
    }

    pub fn token_span(&self, path: &NodePath) -> Option<Span> {
        self.tokens
            .binary_search_by(|entry| entry.path.cmp(path))
            .ok()
            .map(|i| self.tokens[i].span)
    }

    pub fn node(&self, path: &NodePath) -> Option<&NodeEntry> {
        self.nodes
            .binary_search_by(|entry| entry.path.cmp(path))
            .ok()
            .map(|i| &self.nodes[i])
    }

    pub fn node_span(&self, path: &NodePath) -> Option<Span> {
        self.node(path).map(|entry| entry.span)
    }

    /// Span of any element, token or node.
    pub fn element_span(&self, path: &NodePath) -> Option<Span> {
        self.node_span(path).or_else(|| self.token_span(path))
    }

    /// Strict ancestors of `path` with their kinds, nearest first.
    pub fn ancestors<'a>(&'a self, path: &'a NodePath) -> impl Iterator<Item = &'a NodeEntry> + 'a {
        path.ancestors().filter_map(move |ancestor| self.node(&ancestor))
    }

    /// Whitespace at the start of the line holding `offset`.
    pub fn line_indent(&self, offset: usize) -> &str {
        let offset = offset.min(self.text.len());
        let line_start = self.text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line = &self.text[line_start..];
        let width = line
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(line.len());
        &line[..width]
    }

    /// Identifier tokens whose text is `name`, restricted to `within`.
    pub fn identifiers_named<'a>(
        &'a self,
        tree: &'a SyntaxTree,
        name: &'a str,
        within: Span,
    ) -> impl Iterator<Item = &'a TokenEntry> + 'a {
        self.tokens.iter().filter(move |entry| {
            within.contains(entry.span)
                && tree
                    .token_at(&entry.path)
                    .is_ok_and(|t| t.is_identifier() && t.text == name)
        })
    }
}
