//! Break or collapse argument lists, parameter lists and initializers.
//!
//! One list is reshaped per iteration, in document order; the scheduler
//! re-runs the pass until every list already has its shape.

mod indent;
mod width;

use crate::error::RewriteError;
use crate::pipeline::{DiagnosticSink, Rewrite, SyntaxPass, UnitContext};
use crate::syntax::layout::has_non_trivial;
use crate::syntax::query::{self, ListParts};
use crate::syntax::{Element, Layout, Node, NodeKind, SyntaxIndex, SyntaxTree, Token};
use indent::{list_indent, ListIndent};
use std::ops::Range;
use tracing::debug;

pub struct ListLayout;

impl ListLayout {
    pub const NAME: &'static str = "list-layout";
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Broken(ListIndent),
    Collapsed,
}

impl SyntaxPass for ListLayout {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn rewrite(
        &self,
        cx: &UnitContext<'_>,
        tree: &SyntaxTree,
        _sink: &mut DiagnosticSink,
    ) -> Result<Rewrite, RewriteError> {
        let index = SyntaxIndex::build(tree);
        for entry in index.nodes() {
            if !entry.kind.is_list() {
                continue;
            }
            let (Some(parent_path), Some(child)) = (entry.path.parent(), entry.path.last_index())
            else {
                continue;
            };
            let list = tree.node_at(&entry.path)?;
            let Some(parts) = query::list_parts(list) else {
                continue;
            };
            if let Some(reason) = skip_reason(list, &parts) {
                debug!(unit = cx.name, path = %entry.path, "list left as written: {reason}");
                continue;
            }

            let config = &cx.config.layout;
            let breaks = if parts.is_empty() {
                false
            } else if entry.kind == NodeKind::Initializer && config.break_initializers {
                true
            } else {
                width::measure(tree.node_at(&parent_path)?, child) > config.max_width
            };
            let shape = if breaks {
                Shape::Broken(list_indent(&index, &entry.path, &config.indent))
            } else {
                Shape::Collapsed
            };

            let mut shaped = list.clone();
            match &shape {
                Shape::Broken(indent) => {
                    let eol = line_break_near(list, &parts)
                        .unwrap_or_else(|| first_line_break(tree));
                    break_list(&mut shaped, &parts, indent, eol);
                }
                Shape::Collapsed => collapse_list(&mut shaped, &parts),
            }
            if &shaped != list {
                debug!(unit = cx.name, kind = %entry.kind, path = %entry.path, ?shape, "reshaped list");
                let mut next = tree.clone();
                next.replace_node(&entry.path, shaped)?;
                return Ok(Rewrite::Changed(next));
            }
        }
        Ok(Rewrite::Unchanged)
    }
}

/// Lists whose layout carries meaning a reshape would lose.
fn skip_reason(list: &Node, parts: &ListParts) -> Option<&'static str> {
    let open = list.children[parts.open].as_token()?;
    let close = list.children[parts.close].as_token()?;
    let commented = has_non_trivial(&open.trailing)
        || has_non_trivial(&close.leading)
        || list.children[parts.open + 1..parts.close]
            .iter()
            .flat_map(element_tokens)
            .any(Token::has_comments);
    if commented {
        return Some("comments inside the list");
    }
    let has_body = list.children[parts.open + 1..parts.close].iter().any(|child| {
        child
            .as_node()
            .is_some_and(|n| n.kind.is_body() || n.contains_kind(&NodeKind::is_body))
    });
    has_body.then_some("an element holds a statement body")
}

fn element_tokens(element: &Element) -> Vec<&Token> {
    match element {
        Element::Token(token) => vec![token],
        Element::Node(node) => node.tokens(),
    }
}

fn is_brace_list(list: &Node, parts: &ListParts) -> bool {
    list.children[parts.open]
        .as_token()
        .is_some_and(|t| t.is("{"))
}

fn first_token_in(list: &mut Node, range: Range<usize>) -> Option<&mut Token> {
    list.children[range].iter_mut().find_map(Element::first_token_mut)
}

fn last_token_in(list: &mut Node, range: Range<usize>) -> Option<&mut Token> {
    list.children[range]
        .iter_mut()
        .rev()
        .find_map(Element::last_token_mut)
}

fn indentation(indent: &str) -> Vec<Layout> {
    if indent.is_empty() {
        Vec::new()
    } else {
        vec![Layout::whitespace(indent)]
    }
}

/// One element per line, closing delimiter on its own line.
fn break_list(list: &mut Node, parts: &ListParts, indent: &ListIndent, eol: Layout) {
    set_trailing(list, parts.open, vec![eol.clone()]);
    for element in &parts.elements {
        if let Some(first) = first_token_in(list, element.clone()) {
            first.leading = indentation(&indent.elements);
        }
        if let Some(last) = last_token_in(list, element.clone()) {
            last.trailing = Vec::new();
        }
    }
    for &comma in &parts.commas {
        if let Some(Element::Token(token)) = list.children.get_mut(comma) {
            token.leading = Vec::new();
            token.trailing = vec![eol.clone()];
        }
    }
    if let Some(before_close) = last_token_in(list, parts.open + 1..parts.close) {
        before_close.trailing = vec![eol];
    }
    set_leading(list, parts.close, indentation(&indent.close));
}

/// Everything on one line: `(a, b)`, `{ a, b }`, `()`, `{ }`.
fn collapse_list(list: &mut Node, parts: &ListParts) {
    let pad = if is_brace_list(list, parts) {
        vec![Layout::whitespace(" ")]
    } else {
        Vec::new()
    };
    set_trailing(list, parts.open, pad.clone());
    for element in &parts.elements {
        if let Some(first) = first_token_in(list, element.clone()) {
            first.leading = Vec::new();
        }
        if let Some(last) = last_token_in(list, element.clone()) {
            last.trailing = Vec::new();
        }
    }
    for &comma in &parts.commas {
        if let Some(Element::Token(token)) = list.children.get_mut(comma) {
            token.leading = Vec::new();
            token.trailing = vec![Layout::whitespace(" ")];
        }
    }
    if !parts.is_empty() {
        if let Some(before_close) = last_token_in(list, parts.open + 1..parts.close) {
            before_close.trailing = pad;
        }
    }
    set_leading(list, parts.close, Vec::new());
}

fn set_trailing(list: &mut Node, child: usize, trailing: Vec<Layout>) {
    if let Some(Element::Token(token)) = list.children.get_mut(child) {
        token.trailing = trailing;
    }
}

fn set_leading(list: &mut Node, child: usize, leading: Vec<Layout>) {
    if let Some(Element::Token(token)) = list.children.get_mut(child) {
        token.leading = leading;
    }
}

/// Reuse a line break already written in the list so CRLF files stay CRLF.
fn line_break_near(list: &Node, parts: &ListParts) -> Option<Layout> {
    list.children[parts.open..=parts.close]
        .iter()
        .flat_map(element_tokens)
        .flat_map(|t| t.leading.iter().chain(t.trailing.iter()))
        .find(|l| l.is_end_of_line())
        .cloned()
}

fn first_line_break(tree: &SyntaxTree) -> Layout {
    tree.root()
        .tokens()
        .into_iter()
        .flat_map(|t| t.leading.iter().chain(t.trailing.iter()))
        .find(|l| l.is_end_of_line())
        .cloned()
        .unwrap_or_else(Layout::end_of_line)
}
