//! Sort and de-duplicate using directives.
//!
//! Each contiguous run of usings (at the top of the unit or of a
//! namespace) is ordered as: global usings first, then plain namespaces,
//! static usings and aliases, with `System` namespaces leading their
//! group. Comments directly above a using travel with it; blank lines
//! inside the run are dropped and anything above the last blank line
//! before the first using stays at the top.

use crate::config::RewriteConfig;
use crate::error::RewriteError;
use crate::pipeline::{DiagnosticSink, Rewrite, SyntaxPass, UnitContext};
use crate::syntax::layout::{ends_with_line_break, line_indentation};
use crate::syntax::{Element, Layout, LayoutKind, Node, NodeKind, SyntaxTree};
use std::collections::HashMap;
use tracing::debug;

pub struct SortUsings;

impl SortUsings {
    pub const NAME: &'static str = "sort-usings";
}

impl SyntaxPass for SortUsings {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn rewrite(
        &self,
        cx: &UnitContext<'_>,
        tree: &SyntaxTree,
        sink: &mut DiagnosticSink,
    ) -> Result<Rewrite, RewriteError> {
        let mut next = tree.clone();
        visit(next.root_mut(), cx.config, sink);
        Ok(Rewrite::compare(tree, next))
    }
}

fn visit(node: &mut Node, config: &RewriteConfig, sink: &mut DiagnosticSink) {
    sort_runs(&mut node.children, config, sink);
    for child in node.children.iter_mut() {
        if let Element::Node(child) = child {
            if matches!(
                child.kind,
                NodeKind::Namespace | NodeKind::FileScopedNamespace | NodeKind::DeclarationList
            ) {
                visit(child, config, sink);
            }
        }
    }
}

fn sort_runs(children: &mut Vec<Element>, config: &RewriteConfig, sink: &mut DiagnosticSink) {
    let is_using = |e: &Element| {
        e.as_node()
            .is_some_and(|n| n.kind == NodeKind::UsingDirective)
    };
    let mut i = 0;
    while i < children.len() {
        if !is_using(&children[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < children.len() && is_using(&children[i]) {
            i += 1;
        }
        let run: Vec<&Node> = children[start..i]
            .iter()
            .filter_map(Element::as_node)
            .collect();
        if let Some(sorted) = sort_run(&run, config, sink) {
            let removed = i - start;
            let added = sorted.len();
            children.splice(start..i, sorted.into_iter().map(Element::Node));
            i = i - removed + added;
        }
    }
}

struct Entry {
    node: Node,
    key: UsingKey,
    identity: String,
    /// Comment lines directly above, plus the indentation of the using line
    attached: Vec<Layout>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct UsingKey {
    not_global: bool,
    group: UsingGroup,
    not_system: bool,
    folded: String,
    name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum UsingGroup {
    Namespace,
    Static,
    Alias,
}

impl UsingKey {
    fn of(using: &Node, system_first: bool) -> Self {
        let tokens = using.tokens();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        let global = texts.first() == Some(&"global");
        let group = if texts.contains(&"=") {
            UsingGroup::Alias
        } else if texts.contains(&"static") {
            UsingGroup::Static
        } else {
            UsingGroup::Namespace
        };
        let name: String = texts
            .iter()
            .filter(|t| !matches!(**t, "global" | "using" | "static" | ";"))
            .take_while(|t| **t != "=" || group != UsingGroup::Alias)
            .copied()
            .collect();
        let is_system = name == "System" || name.starts_with("System.");
        Self {
            not_global: !global,
            group,
            not_system: !(system_first && is_system),
            folded: name.to_lowercase(),
            name,
        }
    }
}

/// The sorted run, or `None` when it has to stay as written.
fn sort_run(run: &[&Node], config: &RewriteConfig, sink: &mut DiagnosticSink) -> Option<Vec<Node>> {
    for using in run {
        let first = using.first_token()?;
        let blocking = first.leading.iter().any(|l| {
            matches!(
                l.kind,
                LayoutKind::Directive
                    | LayoutKind::DisabledText
                    | LayoutKind::Region
                    | LayoutKind::EndRegion
            )
        });
        if blocking {
            sink.skipped("using directives under preprocessor directives left in place");
            return None;
        }
        if !using
            .last_token()
            .is_some_and(|t| ends_with_line_break(&t.trailing))
        {
            debug!("using run shares a line with other code, leaving it");
            return None;
        }
    }

    let header_len = run
        .first()
        .and_then(|u| u.first_token())
        .map_or(0, |t| header_end(&t.leading));

    let mut entries: Vec<Entry> = Vec::with_capacity(run.len());
    let mut by_identity: HashMap<String, usize> = HashMap::new();
    for (i, using) in run.iter().enumerate() {
        let mut node = (*using).clone();
        let leading = node
            .first_token_mut()
            .map(|t| std::mem::take(&mut t.leading))
            .unwrap_or_default();
        let attached = if i == 0 {
            leading[header_len..].to_vec()
        } else {
            drop_blank_lines(&leading)
        };
        let identity = node
            .tokens()
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if let Some(&kept) = by_identity.get(&identity) {
            debug!(using = %identity, "dropping duplicate using");
            let comments = comment_lines(&attached, &node);
            let target = &mut entries[kept].attached;
            target.splice(0..0, comments);
            continue;
        }
        by_identity.insert(identity.clone(), entries.len());
        entries.push(Entry {
            key: UsingKey::of(&node, config.usings.system_first),
            node,
            identity,
            attached,
        });
    }

    entries.sort_by(|a, b| a.key.cmp(&b.key));

    let header: Vec<Layout> = run
        .first()
        .and_then(|u| u.first_token())
        .map(|t| t.leading[..header_len].to_vec())
        .unwrap_or_default();
    let mut sorted = Vec::with_capacity(entries.len());
    for (i, mut entry) in entries.into_iter().enumerate() {
        let mut leading = if i == 0 { header.clone() } else { Vec::new() };
        leading.append(&mut entry.attached);
        if let Some(first) = entry.node.first_token_mut() {
            first.leading = leading;
        }
        debug!(using = %entry.identity, position = i, "placed using");
        sorted.push(entry.node);
    }
    Some(sorted)
}

/// Index just past the last blank line of `leading`.
fn header_end(leading: &[Layout]) -> usize {
    let mut end = 0;
    let mut line_start = 0;
    for (i, layout) in leading.iter().enumerate() {
        if layout.is_end_of_line() {
            if leading[line_start..i].iter().all(Layout::is_whitespace) {
                end = i + 1;
            }
            line_start = i + 1;
        }
    }
    end
}

fn drop_blank_lines(leading: &[Layout]) -> Vec<Layout> {
    let mut out = Vec::with_capacity(leading.len());
    let mut line_start = 0;
    for (i, layout) in leading.iter().enumerate() {
        if layout.is_end_of_line() {
            let line = &leading[line_start..=i];
            if !line[..line.len() - 1].iter().all(Layout::is_whitespace) {
                out.extend_from_slice(line);
            }
            line_start = i + 1;
        }
    }
    out.extend_from_slice(&leading[line_start..]);
    out
}

/// Comments of a dropped duplicate, as whole lines to put above the survivor.
fn comment_lines(attached: &[Layout], dropped: &Node) -> Vec<Layout> {
    let mut lines: Vec<Layout> = match attached.iter().rposition(Layout::is_end_of_line) {
        Some(eol) => attached[..=eol].to_vec(),
        None => Vec::new(),
    };
    let trailing: Vec<Layout> = dropped
        .last_token()
        .map(|t| {
            t.trailing
                .iter()
                .filter(|l| !l.is_trivial())
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    if !trailing.is_empty() {
        let indent = line_indentation(attached);
        if !indent.is_empty() {
            lines.push(Layout::whitespace(indent));
        }
        lines.extend(trailing);
        lines.push(Layout::end_of_line());
    }
    lines
}
