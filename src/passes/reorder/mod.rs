//! Canonical member order inside type bodies.
//!
//! Members are grouped by category, then ranked, then ordered by name. The
//! blank lines in front of a member belong to its position in the body;
//! comments, attributes and indentation travel with the member. Private
//! methods end up wrapped in a named region.

mod colocate;
mod declaration;

use crate::error::RewriteError;
use crate::model::ProgramModel;
use crate::pipeline::{DiagnosticSink, Rewrite, SemanticPass, UnitContext};
use crate::syntax::layout::{content_line_start, ends_with_line_break, line_indentation};
use crate::syntax::query;
use crate::syntax::{Element, Layout, LayoutKind, Node, NodeKind, NodePath, SyntaxIndex};
use colocate::Colocation;
use declaration::MemberKey;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

pub struct ReorderMembers;

impl ReorderMembers {
    pub const NAME: &'static str = "reorder-members";
}

impl SemanticPass for ReorderMembers {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn rewrite(
        &self,
        cx: &UnitContext<'_>,
        model: &mut dyn ProgramModel,
        sink: &mut DiagnosticSink,
    ) -> Result<Rewrite, RewriteError> {
        let model: &dyn ProgramModel = model;
        let tree = model.tree(cx.unit)?;
        let index = SyntaxIndex::build(tree);

        // reverse pre-order puts nested bodies before their enclosing ones
        let mut plans = Vec::new();
        for entry in index.nodes().iter().rev() {
            if entry.kind != NodeKind::DeclarationList {
                continue;
            }
            let Some(owner_path) = entry.path.parent() else {
                continue;
            };
            let owner = tree.node_at(&owner_path)?;
            if !owner.kind.is_type_declaration() {
                continue;
            }
            let list = tree.node_at(&entry.path)?;
            let owner_name = query::name(owner).unwrap_or("<anonymous>");
            if let Some(plan) = BodyPlan::build(cx, model, &index, &entry.path, list, owner_name, sink)? {
                plans.push((entry.path.clone(), plan));
            }
        }
        if plans.is_empty() {
            return Ok(Rewrite::Unchanged);
        }

        let mut next = tree.clone();
        for (path, plan) in plans {
            let list = next.node_at(&path)?.clone();
            next.replace_node(&path, plan.apply(list))?;
        }
        Ok(Rewrite::compare(tree, next))
    }
}

/// The new shape of one member list, computed on the unit's current tree.
struct BodyPlan {
    open: usize,
    close: usize,
    /// Child index of the member placed at each position
    order: Vec<usize>,
    /// First-token leading layout for each position
    leading: Vec<Vec<Layout>>,
    close_leading: Vec<Layout>,
}

/// A member with the region markers this pass owns already stripped.
struct Member {
    child: usize,
    key: MemberKey,
    /// Blank lines; they stay with the position
    slot: Vec<Layout>,
    /// Comments and indentation; they move with the member
    content: Vec<Layout>,
}

impl BodyPlan {
    fn build(
        cx: &UnitContext<'_>,
        model: &dyn ProgramModel,
        index: &SyntaxIndex,
        path: &NodePath,
        list: &Node,
        owner: &str,
        sink: &mut DiagnosticSink,
    ) -> Result<Option<Self>, RewriteError> {
        let open = list.children.iter().position(|c| c.as_token().is_some_and(|t| t.is("{")));
        let close = list.children.iter().rposition(|c| c.as_token().is_some_and(|t| t.is("}")));
        let (Some(open), Some(close)) = (open, close) else {
            return Ok(None);
        };
        if close <= open + 1 {
            return Ok(None);
        }

        let region_name = cx.config.reorder.private_region_name.as_str();
        if let Some(reason) = blocking_reason(list, open, close, region_name) {
            warn!(unit = cx.name, owner, "members left in place: {reason}");
            sink.skipped(format!("members of '{owner}' left in place: {reason}"));
            return Ok(None);
        }

        let mut members: Vec<Member> = Vec::with_capacity(close - open - 1);
        for child in open + 1..close {
            let Some(node) = list.children[child].as_node() else {
                return Ok(None);
            };
            let leading = node
                .first_token()
                .map(|t| strip_markers(&t.leading, false))
                .unwrap_or_default();
            let split = content_line_start(&leading);
            members.push(Member {
                child,
                key: MemberKey::of(node),
                slot: leading[..split].to_vec(),
                content: leading[split..].to_vec(),
            });
        }
        let close_leading = list.children[close]
            .as_token()
            .map(|t| strip_markers(&t.leading, true))
            .unwrap_or_default();

        let mut sorted: Vec<usize> = (0..members.len()).collect();
        sorted.sort_by(|&a, &b| members[a].key.cmp(&members[b].key));

        if cx.config.reorder.colocate_backing_fields {
            let colocations = colocate::plan(cx, model, index, path, list)?;
            colocate_fields(&mut sorted, &members, &colocations);
        }

        let multi_line = list.children[open]
            .as_token()
            .is_some_and(|t| ends_with_line_break(&t.trailing));
        let private = if cx.is_entry_point || region_name.is_empty() || !multi_line {
            None
        } else {
            let first = sorted.iter().position(|&m| members[m].key.is_private_method());
            let last = sorted.iter().rposition(|&m| members[m].key.is_private_method());
            first.zip(last).map(|(first, last)| first..=last)
        };

        let eol = line_break_of(list);
        let mut leading: Vec<Vec<Layout>> = sorted
            .iter()
            .enumerate()
            .map(|(position, &m)| {
                let mut layouts = members[position].slot.clone();
                layouts.extend(members[m].content.iter().cloned());
                layouts
            })
            .collect();
        let mut close_leading = close_leading;
        if let Some(range) = private {
            insert_region(&mut leading, &mut close_leading, range, region_name, &eol);
        }

        debug!(unit = cx.name, owner, members = members.len(), "planned member order");
        Ok(Some(Self {
            open,
            close,
            order: sorted.iter().map(|&m| members[m].child).collect(),
            leading,
            close_leading,
        }))
    }

    fn apply(self, mut list: Node) -> Node {
        let mut old: Vec<Option<Element>> = list
            .children
            .drain(self.open + 1..self.close)
            .map(Some)
            .collect();
        let mut placed = Vec::with_capacity(old.len());
        for (child, leading) in self.order.iter().zip(self.leading) {
            let Some(mut member) = old.get_mut(child - self.open - 1).and_then(Option::take) else {
                continue;
            };
            if let Some(first) = member.first_token_mut() {
                first.leading = leading;
            }
            placed.push(member);
        }
        let at = self.open + 1;
        list.children.splice(at..at, placed);
        if let Some(Element::Token(close)) = list.children.get_mut(self.close) {
            close.leading = self.close_leading;
        }
        list
    }
}

/// Why a body cannot be reordered, if it cannot.
fn blocking_reason(list: &Node, open: usize, close: usize, region_name: &str) -> Option<&'static str> {
    let mut leadings = Vec::with_capacity(close - open);
    for child in &list.children[open + 1..close] {
        match child {
            Element::Node(node) if node.kind.is_member_declaration() => {
                leadings.extend(node.first_token().map(|t| &t.leading));
            }
            _ => return Some("the body holds more than member declarations"),
        }
    }
    leadings.extend(list.children[close].as_token().map(|t| &t.leading));

    let own_region = Layout::region(region_name);
    let mut opened = 0usize;
    let mut closed = 0usize;
    for layout in leadings.into_iter().flatten() {
        match layout.kind {
            LayoutKind::Directive | LayoutKind::DisabledText => {
                return Some("members sit under preprocessor directives");
            }
            LayoutKind::Region if region_name.is_empty() || layout.text != own_region.text => {
                return Some("members sit inside named regions");
            }
            LayoutKind::Region => opened += 1,
            LayoutKind::EndRegion => closed += 1,
            _ => {}
        }
    }
    (opened != closed).then_some("region markers are unbalanced")
}

/// Move each backing field right in front of its property.
fn colocate_fields(sorted: &mut Vec<usize>, members: &[Member], colocations: &[Colocation]) {
    let position_of_child = |child: usize| members.iter().position(|m| m.child == child);
    for colocation in colocations {
        let (Some(field), Some(property)) = (
            position_of_child(colocation.field),
            position_of_child(colocation.property),
        ) else {
            continue;
        };
        let Some(from) = sorted.iter().position(|&m| m == field) else {
            continue;
        };
        sorted.remove(from);
        let Some(to) = sorted.iter().position(|&m| m == property) else {
            sorted.insert(from, field);
            continue;
        };
        sorted.insert(to, field);
    }
}

/// Wrap the positions in `range` in a named region.
fn insert_region(
    leading: &mut [Vec<Layout>],
    close_leading: &mut Vec<Layout>,
    range: RangeInclusive<usize>,
    name: &str,
    eol: &Layout,
) {
    let (first, last) = range.into_inner();
    let indent = line_indentation(&leading[first]).to_string();
    let indent_layout = (!indent.is_empty()).then(|| Layout::whitespace(indent.as_str()));

    let mut open: Vec<Layout> = Vec::new();
    if first > 0 && !has_blank_line(&leading[first]) {
        open.push(eol.clone());
    }
    open.extend(indent_layout.iter().cloned());
    open.extend([Layout::region(name), eol.clone(), eol.clone()]);
    splice_at_content(&mut leading[first], open);

    let mut end: Vec<Layout> = indent_layout.iter().cloned().collect();
    end.push(Layout::end_region());
    match leading.get_mut(last + 1) {
        Some(next) => {
            if !has_blank_line(next) {
                end.insert(0, eol.clone());
            }
            end.extend([eol.clone(), eol.clone()]);
            splice_at_content(next, end);
        }
        None => {
            end.insert(0, eol.clone());
            end.push(eol.clone());
            splice_at_content(close_leading, end);
        }
    }
}

/// A marker between two members always sits below a blank line.
fn has_blank_line(leading: &[Layout]) -> bool {
    leading[..content_line_start(leading)]
        .iter()
        .any(Layout::is_end_of_line)
}

fn splice_at_content(leading: &mut Vec<Layout>, insert: Vec<Layout>) {
    let at = content_line_start(leading);
    leading.splice(at..at, insert);
}

/// Remove region markers with their indentation and the blank line that
/// separates them from the members. Before a closing brace the blank line
/// sits above the marker, elsewhere below it.
fn strip_markers(leading: &[Layout], before_close: bool) -> Vec<Layout> {
    if !leading.iter().any(Layout::is_region_marker) {
        return leading.to_vec();
    }
    let mut out: Vec<Layout> = Vec::with_capacity(leading.len());
    let mut iter = leading.iter().peekable();
    while let Some(layout) = iter.next() {
        if !layout.is_region_marker() {
            out.push(layout.clone());
            continue;
        }
        let at_line_start = |out: &[Layout]| out.last().is_none_or(Layout::is_end_of_line);
        if out.last().is_some_and(Layout::is_whitespace)
            && at_line_start(&out[..out.len() - 1])
        {
            out.pop();
        }
        iter.next_if(|next| next.is_end_of_line());
        if before_close {
            if out.last().is_some_and(Layout::is_end_of_line) {
                out.pop();
            }
        } else {
            iter.next_if(|next| next.is_end_of_line());
        }
    }
    out
}

/// The first line break written in a body, `\n` when there is none.
fn line_break_of(list: &Node) -> Layout {
    list.tokens()
        .into_iter()
        .flat_map(|t| t.leading.iter().chain(t.trailing.iter()))
        .find(|l| l.is_end_of_line())
        .cloned()
        .unwrap_or_else(Layout::end_of_line)
}
