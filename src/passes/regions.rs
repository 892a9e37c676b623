//! Strip `#region` / `#endregion` markers.

use crate::error::RewriteError;
use crate::pipeline::{DiagnosticSink, Rewrite, SyntaxPass, UnitContext};
use crate::syntax::{Layout, LayoutKind, SyntaxTree};
use tracing::warn;

pub struct RemoveRegions;

impl RemoveRegions {
    pub const NAME: &'static str = "remove-regions";
}

impl SyntaxPass for RemoveRegions {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn rewrite(
        &self,
        cx: &UnitContext<'_>,
        tree: &SyntaxTree,
        sink: &mut DiagnosticSink,
    ) -> Result<Rewrite, RewriteError> {
        if cx.is_entry_point {
            return Ok(Rewrite::Unchanged);
        }

        let mut depth = 0usize;
        let mut markers = 0usize;
        for token in tree.root().tokens() {
            for layout in &token.leading {
                match layout.kind {
                    LayoutKind::Region => depth += 1,
                    LayoutKind::EndRegion => match depth.checked_sub(1) {
                        Some(d) => depth = d,
                        None => return Ok(unbalanced(cx, sink)),
                    },
                    _ => continue,
                }
                markers += 1;
            }
        }
        if markers == 0 {
            return Ok(Rewrite::Unchanged);
        }
        if depth != 0 {
            return Ok(unbalanced(cx, sink));
        }

        let mut next = tree.clone();
        for token in next.root_mut().tokens_mut() {
            if token.leading.iter().any(Layout::is_region_marker) {
                token.leading = strip_markers(&token.leading);
            }
        }
        Ok(Rewrite::compare(tree, next))
    }
}

fn unbalanced(cx: &UnitContext<'_>, sink: &mut DiagnosticSink) -> Rewrite {
    warn!(unit = cx.name, "unbalanced region markers, leaving them in place");
    sink.skipped("unbalanced #region/#endregion markers left in place");
    Rewrite::Unchanged
}

/// Drop each marker with the indentation before it and the line break after it.
fn strip_markers(layouts: &[Layout]) -> Vec<Layout> {
    let mut out: Vec<Layout> = Vec::with_capacity(layouts.len());
    let mut iter = layouts.iter().peekable();
    while let Some(layout) = iter.next() {
        if !layout.is_region_marker() {
            out.push(layout.clone());
            continue;
        }
        if out.last().is_some_and(Layout::is_whitespace) {
            out.pop();
        }
        iter.next_if(|next| next.is_end_of_line());
    }
    out
}
