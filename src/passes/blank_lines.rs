//! Collapse runs of blank lines.
//!
//! Inside a block a run of blank lines shrinks to one. Right after an
//! opening brace, right before a closing brace and at either end of the
//! unit every blank line goes.

use crate::error::RewriteError;
use crate::pipeline::{DiagnosticSink, Rewrite, SyntaxPass, UnitContext};
use crate::syntax::layout::ends_with_line_break;
use crate::syntax::{Layout, SyntaxTree, Token};

pub struct CollapseBlankLines;

impl CollapseBlankLines {
    pub const NAME: &'static str = "collapse-blank-lines";
}

impl SyntaxPass for CollapseBlankLines {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn rewrite(
        &self,
        _cx: &UnitContext<'_>,
        tree: &SyntaxTree,
        _sink: &mut DiagnosticSink,
    ) -> Result<Rewrite, RewriteError> {
        let tokens = tree.root().tokens();
        let mut plans = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| tokens[p]);
            if !starts_line(prev) {
                plans.push(None);
                continue;
            }
            let after_open = prev.is_none_or(|p| p.is("{"));
            let before_close = token.is("}") || token.is_end_of_file();
            plans.push(collapse(&token.leading, after_open, before_close));
        }
        if plans.iter().all(Option::is_none) {
            return Ok(Rewrite::Unchanged);
        }

        let mut next = tree.clone();
        for (token, plan) in next.root_mut().tokens_mut().into_iter().zip(plans) {
            if let Some(leading) = plan {
                token.leading = leading;
            }
        }
        Ok(Rewrite::compare(tree, next))
    }
}

/// One line of a leading layout sequence and the line break ending it.
struct Line<'a> {
    content: &'a [Layout],
    end: Option<&'a Layout>,
}

impl Line<'_> {
    fn is_blank(&self) -> bool {
        self.end.is_some() && self.content.iter().all(Layout::is_whitespace)
    }
}

fn split_lines(leading: &[Layout]) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, layout) in leading.iter().enumerate() {
        if layout.is_end_of_line() {
            lines.push(Line {
                content: &leading[start..i],
                end: Some(layout),
            });
            start = i + 1;
        }
    }
    lines.push(Line {
        content: &leading[start..],
        end: None,
    });
    lines
}

/// The collapsed leading, or `None` when nothing changes.
fn collapse(leading: &[Layout], after_open: bool, before_close: bool) -> Option<Vec<Layout>> {
    let lines = split_lines(leading);
    let first_content = lines.iter().position(|l| !l.is_blank());
    // the token's own line is never blank, so `first_content` is always set
    let first_content = first_content.unwrap_or(lines.len() - 1);
    let last_content = lines[..lines.len() - 1]
        .iter()
        .rposition(|l| !l.is_blank())
        .filter(|&i| i >= first_content);

    let mut keep = vec![true; lines.len()];
    let mut run = 0;
    for (i, line) in lines.iter().enumerate() {
        if !line.is_blank() {
            run = 0;
            continue;
        }
        run += 1;
        let allowed = if i < first_content {
            if after_open || before_close && last_content.is_none() {
                0
            } else {
                1
            }
        } else if last_content.is_some_and(|last| i > last) && before_close {
            0
        } else {
            1
        };
        keep[i] = run <= allowed;
    }
    if keep.iter().all(|&k| k) {
        return None;
    }

    let mut out = Vec::with_capacity(leading.len());
    for (line, kept) in lines.iter().zip(keep) {
        if kept {
            out.extend(line.content.iter().cloned());
            out.extend(line.end.cloned());
        }
    }
    Some(out)
}

/// The leading only starts a line when the previous trailing ended one.
pub(crate) fn starts_line(prev: Option<&Token>) -> bool {
    prev.is_none_or(|p| ends_with_line_break(&p.trailing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewriteConfig;
    use crate::passes::testing::run_pass;
    use crate::pipeline::Pass;
    use crate::syntax::lex_layout;

    fn run(source: &str) -> String {
        run_pass(
            Pass::Syntax(Box::new(CollapseBlankLines)),
            source,
            RewriteConfig::default(),
        )
        .text
    }

    #[test]
    fn three_blank_lines_become_one() {
        let source = "class A\n{\n    int a;\n\n\n\n    int b;\n}\n";
        assert_eq!(run(source), "class A\n{\n    int a;\n\n    int b;\n}\n");
    }

    #[test]
    fn no_blank_lines_stay_none() {
        let source = "class A\n{\n    int a;\n    int b;\n}\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn blank_lines_hugging_braces_go() {
        let source = "class A\n{\n\n    int a;\n\n}\n";
        assert_eq!(run(source), "class A\n{\n    int a;\n}\n");
    }

    #[test]
    fn unit_edges_lose_blank_lines() {
        let source = "\n\nclass A { }\n\n\n";
        assert_eq!(run(source), "class A { }\n");
    }

    #[test]
    fn comments_keep_one_blank_line_around_them() {
        let source = "class A\n{\n    int a;\n\n\n    // b\n\n\n    int b;\n}\n";
        assert_eq!(
            run(source),
            "class A\n{\n    int a;\n\n    // b\n\n    int b;\n}\n"
        );
    }

    #[test]
    fn blank_lines_after_a_comment_before_close_go() {
        let source = "class A\n{\n    int a;\n    // end\n\n}\n";
        assert_eq!(run(source), "class A\n{\n    int a;\n    // end\n}\n");
    }

    #[test]
    fn crlf_line_breaks_are_preserved() {
        let source = "class A\r\n{\r\n    int a;\r\n\r\n\r\n    int b;\r\n}\r\n";
        assert_eq!(run(source), "class A\r\n{\r\n    int a;\r\n\r\n    int b;\r\n}\r\n");
    }

    #[test]
    fn collapse_reports_no_change_when_clean() {
        assert_eq!(collapse(&lex_layout("\n    "), false, false), None);
        assert_eq!(
            collapse(&lex_layout("\n\n    "), true, false),
            Some(lex_layout("    "))
        );
    }
}
