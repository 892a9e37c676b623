//! Layout tokens: the non-semantic text attached to tokens.
//!
//! Layout never changes program meaning, so passes are free to rewrite it,
//! but every layout token a pass does not touch must render back byte for
//! byte. [`lex_layout`] is total: any input splits into layout tokens whose
//! concatenation is the input.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    /// Run of spaces, tabs or form feeds
    Whitespace,
    /// `\n`, `\r\n` or a lone `\r`
    EndOfLine,
    LineComment,
    BlockComment,
    /// `///` line or `/** */` block
    DocComment,
    /// Any `#` directive other than region markers
    Directive,
    Region,
    EndRegion,
    /// Text the frontend could not classify (inactive conditional code, stray bytes)
    DisabledText,
}

impl LayoutKind {
    /// Whitespace and line breaks, the only layout passes may discard.
    pub fn is_trivial(self) -> bool {
        matches!(self, LayoutKind::Whitespace | LayoutKind::EndOfLine)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    pub kind: LayoutKind,
    pub text: String,
}

impl Layout {
    pub fn new(kind: LayoutKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Self::new(LayoutKind::Whitespace, text)
    }

    pub fn end_of_line() -> Self {
        Self::new(LayoutKind::EndOfLine, "\n")
    }

    pub fn region(name: &str) -> Self {
        if name.is_empty() {
            Self::new(LayoutKind::Region, "#region")
        } else {
            Self::new(LayoutKind::Region, format!("#region {name}"))
        }
    }

    pub fn end_region() -> Self {
        Self::new(LayoutKind::EndRegion, "#endregion")
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == LayoutKind::Whitespace
    }

    pub fn is_end_of_line(&self) -> bool {
        self.kind == LayoutKind::EndOfLine
    }

    pub fn is_trivial(&self) -> bool {
        self.kind.is_trivial()
    }

    pub fn is_region_marker(&self) -> bool {
        matches!(self.kind, LayoutKind::Region | LayoutKind::EndRegion)
    }
}

/// Split raw gap text into layout tokens.
pub fn lex_layout(text: &str) -> Vec<Layout> {
    let mut out = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let (kind, len) = next_layout(rest);
        out.push(Layout::new(kind, &rest[..len]));
        rest = &rest[len..];
    }
    out
}

/// Append the rendered text of `layouts` to `out`.
pub fn render_layout(layouts: &[Layout], out: &mut String) {
    for layout in layouts {
        out.push_str(&layout.text);
    }
}

pub fn layout_len(layouts: &[Layout]) -> usize {
    layouts.iter().map(|l| l.text.len()).sum()
}

/// True when the sequence holds anything besides whitespace and line breaks.
pub fn has_non_trivial(layouts: &[Layout]) -> bool {
    layouts.iter().any(|l| !l.is_trivial())
}

pub fn ends_with_line_break(layouts: &[Layout]) -> bool {
    layouts.last().is_some_and(Layout::is_end_of_line)
}

/// Whitespace that indents the line a token sits on, given the token's
/// leading layout. Empty when the token does not start its own line
/// segment or the line carries no indentation.
pub fn line_indentation(leading: &[Layout]) -> &str {
    match leading.last() {
        Some(last) if last.is_whitespace() => {
            let before = leading.len() - 1;
            if before == 0 || leading[before - 1].is_end_of_line() {
                &last.text
            } else {
                ""
            }
        }
        _ => "",
    }
}

/// Index where the first content line of `leading` starts: everything
/// before it is blank lines.
pub fn content_line_start(leading: &[Layout]) -> usize {
    let first_content = leading
        .iter()
        .position(|l| !l.is_trivial())
        .unwrap_or(leading.len());
    leading[..first_content]
        .iter()
        .rposition(Layout::is_end_of_line)
        .map_or(0, |eol| eol + 1)
}

fn next_layout(s: &str) -> (LayoutKind, usize) {
    let bytes = s.as_bytes();
    match bytes[0] {
        b'\r' if bytes.get(1) == Some(&b'\n') => (LayoutKind::EndOfLine, 2),
        b'\r' | b'\n' => (LayoutKind::EndOfLine, 1),
        b' ' | b'\t' | 0x0c => {
            let len = s
                .find(|c: char| c != ' ' && c != '\t' && c != '\u{c}')
                .unwrap_or(s.len());
            (LayoutKind::Whitespace, len)
        }
        b'/' if s.starts_with("///") && !s.starts_with("////") => {
            (LayoutKind::DocComment, line_len(s))
        }
        b'/' if s.starts_with("//") => (LayoutKind::LineComment, line_len(s)),
        b'/' if s.starts_with("/**") && !s.starts_with("/**/") => {
            (LayoutKind::DocComment, block_len(s))
        }
        b'/' if s.starts_with("/*") => (LayoutKind::BlockComment, block_len(s)),
        b'#' => (directive_kind(s), line_len(s)),
        _ => (LayoutKind::DisabledText, line_len(s)),
    }
}

fn line_len(s: &str) -> usize {
    s.find(['\r', '\n']).unwrap_or(s.len())
}

fn block_len(s: &str) -> usize {
    s[2..].find("*/").map_or(s.len(), |end| end + 4)
}

fn directive_kind(s: &str) -> LayoutKind {
    let word = s[1..].trim_start_matches([' ', '\t']);
    if word.starts_with("endregion") {
        LayoutKind::EndRegion
    } else if word.starts_with("region") {
        LayoutKind::Region
    } else {
        LayoutKind::Directive
    }
}
