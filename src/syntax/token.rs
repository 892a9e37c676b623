use super::layout::{has_non_trivial, layout_len, render_layout, Layout};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    Identifier,
    Keyword,
    Punctuation,
    Literal,
    /// Zero-width token that carries the layout after the last real token
    EndOfFile,
}

/// A terminal with its attached layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub leading: Vec<Layout>,
    pub trailing: Vec<Layout>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            leading: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub fn end_of_file() -> Self {
        Self::new(TokenKind::EndOfFile, "")
    }

    pub fn with_leading(mut self, leading: Vec<Layout>) -> Self {
        self.leading = leading;
        self
    }

    pub fn with_trailing(mut self, trailing: Vec<Layout>) -> Self {
        self.trailing = trailing;
        self
    }

    /// True for a punctuation or keyword token spelled `text`.
    pub fn is(&self, text: &str) -> bool {
        self.text == text && matches!(self.kind, TokenKind::Punctuation | TokenKind::Keyword)
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    pub fn is_end_of_file(&self) -> bool {
        self.kind == TokenKind::EndOfFile
    }

    pub fn leading_len(&self) -> usize {
        layout_len(&self.leading)
    }

    /// Length of the token including its layout.
    pub fn full_len(&self) -> usize {
        self.leading_len() + self.text.len() + layout_len(&self.trailing)
    }

    /// Comments, directives or disabled text on either side.
    pub fn has_comments(&self) -> bool {
        has_non_trivial(&self.leading) || has_non_trivial(&self.trailing)
    }

    pub fn write_to(&self, out: &mut String) {
        render_layout(&self.leading, out);
        out.push_str(&self.text);
        render_layout(&self.trailing, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::layout::lex_layout;

    #[test]
    fn renders_layout_around_text() {
        let token = Token::new(TokenKind::Identifier, "count")
            .with_leading(lex_layout("\n    "))
            .with_trailing(lex_layout(" // note\n"));
        let mut out = String::new();
        token.write_to(&mut out);
        assert_eq!(out, "\n    count // note\n");
        assert_eq!(token.full_len(), out.len());
        assert!(token.has_comments());
    }

    #[test]
    fn is_matches_only_punctuation_and_keywords() {
        assert!(Token::new(TokenKind::Punctuation, "{").is("{"));
        assert!(Token::new(TokenKind::Keyword, "static").is("static"));
        assert!(!Token::new(TokenKind::Identifier, "static").is("static"));
    }
}
