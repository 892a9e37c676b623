use super::node::{NodePath, SyntaxTree};
use super::SyntaxError;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The rename primitive: replace the text of one token, with verification.
///
/// Renames of any scope compile down to batches of token edits. The
/// intelligence lives in deciding which tokens to touch, not in applying.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "TokenEdit does nothing until apply() is called"]
pub struct TokenEdit {
    /// Path of the token inside the tree version the edit was planned on
    pub path: NodePath,
    /// Text the token should carry afterwards
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (for long literal tokens)
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("before-text verification failed at {path}: found {found:?}")]
    BeforeTextMismatch {
        path: NodePath,
        expected: String,
        found: String,
    },

    #[error("conflicting edits for token at {0}")]
    Conflicting(NodePath),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// Result of applying an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditResult should be checked for success/already-applied"]
pub enum EditResult {
    Applied { path: NodePath },
    /// The token already carried the new text
    AlreadyApplied { path: NodePath },
}

impl TokenEdit {
    pub fn new(path: NodePath, new_text: impl Into<String>, expected_before: &str) -> Self {
        Self {
            path,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    pub fn with_verification(
        path: NodePath,
        new_text: impl Into<String>,
        verification: EditVerification,
    ) -> Self {
        Self {
            path,
            new_text: new_text.into(),
            expected_before: verification,
        }
    }

    /// Check the edit against `tree`; `Ok(true)` means already applied.
    fn validate(&self, tree: &SyntaxTree) -> Result<bool, EditError> {
        let current = &tree.token_at(&self.path)?.text;
        if *current == self.new_text {
            return Ok(true);
        }
        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                path: self.path.clone(),
                expected: format!("{:?}", self.expected_before),
                found: current.clone(),
            });
        }
        Ok(false)
    }

    pub fn apply(&self, tree: &mut SyntaxTree) -> Result<EditResult, EditError> {
        if self.validate(tree)? {
            return Ok(EditResult::AlreadyApplied {
                path: self.path.clone(),
            });
        }
        tree.token_at_mut(&self.path)?.text = self.new_text.clone();
        Ok(EditResult::Applied {
            path: self.path.clone(),
        })
    }

    /// Apply several edits to one tree, all or nothing.
    ///
    /// Every edit is validated before the first one is applied, and two
    /// edits that want different text for the same token are rejected.
    pub fn apply_batch(
        tree: &mut SyntaxTree,
        mut edits: Vec<TokenEdit>,
    ) -> Result<Vec<EditResult>, EditError> {
        edits.sort_by(|a, b| a.path.cmp(&b.path));
        for window in edits.windows(2) {
            if window[0].path == window[1].path && window[0].new_text != window[1].new_text {
                return Err(EditError::Conflicting(window[0].path.clone()));
            }
        }
        edits.dedup_by(|a, b| a.path == b.path);

        for edit in &edits {
            edit.validate(tree)?;
        }

        edits.iter().map(|edit| edit.apply(tree)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Element, Node, NodeKind, Token, TokenKind};

    fn tree() -> SyntaxTree {
        SyntaxTree::new(Node::new(
            NodeKind::CompilationUnit,
            vec![
                Element::Token(Token::new(TokenKind::Identifier, "count")),
                Element::Token(Token::new(TokenKind::Punctuation, "+")),
                Element::Token(Token::new(TokenKind::Identifier, "count")),
            ],
        ))
    }

    fn at(i: usize) -> NodePath {
        NodePath::from_indices(vec![i])
    }

    #[test]
    fn test_edit_verification_exact_match() {
        let verify = EditVerification::ExactMatch("hello world".to_string());
        assert!(verify.matches("hello world"));
        assert!(!verify.matches("hello"));
    }

    #[test]
    fn test_edit_verification_hash() {
        let text = "hello world";
        let verify = EditVerification::Hash(xxh3_64(text.as_bytes()));
        assert!(verify.matches(text));
        assert!(!verify.matches("goodbye world"));
    }

    #[test]
    fn test_edit_verification_from_text_large() {
        let text = "x".repeat(2000);
        assert!(matches!(
            EditVerification::from_text(&text),
            EditVerification::Hash(_)
        ));
        assert!(matches!(
            EditVerification::from_text("small"),
            EditVerification::ExactMatch(_)
        ));
    }

    #[test]
    fn test_apply_single_edit() {
        let mut tree = tree();
        let result = TokenEdit::new(at(0), "_count", "count").apply(&mut tree).unwrap();
        assert!(matches!(result, EditResult::Applied { .. }));
        assert_eq!(tree.text(), "_count+count");
    }

    #[test]
    fn test_edit_idempotency() {
        let mut tree = tree();
        let edit = TokenEdit::new(at(0), "_count", "count");
        let _ = edit.apply(&mut tree).unwrap();
        let again = edit.apply(&mut tree).unwrap();
        assert!(matches!(again, EditResult::AlreadyApplied { .. }));
    }

    #[test]
    fn test_before_text_mismatch() {
        let mut tree = tree();
        let result = TokenEdit::new(at(1), "-", "*").apply(&mut tree);
        assert!(matches!(result, Err(EditError::BeforeTextMismatch { .. })));
    }

    #[test]
    fn test_edit_on_node_path_is_rejected() {
        let mut tree = tree();
        let result = TokenEdit::new(at(7), "x", "y").apply(&mut tree);
        assert!(matches!(result, Err(EditError::Syntax(_))));
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut tree = tree();
        let edits = vec![
            TokenEdit::new(at(0), "_count", "count"),
            TokenEdit::new(at(2), "_count", "total"),
        ];
        assert!(TokenEdit::apply_batch(&mut tree, edits).is_err());
        assert_eq!(tree.text(), "count+count");

        let edits = vec![
            TokenEdit::new(at(2), "_count", "count"),
            TokenEdit::new(at(0), "_count", "count"),
        ];
        let results = TokenEdit::apply_batch(&mut tree, edits).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(tree.text(), "_count+_count");
    }

    #[test]
    fn test_batch_rejects_conflicts() {
        let mut tree = tree();
        let edits = vec![
            TokenEdit::new(at(0), "a", "count"),
            TokenEdit::new(at(0), "b", "count"),
        ];
        assert!(matches!(
            TokenEdit::apply_batch(&mut tree, edits),
            Err(EditError::Conflicting(_))
        ));
    }
}
