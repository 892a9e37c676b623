//! The Syntax Model: a lossless CST of nodes, tokens and layout.
//!
//! Trees are values. Passes never mutate the tree they are handed; they
//! clone, edit the clone and hand it back, and the scheduler compares the
//! two structurally to decide whether anything happened.

pub mod edit;
pub mod index;
pub mod kind;
pub mod layout;
pub mod node;
pub mod query;
pub mod token;

pub use edit::{EditError, EditResult, EditVerification, TokenEdit};
pub use index::{NodeEntry, SyntaxIndex, TokenEntry};
pub use kind::NodeKind;
pub use layout::{lex_layout, Layout, LayoutKind};
pub use node::{Element, Node, NodePath, Span, SyntaxTree};
pub use token::{Token, TokenKind};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("span {span} does not address a token (text length {len})")]
    SpanOutOfRange { span: Span, len: usize },

    #[error("path {0} does not address an element of the expected kind")]
    InvalidPath(NodePath),
}
