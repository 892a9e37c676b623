//! Reference frontend: C# source text to a lossless [`SyntaxTree`].
//!
//! The rewriting core never depends on this module; it only consumes
//! trees. Any parser that honours the round-trip contract
//! (`tree.text() == source`) can stand in for it.

mod builder;
mod csharp;
mod pool;

pub use csharp::{CSharpParser, ErrorNode, ParsedSource};
pub use pool::with_parser;

use crate::syntax::SyntaxTree;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("syntax error detected at byte {byte_start}..{byte_end}")]
    SyntaxError { byte_start: usize, byte_end: usize },

    #[error("multiple syntax errors detected: {count} ERROR nodes")]
    MultipleSyntaxErrors { count: usize },

    #[error("grammar produced overlapping leaves at byte {0}")]
    OverlappingLeaves(usize),
}

/// Parse C# source into a CST, rejecting sources with syntax errors.
pub fn parse_csharp(source: &str) -> Result<SyntaxTree, FrontendError> {
    with_parser(|parser| {
        let parsed = parser.parse_with_source(source)?;
        let errors = parsed.error_nodes();
        match errors.as_slice() {
            [] => builder::build(source, parsed.root_node()),
            [single] => Err(FrontendError::SyntaxError {
                byte_start: single.byte_start,
                byte_end: single.byte_end,
            }),
            many => Err(FrontendError::MultipleSyntaxErrors { count: many.len() }),
        }
    })?
}
