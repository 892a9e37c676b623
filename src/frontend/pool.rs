//! Thread-local parser pooling.
//!
//! Creating a tree-sitter parser and loading the grammar is the expensive
//! part of parsing a small file. Each thread (rayon workers included)
//! keeps one parser and reuses it.

use super::{CSharpParser, FrontendError};
use std::cell::RefCell;

thread_local! {
    static CSHARP_PARSER: RefCell<Option<CSharpParser>> = const { RefCell::new(None) };
}

/// Execute `f` with this thread's pooled parser, creating it on first use.
pub fn with_parser<F, R>(f: F) -> Result<R, FrontendError>
where
    F: FnOnce(&mut CSharpParser) -> R,
{
    CSHARP_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let parser = match slot.take() {
            Some(parser) => parser,
            None => CSharpParser::new()?,
        };
        Ok(f(slot.insert(parser)))
    })
}
