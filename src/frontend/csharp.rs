use super::FrontendError;
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Parser, Tree};

/// Tree-sitter parser wrapper for C# source code.
pub struct CSharpParser {
    parser: Parser,
}

impl CSharpParser {
    pub fn new() -> Result<Self, FrontendError> {
        let mut parser = Parser::new();
        // The grammar ships with ast-grep-language
        let ts_lang = SupportLang::CSharp.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| FrontendError::LanguageSet)?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Result<Tree, FrontendError> {
        self.parser
            .parse(source, None)
            .ok_or(FrontendError::ParseFailed)
    }

    pub fn parse_with_source<'a>(
        &mut self,
        source: &'a str,
    ) -> Result<ParsedSource<'a>, FrontendError> {
        let tree = self.parse(source)?;
        Ok(ParsedSource { source, tree })
    }
}

/// A parsed source file with its tree-sitter tree.
pub struct ParsedSource<'a> {
    pub source: &'a str,
    pub tree: Tree,
}

impl ParsedSource<'_> {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Every ERROR or MISSING node in the tree.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        if self.tree.root_node().has_error() {
            collect_error_nodes(self.tree.root_node(), &mut errors);
        }
        errors
    }
}

/// Location of an ERROR or MISSING node.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
}

fn collect_error_nodes(node: tree_sitter::Node<'_>, errors: &mut Vec<ErrorNode>) {
    if node.is_error() || node.is_missing() {
        errors.push(ErrorNode {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_csharp() {
        let mut parser = CSharpParser::new().unwrap();
        let parsed = parser
            .parse_with_source("class A { void M() { } }")
            .unwrap();
        assert!(parsed.error_nodes().is_empty());
        assert_eq!(parsed.root_node().kind(), "compilation_unit");
    }

    #[test]
    fn parse_invalid_csharp() {
        let mut parser = CSharpParser::new().unwrap();
        let parsed = parser.parse_with_source("class A { void M( }").unwrap();
        assert!(!parsed.error_nodes().is_empty());
    }
}
