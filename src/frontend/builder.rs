//! Tree-sitter tree to Syntax Model conversion.
//!
//! Leaves become tokens. Everything between two leaves (whitespace,
//! comments, directive lines) is lexed into layout and attached: the part
//! up to and including the first line break trails the previous token, the
//! rest leads the next one. Text after the last leaf leads a zero-width
//! end-of-file token, so the rendered tree is always the source.

use super::FrontendError;
use crate::syntax::{
    lex_layout, Element, Layout, LayoutKind, Node, NodeKind, SyntaxTree, Token, TokenKind,
};
use tree_sitter::Node as TsNode;

pub(super) fn build(source: &str, root: TsNode<'_>) -> Result<SyntaxTree, FrontendError> {
    let mut builder = Builder {
        source,
        pos: 0,
        string_start: None,
    };
    let mut children = match builder.convert(root)? {
        Some(Element::Node(node)) => node.children,
        Some(token @ Element::Token(_)) => vec![token],
        None => Vec::new(),
    };
    let tail = builder.gap_layout(&source[builder.pos..]);
    children.push(Element::Token(Token::end_of_file().with_leading(tail)));

    let mut root = Node::new(NodeKind::CompilationUnit, children);
    attach_trailing(&mut root);
    Ok(SyntaxTree::new(root))
}

struct Builder<'s> {
    source: &'s str,
    /// End of the last consumed leaf
    pos: usize,
    /// Start of the outermost string literal being converted
    string_start: Option<usize>,
}

impl Builder<'_> {
    fn convert(&mut self, node: TsNode<'_>) -> Result<Option<Element>, FrontendError> {
        let kind = node.kind();
        if kind == "comment" || node.start_byte() == node.end_byte() {
            return Ok(None);
        }

        let directive_line_end = if self.string_start.is_none()
            && self.source.as_bytes().get(node.start_byte()) == Some(&b'#')
        {
            let start = node.start_byte();
            Some(
                self.source[start..]
                    .find(['\r', '\n'])
                    .map_or(self.source.len(), |i| start + i),
            )
        } else {
            None
        };

        if node.child_count() == 0 {
            if directive_line_end.is_some() {
                return Ok(None);
            }
            return self.token(node).map(|t| Some(Element::Token(t)));
        }

        let outer_string = self.string_start;
        if outer_string.is_none() && is_string_like(kind) {
            self.string_start = Some(node.start_byte());
        }

        let mut children = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if directive_line_end.is_some_and(|end| child.start_byte() < end) {
                continue;
            }
            if let Some(element) = self.convert(child)? {
                children.push(element);
            }
        }
        self.string_start = outer_string;

        if children.is_empty() {
            return Ok(None);
        }
        Ok(Some(Element::Node(Node::new(map_kind(kind), children))))
    }

    fn token(&mut self, node: TsNode<'_>) -> Result<Token, FrontendError> {
        let (start, end) = (node.start_byte(), node.end_byte());
        if start < self.pos {
            return Err(FrontendError::OverlappingLeaves(start));
        }
        let source = self.source;
        let leading = self.gap_layout(&source[self.pos..start]);
        let text = &source[start..end];
        self.pos = end;
        Ok(Token::new(token_kind(node.kind(), node.is_named(), text), text).with_leading(leading))
    }

    /// Layout for the gap starting at `self.pos`.
    fn gap_layout(&self, gap: &str) -> Vec<Layout> {
        if gap.is_empty() {
            return Vec::new();
        }
        // whitespace inside a string literal is content, keep it opaque
        if self.string_start.is_some_and(|start| self.pos >= start) {
            return vec![Layout::new(LayoutKind::DisabledText, gap)];
        }
        lex_layout(gap)
    }
}

fn attach_trailing(root: &mut Node) {
    let mut tokens = root.tokens_mut();
    for i in 1..tokens.len() {
        let (before, after) = tokens.split_at_mut(i);
        let prev = &mut before[i - 1];
        let next = &mut after[0];
        let split = next
            .leading
            .iter()
            .position(Layout::is_end_of_line)
            .map_or(next.leading.len(), |eol| eol + 1);
        prev.trailing = next.leading.drain(..split).collect();
    }
}

fn is_string_like(kind: &str) -> bool {
    kind.contains("string") || kind == "character_literal"
}

fn token_kind(kind: &str, named: bool, text: &str) -> TokenKind {
    if named && matches!(kind, "identifier" | "discard") {
        TokenKind::Identifier
    } else if kind.contains("literal")
        || kind.contains("string")
        || kind.contains("content")
        || kind == "escape_sequence"
    {
        TokenKind::Literal
    } else if text.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        TokenKind::Keyword
    } else {
        TokenKind::Punctuation
    }
}

/// Grammar kind to Syntax Model kind.
fn map_kind(kind: &str) -> NodeKind {
    match kind {
        "compilation_unit" => NodeKind::CompilationUnit,
        "using_directive" => NodeKind::UsingDirective,
        "namespace_declaration" => NodeKind::Namespace,
        "file_scoped_namespace_declaration" => NodeKind::FileScopedNamespace,
        "class_declaration" => NodeKind::ClassDeclaration,
        "struct_declaration" => NodeKind::StructDeclaration,
        "interface_declaration" => NodeKind::InterfaceDeclaration,
        "record_declaration" | "record_struct_declaration" => NodeKind::RecordDeclaration,
        "enum_declaration" => NodeKind::EnumDeclaration,
        "delegate_declaration" => NodeKind::DelegateDeclaration,
        "declaration_list" => NodeKind::DeclarationList,
        "field_declaration" => NodeKind::FieldDeclaration,
        "event_field_declaration" => NodeKind::EventFieldDeclaration,
        "event_declaration" => NodeKind::EventDeclaration,
        "property_declaration" => NodeKind::PropertyDeclaration,
        "indexer_declaration" => NodeKind::IndexerDeclaration,
        "accessor_list" => NodeKind::AccessorList,
        "accessor_declaration" => NodeKind::Accessor,
        "constructor_declaration" => NodeKind::ConstructorDeclaration,
        "destructor_declaration" => NodeKind::DestructorDeclaration,
        "operator_declaration" | "conversion_operator_declaration" => {
            NodeKind::OperatorDeclaration
        }
        "method_declaration" => NodeKind::MethodDeclaration,
        "attribute_list" => NodeKind::AttributeList,
        "modifier" => NodeKind::Modifier,
        "explicit_interface_specifier" => NodeKind::ExplicitInterfaceSpecifier,
        "parameter_list" => NodeKind::ParameterList,
        "parameter" => NodeKind::Parameter,
        "argument_list" => NodeKind::ArgumentList,
        "argument" => NodeKind::Argument,
        "invocation_expression" => NodeKind::Invocation,
        "object_creation_expression"
        | "implicit_object_creation_expression"
        | "array_creation_expression"
        | "implicit_array_creation_expression" => NodeKind::ObjectCreation,
        "initializer_expression" => NodeKind::Initializer,
        "variable_declaration" => NodeKind::VariableDeclaration,
        "variable_declarator" => NodeKind::VariableDeclarator,
        "equals_value_clause" => NodeKind::EqualsValue,
        "local_declaration_statement" => NodeKind::LocalDeclaration,
        "block" => NodeKind::Block,
        "assignment_expression" => NodeKind::Assignment,
        "prefix_unary_expression" | "postfix_unary_expression" => NodeKind::UpdateExpression,
        "member_access_expression" => NodeKind::MemberAccess,
        "arrow_expression_clause" => NodeKind::ArrowExpression,
        "lambda_expression" | "anonymous_method_expression" => NodeKind::Lambda,
        other if other.ends_with("_statement") => NodeKind::Statement,
        other => NodeKind::Other(other.to_string()),
    }
}
