use serde::Serialize;

/// Structural tag of a [`Node`](super::Node).
///
/// Only the kinds the passes dispatch on get their own variant; everything
/// else keeps the grammar's name in [`NodeKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    CompilationUnit,
    UsingDirective,
    Namespace,
    FileScopedNamespace,
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    RecordDeclaration,
    EnumDeclaration,
    DelegateDeclaration,
    /// Brace-delimited member list of a type or namespace
    DeclarationList,
    FieldDeclaration,
    EventFieldDeclaration,
    EventDeclaration,
    PropertyDeclaration,
    IndexerDeclaration,
    AccessorList,
    Accessor,
    ConstructorDeclaration,
    DestructorDeclaration,
    OperatorDeclaration,
    MethodDeclaration,
    AttributeList,
    Modifier,
    ExplicitInterfaceSpecifier,
    ParameterList,
    Parameter,
    ArgumentList,
    Argument,
    Invocation,
    ObjectCreation,
    Initializer,
    VariableDeclaration,
    VariableDeclarator,
    EqualsValue,
    LocalDeclaration,
    Block,
    Statement,
    Assignment,
    /// Prefix or postfix unary expression (`++x`, `x--`, `!x`)
    UpdateExpression,
    MemberAccess,
    ArrowExpression,
    Lambda,
    Other(String),
}

impl NodeKind {
    /// Declarations that own a member list.
    pub fn is_type_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::ClassDeclaration
                | NodeKind::StructDeclaration
                | NodeKind::InterfaceDeclaration
                | NodeKind::RecordDeclaration
        )
    }

    /// Anything that can be named and declared directly inside a type body.
    pub fn is_member_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::FieldDeclaration
                | NodeKind::EventFieldDeclaration
                | NodeKind::EventDeclaration
                | NodeKind::PropertyDeclaration
                | NodeKind::IndexerDeclaration
                | NodeKind::ConstructorDeclaration
                | NodeKind::DestructorDeclaration
                | NodeKind::OperatorDeclaration
                | NodeKind::MethodDeclaration
                | NodeKind::ClassDeclaration
                | NodeKind::StructDeclaration
                | NodeKind::InterfaceDeclaration
                | NodeKind::RecordDeclaration
                | NodeKind::EnumDeclaration
                | NodeKind::DelegateDeclaration
        )
    }

    /// Members whose bodies hold locals and parameters.
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            NodeKind::MethodDeclaration
                | NodeKind::ConstructorDeclaration
                | NodeKind::DestructorDeclaration
                | NodeKind::OperatorDeclaration
                | NodeKind::PropertyDeclaration
                | NodeKind::IndexerDeclaration
                | NodeKind::EventDeclaration
                | NodeKind::DelegateDeclaration
        )
    }

    /// Constructs whose line anchors the indentation of the lists inside them.
    pub fn is_layout_anchor(&self) -> bool {
        matches!(self, NodeKind::Statement | NodeKind::LocalDeclaration)
            || self.is_member_declaration()
    }

    /// Delimited lists the layout engine breaks or collapses.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            NodeKind::ParameterList | NodeKind::ArgumentList | NodeKind::Initializer
        )
    }

    /// Invocation and creation expressions count as one imbrication level.
    pub fn is_call_like(&self) -> bool {
        matches!(self, NodeKind::Invocation | NodeKind::ObjectCreation)
    }

    /// Bodies that make a list element span several lines on their own.
    pub fn is_body(&self) -> bool {
        matches!(
            self,
            NodeKind::Block | NodeKind::DeclarationList | NodeKind::AccessorList
        )
    }

    pub fn name(&self) -> &str {
        match self {
            NodeKind::CompilationUnit => "compilation-unit",
            NodeKind::UsingDirective => "using-directive",
            NodeKind::Namespace => "namespace",
            NodeKind::FileScopedNamespace => "file-scoped-namespace",
            NodeKind::ClassDeclaration => "class",
            NodeKind::StructDeclaration => "struct",
            NodeKind::InterfaceDeclaration => "interface",
            NodeKind::RecordDeclaration => "record",
            NodeKind::EnumDeclaration => "enum",
            NodeKind::DelegateDeclaration => "delegate",
            NodeKind::DeclarationList => "declaration-list",
            NodeKind::FieldDeclaration => "field",
            NodeKind::EventFieldDeclaration => "event-field",
            NodeKind::EventDeclaration => "event",
            NodeKind::PropertyDeclaration => "property",
            NodeKind::IndexerDeclaration => "indexer",
            NodeKind::AccessorList => "accessor-list",
            NodeKind::Accessor => "accessor",
            NodeKind::ConstructorDeclaration => "constructor",
            NodeKind::DestructorDeclaration => "destructor",
            NodeKind::OperatorDeclaration => "operator",
            NodeKind::MethodDeclaration => "method",
            NodeKind::AttributeList => "attribute-list",
            NodeKind::Modifier => "modifier",
            NodeKind::ExplicitInterfaceSpecifier => "explicit-interface",
            NodeKind::ParameterList => "parameter-list",
            NodeKind::Parameter => "parameter",
            NodeKind::ArgumentList => "argument-list",
            NodeKind::Argument => "argument",
            NodeKind::Invocation => "invocation",
            NodeKind::ObjectCreation => "object-creation",
            NodeKind::Initializer => "initializer",
            NodeKind::VariableDeclaration => "variable-declaration",
            NodeKind::VariableDeclarator => "variable-declarator",
            NodeKind::EqualsValue => "equals-value",
            NodeKind::LocalDeclaration => "local-declaration",
            NodeKind::Block => "block",
            NodeKind::Statement => "statement",
            NodeKind::Assignment => "assignment",
            NodeKind::UpdateExpression => "update",
            NodeKind::MemberAccess => "member-access",
            NodeKind::ArrowExpression => "arrow-expression",
            NodeKind::Lambda => "lambda",
            NodeKind::Other(name) => name,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
