//! Which declarations break their naming convention, and what they
//! should be called instead.

use super::casing::{to_camel, to_pascal};
use crate::error::RewriteError;
use crate::model::{KnownType, ProgramModel, SymbolId};
use crate::pipeline::{DiagnosticSink, UnitContext};
use crate::syntax::query::{self, has_modifier};
use crate::syntax::{Node, NodeKind, NodePath, SyntaxIndex, SyntaxTree};
use tracing::debug;

const ACCESS_MODIFIERS: &[&str] = &["public", "protected", "internal"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub symbol: SymbolId,
    pub old_name: String,
    pub new_name: String,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Category {
    Field,
    Event,
    Property,
    Method,
    Parameter,
    Local,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Field => "field",
            Category::Event => "event",
            Category::Property => "property",
            Category::Method => "method",
            Category::Parameter => "parameter",
            Category::Local => "local",
        }
    }
}

/// Rename candidates of one unit, in document order.
pub(crate) fn collect(
    cx: &UnitContext<'_>,
    model: &dyn ProgramModel,
    sink: &mut DiagnosticSink,
) -> Result<Vec<Candidate>, RewriteError> {
    let tree = model.tree(cx.unit)?;
    let index = SyntaxIndex::build(tree);
    let mut collector = Collector {
        cx,
        model,
        tree,
        index: &index,
        sink,
        out: Vec::new(),
    };
    collector.walk(tree.root(), &NodePath::root())?;
    Ok(collector.out)
}

struct Collector<'a, 'c> {
    cx: &'a UnitContext<'c>,
    model: &'a dyn ProgramModel,
    tree: &'a SyntaxTree,
    index: &'a SyntaxIndex,
    sink: &'a mut DiagnosticSink,
    out: Vec<Candidate>,
}

/// Extra condition checked once the symbol is known.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Guard {
    None,
    /// Skip when any reference writes to the symbol
    NoWrites,
    /// Only rename a symbol nobody references
    Unreferenced,
}

impl Collector<'_, '_> {
    fn walk(&mut self, node: &Node, path: &NodePath) -> Result<(), RewriteError> {
        match node.kind {
            NodeKind::FieldDeclaration => self.field(node, path)?,
            NodeKind::EventFieldDeclaration => {
                if !has_modifier(node, "override") {
                    for (rel, declarator) in query::declarators(node) {
                        self.propose_at(path, &rel, declarator, Category::Event, Guard::None, to_pascal)?;
                    }
                }
            }
            NodeKind::PropertyDeclaration | NodeKind::EventDeclaration => {
                if !has_modifier(node, "override") && !query::has_explicit_interface(node) {
                    let category = if node.kind == NodeKind::EventDeclaration {
                        Category::Event
                    } else {
                        Category::Property
                    };
                    if let Some(i) = query::name_index(node) {
                        self.propose(&path.child(i), category, Guard::None, to_pascal)?;
                    }
                }
            }
            NodeKind::MethodDeclaration => self.method(node, path)?,
            NodeKind::LocalDeclaration if self.cx.config.naming.rename_locals => {
                let convert = if has_modifier(node, "const") {
                    pascal_unless_upper
                } else {
                    to_camel
                };
                for (rel, declarator) in query::declarators(node) {
                    self.propose_at(path, &rel, declarator, Category::Local, Guard::None, convert)?;
                }
            }
            _ => {}
        }

        if owns_parameters(node) {
            self.parameters(node, path)?;
        }

        for (i, child) in node.child_nodes() {
            self.walk(child, &path.child(i))?;
        }
        Ok(())
    }

    fn field(&mut self, node: &Node, path: &NodePath) -> Result<(), RewriteError> {
        let shared = has_modifier(node, "const") || has_modifier(node, "static");
        if !shared && ACCESS_MODIFIERS.iter().any(|m| has_modifier(node, m)) {
            return Ok(());
        }
        let prefix = self.cx.config.naming.field_prefix.clone();
        for (rel, declarator) in query::declarators(node) {
            let Some(name) = query::name(declarator) else {
                continue;
            };
            if shared {
                if name.starts_with(char::is_uppercase) {
                    continue;
                }
                self.propose_at(path, &rel, declarator, Category::Field, Guard::NoWrites, to_pascal)?;
            } else {
                if name.starts_with('_') || (!prefix.is_empty() && name.starts_with(&prefix)) {
                    continue;
                }
                let prefix = prefix.clone();
                self.propose_at(
                    path,
                    &rel,
                    declarator,
                    Category::Field,
                    Guard::NoWrites,
                    move |old| to_camel(old).map(|camel| format!("{prefix}{camel}")),
                )?;
            }
        }
        Ok(())
    }

    fn method(&mut self, node: &Node, path: &NodePath) -> Result<(), RewriteError> {
        let fixed = ["override", "extern"].iter().any(|m| has_modifier(node, m))
            || query::has_explicit_interface(node)
            || query::name(node) == Some("Main");
        if fixed {
            return Ok(());
        }
        let Some(name_index) = query::name_index(node) else {
            return Ok(());
        };
        let suffix = self.cx.config.naming.async_suffix.clone();
        let wants_suffix =
            !self.cx.is_entry_point && !suffix.is_empty() && self.is_async(node, path)?;
        self.propose(&path.child(name_index), Category::Method, Guard::None, move |old| {
            let pascal = to_pascal(old)?;
            if wants_suffix && !pascal.ends_with(&suffix) {
                Some(format!("{pascal}{suffix}"))
            } else {
                Some(pascal)
            }
        })
    }

    fn is_async(&self, method: &Node, path: &NodePath) -> Result<bool, RewriteError> {
        if has_modifier(method, "async") {
            return Ok(true);
        }
        let Some(return_index) = query::return_type_index(method) else {
            return Ok(false);
        };
        let Some(site) = self.index.element_span(&path.child(return_index)) else {
            return Ok(false);
        };
        let Some(returned) = self.model.resolve_type(self.cx.unit, site)? else {
            return Ok(false);
        };
        Ok(KnownType::ASYNC_RESULTS
            .iter()
            .filter_map(|known| self.model.well_known_type(*known))
            .any(|handle| handle == returned))
    }

    fn parameters(&mut self, owner: &Node, path: &NodePath) -> Result<(), RewriteError> {
        let params = query::parameters(owner);
        let cx = self.cx;
        let naming = &cx.config.naming;
        if params.len() == 2 && self.is_callback(params[0].1, params[1].1) {
            let discards = naming.discard_names.clone();
            for ((rel, param), discard) in params.iter().zip(discards) {
                self.propose_at(path, rel, param, Category::Parameter, Guard::Unreferenced, move |_| {
                    Some(discard.clone())
                })?;
            }
            return Ok(());
        }
        if !naming.rename_parameters {
            return Ok(());
        }
        for (rel, param) in params {
            self.propose_at(path, &rel, param, Category::Parameter, Guard::None, to_camel)?;
        }
        Ok(())
    }

    /// `(object sender, EventArgs e)` and friends.
    fn is_callback(&self, first: &Node, second: &Node) -> bool {
        let naming = &self.cx.config.naming;
        let sender = naming.callback_sender.to_lowercase();
        let suffix = &naming.callback_args_suffix;
        let first_is_sender =
            query::name(first).is_some_and(|n| n.to_lowercase().contains(&sender));
        let second_is_args = query::parameter_type(second).ends_with(suffix.as_str())
            || query::name(second).is_some_and(|n| n.ends_with(suffix.as_str()));
        first_is_sender && second_is_args
    }

    /// Propose a rename for the name token of `node`, found at `rel` below `owner`.
    fn propose_at(
        &mut self,
        owner: &NodePath,
        rel: &[usize],
        node: &Node,
        category: Category,
        guard: Guard,
        convert: impl Fn(&str) -> Option<String>,
    ) -> Result<(), RewriteError> {
        let Some(name_index) = query::name_index(node) else {
            return Ok(());
        };
        let mut path = owner.clone();
        for &i in rel {
            path = path.child(i);
        }
        self.propose(&path.child(name_index), category, guard, convert)
    }

    fn propose(
        &mut self,
        name_path: &NodePath,
        category: Category,
        guard: Guard,
        convert: impl Fn(&str) -> Option<String>,
    ) -> Result<(), RewriteError> {
        let old_name = self.tree.token_at(name_path)?.text.clone();
        if old_name.starts_with('@') || !old_name.chars().any(char::is_alphanumeric) {
            return Ok(());
        }
        let Some(new_name) = convert(&old_name).filter(|new| new != &old_name) else {
            return Ok(());
        };
        let Some(site) = self.index.token_span(name_path) else {
            return Ok(());
        };
        let Some(symbol) = self.model.declared_symbol(self.cx.unit, site)? else {
            debug!(name = %old_name, "declaration not tracked by the model");
            return Ok(());
        };

        let references = self.model.find_references(&symbol)?;
        match guard {
            Guard::NoWrites if references.iter().any(|r| r.is_write) => {
                debug!(name = %old_name, "written to, keeping its name");
                return Ok(());
            }
            Guard::Unreferenced if !references.is_empty() => {
                debug!(name = %old_name, "callback parameter is used, keeping its name");
                return Ok(());
            }
            _ => {}
        }
        if references.iter().any(|r| self.model.is_generated(r.unit)) {
            self.sink.skipped(format!(
                "{} '{old_name}' is referenced from generated code",
                category.as_str()
            ));
            return Ok(());
        }

        self.out.push(Candidate {
            symbol,
            old_name,
            new_name,
            category,
        });
        Ok(())
    }
}

/// Declarations whose parameter list names locals of their own.
fn owns_parameters(node: &Node) -> bool {
    match node.kind {
        NodeKind::MethodDeclaration
        | NodeKind::ConstructorDeclaration
        | NodeKind::DestructorDeclaration
        | NodeKind::OperatorDeclaration
        | NodeKind::IndexerDeclaration
        | NodeKind::DelegateDeclaration
        | NodeKind::Lambda
        | NodeKind::Statement => node.find_child(&NodeKind::ParameterList).is_some(),
        _ => false,
    }
}

fn pascal_unless_upper(name: &str) -> Option<String> {
    if name.starts_with(char::is_uppercase) {
        None
    } else {
        to_pascal(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewriteConfig;
    use crate::model::{SyntacticModel, UnitId};

    fn candidates(source: &str) -> Vec<(String, String)> {
        candidates_with(source, RewriteConfig::default())
    }

    fn candidates_with(source: &str, config: RewriteConfig) -> Vec<(String, String)> {
        let mut model = SyntacticModel::new();
        let unit = model.add_source("Sample.cs", source).unwrap();
        let cx = UnitContext {
            unit,
            name: "Sample.cs",
            is_entry_point: model.is_entry_point_unit(unit),
            config: &config,
        };
        let mut sink = DiagnosticSink::new(UnitId(0), "rename");
        collect(&cx, &model, &mut sink)
            .unwrap()
            .into_iter()
            .map(|c| (c.old_name, c.new_name))
            .collect()
    }

    fn pair(old: &str, new: &str) -> (String, String) {
        (old.to_string(), new.to_string())
    }

    #[test]
    fn private_fields_get_the_prefix() {
        let found = candidates("class A { int count; private int total; public int Open; }");
        assert_eq!(found, vec![pair("count", "_count"), pair("total", "_total")]);
    }

    #[test]
    fn written_fields_keep_their_name() {
        let found = candidates(
            "class A { int count; public int Count { get { return count; } set { count = value; } } }",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn shared_fields_become_pascal() {
        let found = candidates("class A { const int maxSize = 3; static int Seen; }");
        assert_eq!(found, vec![pair("maxSize", "MaxSize")]);
    }

    #[test]
    fn methods_get_pascal_and_async_suffix() {
        let found = candidates(
            "using System.Threading.Tasks;\nclass A { void run() { } Task load() { return null; } async void go() { } }",
        );
        assert_eq!(
            found,
            vec![
                pair("run", "Run"),
                pair("load", "LoadAsync"),
                pair("go", "GoAsync"),
            ]
        );
    }

    #[test]
    fn contract_bound_methods_are_skipped() {
        let found = candidates(
            "class A : B { public override void run() { } extern static void native(); void I.call() { } }",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn entry_point_unit_gets_no_async_suffix() {
        let found = candidates(
            "using System.Threading.Tasks;\nclass Program { static async Task Main() { } static async Task work() { } }",
        );
        assert_eq!(found, vec![pair("work", "Work")]);
    }

    #[test]
    fn unused_callback_parameters_become_discards() {
        let found = candidates(
            "class A { void OnClick(object sender, EventArgs e) { } void OnKey(object sender, KeyEventArgs e) { Use(e); } }",
        );
        assert_eq!(
            found,
            vec![pair("sender", "_"), pair("e", "__"), pair("sender", "_")]
        );
    }

    #[test]
    fn locals_and_parameters_become_camel() {
        let found = candidates(
            "class A { void Run(int Count) { int Total = Count; const int limit = 2; } }",
        );
        assert_eq!(
            found,
            vec![
                pair("Count", "count"),
                pair("Total", "total"),
                pair("limit", "Limit"),
            ]
        );
    }

    #[test]
    fn locals_can_be_left_alone() {
        let mut config = RewriteConfig::default();
        config.naming.rename_locals = false;
        config.naming.rename_parameters = false;
        let found = candidates_with("class A { void Run(int Count) { int Total = Count; } }", config);
        assert!(found.is_empty());
    }

    #[test]
    fn verbatim_names_are_skipped() {
        let found = candidates("class A { void Run() { int @Event = 1; } }");
        assert!(found.is_empty());
    }
}
