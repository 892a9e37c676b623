//! Run a pass until it stops changing anything.
//!
//! The iteration bound is the element count of the unit when the pass
//! starts, plus one. Passes that fix one construct per iteration can never
//! legitimately need more than that.

use super::{DiagnosticSink, Rewrite, SemanticPass, Severity, SyntaxPass, UnitContext};
use crate::config::RewriteConfig;
use crate::error::RewriteError;
use crate::model::{ProgramModel, UnitId};
use crate::pipeline::Diagnostic;
use crate::syntax::SyntaxTree;
use std::collections::BTreeMap;
use tracing::{debug, warn};

fn iteration_bound(tree: &SyntaxTree) -> usize {
    tree.element_count() + 1
}

/// Drive a syntactic pass to its fixed point on one unit.
///
/// Returns the new tree, or `None` when the first iteration was already a
/// no-op.
pub(super) fn converge_syntax(
    pass: &dyn SyntaxPass,
    cx: &UnitContext<'_>,
    tree: &SyntaxTree,
    sink: &mut DiagnosticSink,
) -> Result<Option<SyntaxTree>, RewriteError> {
    let bound = iteration_bound(tree);
    let mut current: Option<SyntaxTree> = None;
    for iteration in 0..bound {
        let input = current.as_ref().unwrap_or(tree);
        match pass.rewrite(cx, input, sink)? {
            Rewrite::Changed(next) if &next != input => {
                debug!(unit = %cx.unit, iteration, "pass changed the tree");
                current = Some(next);
            }
            _ => return Ok(current),
        }
    }
    exhausted(pass.name(), cx.unit, bound, cx.config, sink)?;
    Ok(current)
}

/// Drive a semantic pass to its fixed point over `units`.
///
/// Each unit is run to its own fixed point in turn, and the sweep repeats
/// until a whole sweep changes nothing: a rename in one unit can change
/// what the pass finds in another.
pub(super) fn converge_semantic(
    pass: &dyn SemanticPass,
    units: &[UnitContext<'_>],
    model: &mut dyn ProgramModel,
    config: &RewriteConfig,
) -> Result<BTreeMap<UnitId, Vec<Diagnostic>>, RewriteError> {
    let mut sinks: BTreeMap<UnitId, DiagnosticSink> = BTreeMap::new();
    let mut budgets: BTreeMap<UnitId, usize> = BTreeMap::new();
    for cx in units {
        budgets.insert(cx.unit, iteration_bound(model.tree(cx.unit)?));
        sinks.insert(cx.unit, DiagnosticSink::new(cx.unit, pass.name()));
    }

    let mut sweep = 0;
    loop {
        let mut changed_any = false;
        for cx in units {
            let Some(sink) = sinks.get_mut(&cx.unit) else {
                continue;
            };
            loop {
                let budget = budgets.entry(cx.unit).or_default();
                if *budget == 0 {
                    break;
                }
                let before = model.tree(cx.unit)?.clone();
                match pass.rewrite(cx, model, sink)? {
                    Rewrite::Changed(next) if next != before => {
                        model.update_tree(cx.unit, next)?;
                        changed_any = true;
                        *budget -= 1;
                        if *budget == 0 {
                            let bound = iteration_bound(&before);
                            exhausted(pass.name(), cx.unit, bound, config, sink)?;
                        }
                    }
                    _ => break,
                }
            }
        }
        sweep += 1;
        if !changed_any {
            debug!(sweeps = sweep, "semantic pass converged");
            break;
        }
    }

    Ok(sinks
        .into_iter()
        .map(|(unit, sink)| (unit, sink.into_diagnostics()))
        .collect())
}

fn exhausted(
    pass: &str,
    unit: UnitId,
    bound: usize,
    config: &RewriteConfig,
    sink: &mut DiagnosticSink,
) -> Result<(), RewriteError> {
    if config.pipeline.strict_convergence {
        return Err(RewriteError::FixedPointExhausted {
            pass: pass.to_string(),
            unit,
            bound,
        });
    }
    warn!(pass, %unit, bound, "pass did not converge, keeping the last tree");
    sink.exhausted(
        Severity::Error,
        format!("did not converge within {bound} iterations"),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse_csharp;
    use crate::model::SyntacticModel;
    use crate::syntax::{Layout, NodePath};

    /// Appends a space to the first token until it carries `limit` spaces.
    struct Pad {
        limit: usize,
    }

    impl SyntaxPass for Pad {
        fn name(&self) -> &'static str {
            "pad"
        }

        fn rewrite(
            &self,
            _cx: &UnitContext<'_>,
            tree: &SyntaxTree,
            _sink: &mut DiagnosticSink,
        ) -> Result<Rewrite, RewriteError> {
            let mut next = tree.clone();
            let Some(token) = next.root_mut().first_token_mut() else {
                return Ok(Rewrite::Unchanged);
            };
            if token.trailing.len() >= self.limit {
                return Ok(Rewrite::Unchanged);
            }
            token.trailing.push(Layout::whitespace(" "));
            Ok(Rewrite::compare(tree, next))
        }
    }

    fn context(config: &RewriteConfig) -> UnitContext<'_> {
        UnitContext {
            unit: UnitId(0),
            name: "a.cs",
            is_entry_point: false,
            config,
        }
    }

    #[test]
    fn stops_at_the_first_no_op() {
        let config = RewriteConfig::default();
        let tree = parse_csharp("class A { }").unwrap();
        let mut sink = DiagnosticSink::new(UnitId(0), "pad");
        let result = converge_syntax(&Pad { limit: 3 }, &context(&config), &tree, &mut sink)
            .unwrap()
            .unwrap();
        assert!(result.text().starts_with("class   A"));
        assert!(sink.into_diagnostics().is_empty());
    }

    #[test]
    fn unchanged_input_yields_none() {
        let config = RewriteConfig::default();
        let tree = parse_csharp("class A { }").unwrap();
        let mut sink = DiagnosticSink::new(UnitId(0), "pad");
        let result =
            converge_syntax(&Pad { limit: 0 }, &context(&config), &tree, &mut sink).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn exhaustion_is_a_diagnostic_by_default() {
        let config = RewriteConfig::default();
        let tree = parse_csharp("class A { }").unwrap();
        let bound = iteration_bound(&tree);
        let mut sink = DiagnosticSink::new(UnitId(0), "pad");
        let result = converge_syntax(
            &Pad { limit: usize::MAX },
            &context(&config),
            &tree,
            &mut sink,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            result.token_at(&NodePath::from_indices(vec![0, 0])).unwrap().trailing.len(),
            1 + bound
        );
        let diagnostics = sink.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn exhaustion_is_fatal_when_strict() {
        let mut config = RewriteConfig::default();
        config.pipeline.strict_convergence = true;
        let tree = parse_csharp("class A { }").unwrap();
        let mut sink = DiagnosticSink::new(UnitId(0), "pad");
        let err = converge_syntax(
            &Pad { limit: usize::MAX },
            &context(&config),
            &tree,
            &mut sink,
        )
        .unwrap_err();
        assert!(matches!(err, RewriteError::FixedPointExhausted { .. }));
    }

    /// Renames the first lowercase class to upper case, one per call.
    struct UpperClass;

    impl SemanticPass for UpperClass {
        fn name(&self) -> &'static str {
            "upper-class"
        }

        fn rewrite(
            &self,
            cx: &UnitContext<'_>,
            model: &mut dyn ProgramModel,
            _sink: &mut DiagnosticSink,
        ) -> Result<Rewrite, RewriteError> {
            let tree = model.tree(cx.unit)?;
            let mut next = tree.clone();
            let Some(token) = next
                .root_mut()
                .tokens_mut()
                .into_iter()
                .find(|t| t.is_identifier() && t.text.starts_with(char::is_lowercase))
            else {
                return Ok(Rewrite::Unchanged);
            };
            token.text = token.text.to_uppercase();
            Ok(Rewrite::compare(tree, next))
        }
    }

    #[test]
    fn semantic_passes_sweep_every_unit() {
        let config = RewriteConfig::default();
        let mut model = SyntacticModel::new();
        let a = model.add_source("a.cs", "class a { } class b { }").unwrap();
        let b = model.add_source("b.cs", "class c { }").unwrap();
        let units = vec![
            UnitContext {
                unit: a,
                ..context(&config)
            },
            UnitContext {
                unit: b,
                ..context(&config)
            },
        ];
        let diagnostics = converge_semantic(&UpperClass, &units, &mut model, &config).unwrap();
        assert!(diagnostics.values().all(Vec::is_empty));
        assert_eq!(model.tree(a).unwrap().text(), "class A { } class B { }");
        assert_eq!(model.tree(b).unwrap().text(), "class C { }");
    }
}
