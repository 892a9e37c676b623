//! Convention-driven renames applied through the program model.
//!
//! Every iteration re-derives the candidates from the current tree and
//! applies the first one the model accepts. Refused renames are logged and
//! skipped; they never stop the remaining candidates.

mod candidates;
pub mod casing;

use crate::error::RewriteError;
use crate::model::ProgramModel;
use crate::pipeline::{DiagnosticSink, Rewrite, SemanticPass, UnitContext};
use tracing::{debug, warn};

pub struct Rename;

impl Rename {
    pub const NAME: &'static str = "rename";
}

impl SemanticPass for Rename {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn rewrite(
        &self,
        cx: &UnitContext<'_>,
        model: &mut dyn ProgramModel,
        sink: &mut DiagnosticSink,
    ) -> Result<Rewrite, RewriteError> {
        let candidates = candidates::collect(cx, &*model, sink)?;
        for candidate in candidates {
            match model.rename_symbol(&candidate.symbol, &candidate.new_name) {
                Ok(units) => {
                    debug!(
                        unit = cx.name,
                        kind = candidate.category.as_str(),
                        from = %candidate.old_name,
                        to = %candidate.new_name,
                        units = units.len(),
                        "renamed"
                    );
                    return Ok(Rewrite::Changed(model.tree(cx.unit)?.clone()));
                }
                Err(err) if err.is_recoverable() => {
                    warn!(
                        unit = cx.name,
                        from = %candidate.old_name,
                        to = %candidate.new_name,
                        "rename skipped: {err}"
                    );
                    sink.skipped(format!(
                        "kept {} '{}' (wanted '{}'): {err}",
                        candidate.category.as_str(),
                        candidate.old_name,
                        candidate.new_name
                    ));
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(Rewrite::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewriteConfig;
    use crate::model::SyntacticModel;
    use crate::passes::testing::run_pass;
    use crate::pipeline::{Pass, Pipeline};

    fn run(source: &str) -> crate::pipeline::UnitReport {
        run_pass(Pass::Semantic(Box::new(Rename)), source, RewriteConfig::default())
    }

    #[test]
    fn unreferenced_private_field_gets_the_prefix() {
        let report = run("class A\n{\n    private int count;\n}\n");
        assert_eq!(report.text, "class A\n{\n    private int _count;\n}\n");
    }

    #[test]
    fn field_written_in_a_setter_is_kept() {
        let source = "class A\n{\n    private int count;\n    public int Count { set { count = value; } }\n}\n";
        let report = run(source);
        assert_eq!(report.text, source);
        assert!(!report.changed);
    }

    #[test]
    fn references_follow_the_rename() {
        let report = run("class A\n{\n    int Total() { int Sum = 1; return Sum + Sum; }\n}\n");
        assert_eq!(
            report.text,
            "class A\n{\n    int Total() { int sum = 1; return sum + sum; }\n}\n"
        );
    }

    #[test]
    fn collisions_are_skipped_and_reported() {
        let source = "class A\n{\n    void Run() { }\n    void run() { }\n}\n";
        let report = run(source);
        assert_eq!(report.text, source);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("'run'"));
    }

    #[test]
    fn renames_reach_other_units() {
        let mut model = SyntacticModel::new();
        let a = model
            .add_source("A.cs", "class A\n{\n    public void start() { }\n}\n")
            .unwrap();
        let b = model
            .add_source("B.cs", "class B\n{\n    void Go(A a) { a.start(); }\n}\n")
            .unwrap();
        let pipeline = Pipeline::new(RewriteConfig::default())
            .with_pass(Pass::Semantic(Box::new(Rename)));
        let report = pipeline.run_program(&mut model).unwrap();
        assert!(report.units.iter().all(|u| u.changed));
        assert_eq!(
            model.tree(a).unwrap().text(),
            "class A\n{\n    public void Start() { }\n}\n"
        );
        assert_eq!(
            model.tree(b).unwrap().text(),
            "class B\n{\n    void Go(A a) { a.Start(); }\n}\n"
        );
    }
}
