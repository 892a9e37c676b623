//! Pass pipeline and fixed-point scheduler.
//!
//! Passes run in order. Each one is re-run on its own output until it
//! reports no change, then the next pass starts. Syntactic passes see one
//! unit at a time and fan out over units in parallel; semantic passes
//! share the program model and sweep the units one after another.

mod fixpoint;
mod report;

pub use report::{Diagnostic, DiagnosticKind, DiagnosticSink, ProgramReport, Severity, UnitReport};

use crate::config::RewriteConfig;
use crate::error::RewriteError;
use crate::model::{ProgramModel, UnitId};
use crate::passes;
use crate::syntax::SyntaxTree;
use fixpoint::{converge_semantic, converge_syntax};
use rayon::prelude::*;
use report::dedup_diagnostics;
use std::collections::BTreeMap;
use tracing::{debug, info, info_span};

/// Result of one pass invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    Unchanged,
    Changed(SyntaxTree),
}

impl Rewrite {
    /// `Unchanged` when `after` is structurally equal to `before`.
    pub fn compare(before: &SyntaxTree, after: SyntaxTree) -> Self {
        if &after == before {
            Rewrite::Unchanged
        } else {
            Rewrite::Changed(after)
        }
    }
}

/// What a pass knows about the unit it is rewriting.
#[derive(Debug, Clone, Copy)]
pub struct UnitContext<'a> {
    pub unit: UnitId,
    pub name: &'a str,
    pub is_entry_point: bool,
    pub config: &'a RewriteConfig,
}

/// A pass that only needs the unit's tree.
pub trait SyntaxPass: Send + Sync {
    fn name(&self) -> &'static str;

    fn rewrite(
        &self,
        cx: &UnitContext<'_>,
        tree: &SyntaxTree,
        sink: &mut DiagnosticSink,
    ) -> Result<Rewrite, RewriteError>;
}

/// A pass that queries (and may edit) the whole program.
///
/// The unit's current tree is read from the model. A returned tree is
/// stored back by the scheduler; edits the pass makes to other units go
/// through the model directly.
pub trait SemanticPass: Send + Sync {
    fn name(&self) -> &'static str;

    fn rewrite(
        &self,
        cx: &UnitContext<'_>,
        model: &mut dyn ProgramModel,
        sink: &mut DiagnosticSink,
    ) -> Result<Rewrite, RewriteError>;
}

pub enum Pass {
    Syntax(Box<dyn SyntaxPass>),
    Semantic(Box<dyn SemanticPass>),
}

impl Pass {
    pub fn name(&self) -> &'static str {
        match self {
            Pass::Syntax(pass) => pass.name(),
            Pass::Semantic(pass) => pass.name(),
        }
    }
}

/// Which units a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassScope {
    Unit(UnitId),
    Program,
}

/// Per-unit state that is fixed for the whole run.
struct ActiveUnit {
    unit: UnitId,
    name: String,
    is_entry_point: bool,
    original: String,
}

pub struct Pipeline {
    passes: Vec<Pass>,
    config: RewriteConfig,
}

impl Pipeline {
    pub fn new(config: RewriteConfig) -> Self {
        Self {
            passes: Vec::new(),
            config,
        }
    }

    /// The canonical pass order.
    pub fn standard(config: RewriteConfig) -> Self {
        let mut pipeline = Self::new(config);
        pipeline.passes = passes::standard_passes();
        pipeline
    }

    pub fn with_pass(mut self, pass: Pass) -> Self {
        self.passes.push(pass);
        self
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(Pass::name).collect()
    }

    pub fn run_unit(
        &self,
        unit: UnitId,
        model: &mut dyn ProgramModel,
    ) -> Result<UnitReport, RewriteError> {
        let report = self.run(PassScope::Unit(unit), model)?;
        match report.units.into_iter().next() {
            Some(unit_report) => Ok(unit_report),
            // generated: reported as untouched
            None => Ok(UnitReport {
                unit,
                name: model.unit_name(unit)?.to_string(),
                changed: false,
                text: model.tree(unit)?.text(),
                diagnostics: Vec::new(),
            }),
        }
    }

    pub fn run_program(&self, model: &mut dyn ProgramModel) -> Result<ProgramReport, RewriteError> {
        self.run(PassScope::Program, model)
    }

    pub fn run(
        &self,
        scope: PassScope,
        model: &mut dyn ProgramModel,
    ) -> Result<ProgramReport, RewriteError> {
        let candidates = match scope {
            PassScope::Unit(unit) => vec![unit],
            PassScope::Program => model.unit_ids(),
        };
        let mut active = Vec::new();
        for unit in candidates {
            if model.is_generated(unit) {
                debug!(%unit, "skipping generated unit");
                continue;
            }
            active.push(ActiveUnit {
                unit,
                name: model.unit_name(unit)?.to_string(),
                is_entry_point: model.is_entry_point_unit(unit),
                original: model.tree(unit)?.text(),
            });
        }

        let mut diagnostics: BTreeMap<UnitId, Vec<Diagnostic>> = BTreeMap::new();
        for pass in &self.passes {
            if !self.config.is_pass_enabled(pass.name()) {
                debug!(pass = pass.name(), "pass disabled");
                continue;
            }
            let span = info_span!("pass", name = pass.name());
            let _guard = span.enter();
            match pass {
                Pass::Syntax(pass) => {
                    self.run_syntax(pass.as_ref(), &active, model, &mut diagnostics)?
                }
                Pass::Semantic(pass) => {
                    let units: Vec<_> = active
                        .iter()
                        .map(|a| self.context(a))
                        .collect();
                    for (unit, found) in
                        converge_semantic(pass.as_ref(), &units, model, &self.config)?
                    {
                        diagnostics.entry(unit).or_default().extend(found);
                    }
                }
            }
        }

        let mut report = ProgramReport::default();
        for a in &active {
            let text = model.tree(a.unit)?.text();
            let unit_report = UnitReport {
                unit: a.unit,
                name: a.name.clone(),
                changed: text != a.original,
                text,
                diagnostics: dedup_diagnostics(diagnostics.remove(&a.unit).unwrap_or_default()),
            };
            info!("{}", unit_report.summary());
            report.units.push(unit_report);
        }
        Ok(report)
    }

    fn context<'a>(&'a self, active: &'a ActiveUnit) -> UnitContext<'a> {
        UnitContext {
            unit: active.unit,
            name: &active.name,
            is_entry_point: active.is_entry_point,
            config: &self.config,
        }
    }

    fn run_syntax(
        &self,
        pass: &dyn SyntaxPass,
        active: &[ActiveUnit],
        model: &mut dyn ProgramModel,
        diagnostics: &mut BTreeMap<UnitId, Vec<Diagnostic>>,
    ) -> Result<(), RewriteError> {
        let mut inputs = Vec::with_capacity(active.len());
        for a in active {
            inputs.push((self.context(a), model.tree(a.unit)?.clone()));
        }

        let outputs: Vec<Result<(UnitId, Option<SyntaxTree>, Vec<Diagnostic>), RewriteError>> =
            inputs
                .into_par_iter()
                .map(|(cx, tree)| {
                    let mut sink = DiagnosticSink::new(cx.unit, pass.name());
                    let result = converge_syntax(pass, &cx, &tree, &mut sink)?;
                    Ok((cx.unit, result, sink.into_diagnostics()))
                })
                .collect();

        for output in outputs {
            let (unit, tree, found) = output?;
            if let Some(tree) = tree {
                model.update_tree(unit, tree)?;
            }
            diagnostics.entry(unit).or_default().extend(found);
        }
        Ok(())
    }
}
