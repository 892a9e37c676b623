//! What a pipeline run tells the driver.

use crate::model::UnitId;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A single rename or reorder candidate was skipped
    Skipped,
    /// A pass hit its iteration bound
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub unit: UnitId,
    pub pass: String,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] {}: {}",
            self.severity, self.pass, self.unit, self.message
        )
    }
}

/// Collects diagnostics for one pass over one unit, dropping repeats.
///
/// A pass that re-derives its candidates every iteration tends to hit the
/// same skip again and again; only the first occurrence is kept.
#[derive(Debug)]
pub struct DiagnosticSink {
    unit: UnitId,
    pass: String,
    seen: HashSet<(DiagnosticKind, String)>,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new(unit: UnitId, pass: impl Into<String>) -> Self {
        Self {
            unit,
            pass: pass.into(),
            seen: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn skipped(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, DiagnosticKind::Skipped, message.into());
    }

    pub fn exhausted(&mut self, severity: Severity, message: impl Into<String>) {
        self.push(severity, DiagnosticKind::Exhausted, message.into());
    }

    fn push(&mut self, severity: Severity, kind: DiagnosticKind, message: String) {
        if self.seen.insert((kind, message.clone())) {
            self.diagnostics.push(Diagnostic {
                unit: self.unit,
                pass: self.pass.clone(),
                severity,
                kind,
                message,
            });
        }
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Outcome of the pipeline for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub unit: UnitId,
    pub name: String,
    pub changed: bool,
    /// Rendered text after the run
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl UnitReport {
    pub fn summary(&self) -> String {
        let status = if self.changed { "changed" } else { "unchanged" };
        format!("{}: {status}", self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgramReport {
    pub units: Vec<UnitReport>,
}

impl ProgramReport {
    pub fn changed_units(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|unit| unit.changed)
    }

    pub fn any_changed(&self) -> bool {
        self.units.iter().any(|unit| unit.changed)
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.units.iter().flat_map(|unit| unit.diagnostics.iter())
    }
}

/// Merge per-pass diagnostics, keeping the first of identical events.
pub(crate) fn dedup_diagnostics(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    diagnostics
        .into_iter()
        .filter(|d| seen.insert(d.clone()))
        .collect()
}
