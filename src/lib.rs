//! cst-canonizer: deterministic rewriting of C# concrete syntax trees
//!
//! Sources are parsed into a lossless CST ([`syntax::SyntaxTree`]) whose
//! rendered text is byte-identical to the input. A [`Pipeline`] of passes
//! then rewrites the trees towards one canonical form: regions removed,
//! blank lines collapsed, usings sorted, symbols renamed to convention,
//! members reordered and long lists broken over lines.
//!
//! # Architecture
//!
//! Every pass is driven to a fixed point by the scheduler. Syntactic passes
//! only see their unit's tree and run in parallel across units; semantic
//! passes go through a [`ProgramModel`] for symbol resolution and apply
//! renames to every unit that references the symbol.
//!
//! # Safety
//!
//! - Layout a pass does not touch renders back byte for byte
//! - Renames verify the old token text before replacing it
//! - A refused rename leaves every unit untouched
//! - Generated units are never rewritten
//!
//! # Example
//!
//! ```no_run
//! use cst_canonizer::{Pipeline, ProgramModel, RewriteConfig, SyntacticModel};
//!
//! let mut model = SyntacticModel::new();
//! let unit = model.add_source("Counter.cs", "class Counter { private int count; }")?;
//! let report = Pipeline::standard(RewriteConfig::default()).run_unit(unit, &mut model)?;
//! println!("{}", report.summary());
//! print!("{}", model.tree(unit)?.text());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod frontend;
pub mod model;
pub mod passes;
pub mod pipeline;
pub mod syntax;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, RewriteConfig};
pub use error::RewriteError;
pub use frontend::{parse_csharp, FrontendError};
pub use model::{ModelError, ProgramModel, SyntacticModel, UnitId};
pub use pipeline::{
    Diagnostic, DiagnosticKind, Pass, PassScope, Pipeline, ProgramReport, Rewrite, SemanticPass,
    Severity, SyntaxPass, UnitContext, UnitReport,
};
pub use syntax::{SyntaxError, SyntaxTree};
