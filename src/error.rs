use crate::model::{ModelError, UnitId};
use crate::syntax::{EditError, SyntaxError};
use thiserror::Error;

/// Fatal failures of a pipeline run.
///
/// Recoverable problems (a refused rename, a pass that stopped converging
/// under the default settings) never show up here; they become
/// diagnostics on the unit report instead.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("pass '{pass}' did not converge on unit {unit} within {bound} iterations")]
    FixedPointExhausted {
        pass: String,
        unit: UnitId,
        bound: usize,
    },

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Edit(#[from] EditError),
}
