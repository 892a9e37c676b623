//! The Program Model Provider: whole-program symbol queries.
//!
//! The rewriting core only ever talks to a [`ProgramModel`]. Symbols,
//! references and type handles are opaque to it; it compares them for
//! equality and asks the questions below, nothing else.

mod scope;
mod syntactic;

pub use syntactic::{is_valid_identifier, SyntacticModel};

use crate::syntax::{EditError, Span, SyntaxError, SyntaxTree};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Index of a compilation unit inside one program model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitId(pub usize);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle of a declared name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolId(String);

impl SymbolId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle of a resolved type. Only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeHandle(String);

impl TypeHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Types the core needs to recognise without knowing their spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownType {
    /// `Task` / `Task<T>`
    AsyncResult,
    /// `ValueTask` / `ValueTask<T>`
    AsyncValueResult,
}

impl KnownType {
    pub const ASYNC_RESULTS: [KnownType; 2] = [KnownType::AsyncResult, KnownType::AsyncValueResult];
}

/// One usage site of a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub unit: UnitId,
    pub span: Span,
    /// Assignment target, `++`/`--` operand, `ref`/`out` argument or inside a setter
    pub is_write: bool,
}

/// Why a rename was refused. Always recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenameConflict {
    #[error("'{new_name}' is already visible in {scope}")]
    Collision { new_name: String, scope: String },

    #[error("references to '{name}' cannot be attributed unambiguously")]
    Ambiguous { name: String },

    #[error("'{0}' is not a valid identifier")]
    InvalidName(String),
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),

    #[error("unknown symbol {0}")]
    UnknownSymbol(SymbolId),

    #[error("rename refused: {0}")]
    Conflict(#[from] RenameConflict),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

impl ModelError {
    /// Failures that only concern one rename candidate.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ModelError::Conflict(_) | ModelError::UnknownSymbol(_))
    }
}

/// Symbol resolution, reference search and rename application over a
/// whole program, plus storage of each unit's current tree.
pub trait ProgramModel {
    fn unit_ids(&self) -> Vec<UnitId>;

    fn unit_name(&self, unit: UnitId) -> Result<&str, ModelError>;

    fn tree(&self, unit: UnitId) -> Result<&SyntaxTree, ModelError>;

    fn update_tree(&mut self, unit: UnitId, tree: SyntaxTree) -> Result<(), ModelError>;

    /// Symbol declared by the name token at `site`, if the model tracks it.
    ///
    /// A `site` that does not land on a token is an error.
    fn declared_symbol(&self, unit: UnitId, site: Span) -> Result<Option<SymbolId>, ModelError>;

    /// Every usage of `symbol` in the program, declarations excluded.
    fn find_references(&self, symbol: &SymbolId) -> Result<Vec<Reference>, ModelError>;

    /// Rename `symbol` and all its references atomically.
    ///
    /// Returns the units whose trees changed. A refused rename is
    /// [`ModelError::Conflict`] and leaves every tree untouched.
    fn rename_symbol(&mut self, symbol: &SymbolId, new_name: &str)
        -> Result<Vec<UnitId>, ModelError>;

    /// Type written at `site` (a type syntax node or token).
    fn resolve_type(&self, unit: UnitId, site: Span) -> Result<Option<TypeHandle>, ModelError>;

    fn well_known_type(&self, known: KnownType) -> Option<TypeHandle>;

    fn is_generated(&self, unit: UnitId) -> bool;

    fn is_entry_point_unit(&self, unit: UnitId) -> bool;
}
