//! Name-and-scope based reference implementation of [`ProgramModel`].
//!
//! There is no type checker behind this model, so it resolves names the
//! way a reader skimming the code would: locals and parameters by their
//! enclosing member, simple names by the enclosing type chain, and
//! `x.Name` by the set of types declaring `Name`. Whenever that is not
//! enough to attribute a reference, renames are refused.

use super::scope::{qualify, type_chain, Site, UnitFacts};
use super::{
    KnownType, ModelError, ProgramModel, Reference, RenameConflict, SymbolId, TypeHandle, UnitId,
};
use crate::frontend::{parse_csharp, FrontendError};
use crate::syntax::{Span, SyntaxTree, TokenEdit};
use std::cell::OnceCell;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// True for a plain (non-`@`) identifier that is not a reserved keyword.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SymbolKey {
    Member { owner: String, name: String },
    Local { unit: UnitId, scope: Span, name: String },
}

impl SymbolKey {
    fn encode(&self) -> SymbolId {
        match self {
            SymbolKey::Member { owner, name } => SymbolId::new(format!("member|{owner}|{name}")),
            SymbolKey::Local { unit, scope, name } => SymbolId::new(format!(
                "local|{}|{}|{}|{name}",
                unit.0, scope.start, scope.end
            )),
        }
    }

    fn decode(id: &SymbolId) -> Option<Self> {
        let parts: Vec<&str> = id.as_str().split('|').collect();
        match parts.as_slice() {
            ["member", owner, name] => Some(SymbolKey::Member {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            ["local", unit, start, end, name] => Some(SymbolKey::Local {
                unit: UnitId(unit.parse().ok()?),
                scope: Span::new(start.parse().ok()?, end.parse().ok()?),
                name: name.to_string(),
            }),
            _ => None,
        }
    }

    fn name(&self) -> &str {
        match self {
            SymbolKey::Member { name, .. } | SymbolKey::Local { name, .. } => name,
        }
    }
}

/// A usage site before it is handed out as a [`Reference`].
struct Usage {
    unit: UnitId,
    span: Span,
    is_write: bool,
    /// Could belong to a different symbol of the same name
    ambiguous: bool,
}

struct SourceUnit {
    name: String,
    tree: SyntaxTree,
    generated: bool,
    facts: OnceCell<UnitFacts>,
}

/// Program model over in-memory units, resolved by name and scope.
#[derive(Default)]
pub struct SyntacticModel {
    units: Vec<SourceUnit>,
}

impl SyntacticModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit; generated units are recognised by name and header comment.
    pub fn add_unit(&mut self, name: impl Into<String>, tree: SyntaxTree) -> UnitId {
        let name = name.into();
        let generated = looks_generated(&name, &tree);
        self.units.push(SourceUnit {
            name,
            tree,
            generated,
            facts: OnceCell::new(),
        });
        UnitId(self.units.len() - 1)
    }

    pub fn add_source(
        &mut self,
        name: impl Into<String>,
        source: &str,
    ) -> Result<UnitId, FrontendError> {
        Ok(self.add_unit(name, parse_csharp(source)?))
    }

    pub fn set_generated(&mut self, unit: UnitId, generated: bool) -> Result<(), ModelError> {
        self.unit_mut(unit)?.generated = generated;
        Ok(())
    }

    fn unit(&self, unit: UnitId) -> Result<&SourceUnit, ModelError> {
        self.units.get(unit.0).ok_or(ModelError::UnknownUnit(unit))
    }

    fn unit_mut(&mut self, unit: UnitId) -> Result<&mut SourceUnit, ModelError> {
        self.units.get_mut(unit.0).ok_or(ModelError::UnknownUnit(unit))
    }

    fn facts(&self, unit: UnitId) -> Result<&UnitFacts, ModelError> {
        let source = self.unit(unit)?;
        Ok(source.facts.get_or_init(|| UnitFacts::analyze(&source.tree)))
    }

    fn all_facts(&self) -> Result<Vec<(UnitId, &UnitFacts)>, ModelError> {
        (0..self.units.len())
            .map(|i| Ok((UnitId(i), self.facts(UnitId(i))?)))
            .collect()
    }

    /// Types anywhere in the program that declare a member called `name`.
    fn owners_of(&self, name: &str) -> Result<HashSet<String>, ModelError> {
        let mut owners = HashSet::new();
        for (_, facts) in self.all_facts()? {
            owners.extend(
                facts
                    .declarations
                    .iter()
                    .filter(|d| d.kind.is_member() && d.name == name)
                    .map(|d| d.owner.clone()),
            );
        }
        Ok(owners)
    }

    /// Declaration name sites of `key`.
    fn declaration_sites(&self, key: &SymbolKey) -> Result<Vec<(UnitId, Span)>, ModelError> {
        let mut sites = Vec::new();
        match key {
            SymbolKey::Member { owner, name } => {
                for (unit, facts) in self.all_facts()? {
                    sites.extend(
                        facts
                            .declarations
                            .iter()
                            .filter(|d| d.kind.is_member() && &d.owner == owner && &d.name == name)
                            .map(|d| (unit, d.name_span)),
                    );
                }
            }
            SymbolKey::Local { unit, scope, name } => {
                let facts = self.facts(*unit)?;
                sites.extend(
                    facts
                        .declarations
                        .iter()
                        .filter(|d| d.kind.is_local() && &d.scope == scope && &d.name == name)
                        .map(|d| (*unit, d.name_span)),
                );
            }
        }
        Ok(sites)
    }

    fn usages(&self, key: &SymbolKey) -> Result<Vec<Usage>, ModelError> {
        let mut usages = Vec::new();
        match key {
            SymbolKey::Member { owner, name } => {
                let owners = self.owners_of(name)?;
                for (unit, facts) in self.all_facts()? {
                    for occurrence in facts.occurrences.iter().filter(|o| &o.name == name) {
                        let ambiguous = match occurrence.site {
                            Site::Declaration | Site::Label => continue,
                            Site::Simple if occurrence.local_scope.is_some() => continue,
                            Site::Simple => {
                                match type_chain(&occurrence.enclosing_type)
                                    .find(|t| owners.contains(*t))
                                {
                                    Some(resolved) if resolved == owner => false,
                                    Some(_) => continue,
                                    None => true,
                                }
                            }
                            Site::Qualified {
                                this_receiver: true,
                            } => {
                                if &occurrence.enclosing_type == owner {
                                    false
                                } else if owners.contains(&occurrence.enclosing_type) {
                                    continue;
                                } else {
                                    true
                                }
                            }
                            Site::Qualified {
                                this_receiver: false,
                            } => owners.len() > 1,
                        };
                        usages.push(Usage {
                            unit,
                            span: occurrence.span,
                            is_write: occurrence.is_write,
                            ambiguous,
                        });
                    }
                }
            }
            SymbolKey::Local { unit, scope, name } => {
                let facts = self.facts(*unit)?;
                usages.extend(
                    facts
                        .occurrences
                        .iter()
                        .filter(|o| {
                            &o.name == name
                                && o.site == Site::Simple
                                && o.local_scope == Some(*scope)
                        })
                        .map(|o| Usage {
                            unit: *unit,
                            span: o.span,
                            is_write: o.is_write,
                            ambiguous: false,
                        }),
                );
            }
        }
        Ok(usages)
    }

    fn check_collision(&self, key: &SymbolKey, new_name: &str) -> Result<(), ModelError> {
        let collision = |scope: &str| {
            ModelError::Conflict(RenameConflict::Collision {
                new_name: new_name.to_string(),
                scope: scope.to_string(),
            })
        };
        match key {
            SymbolKey::Member { owner, .. } => {
                if owner.rsplit('.').next() == Some(new_name) {
                    return Err(collision(owner));
                }
                for (_, facts) in self.all_facts()? {
                    if facts
                        .declarations
                        .iter()
                        .any(|d| !d.kind.is_local() && &d.owner == owner && d.name == new_name)
                    {
                        return Err(collision(owner));
                    }
                    let bodies: Vec<Span> = facts
                        .types
                        .iter()
                        .filter(|t| &t.qualified == owner)
                        .map(|t| t.span)
                        .collect();
                    if facts
                        .occurrences
                        .iter()
                        .any(|o| o.name == new_name && bodies.iter().any(|b| b.contains(o.span)))
                    {
                        return Err(collision(owner));
                    }
                }
            }
            SymbolKey::Local { unit, scope, name } => {
                let facts = self.facts(*unit)?;
                if facts
                    .occurrences
                    .iter()
                    .any(|o| o.name == new_name && scope.contains(o.span))
                {
                    let owner = facts.enclosing_type(*scope);
                    return Err(collision(&qualify(&owner, name)));
                }
            }
        }
        Ok(())
    }
}

impl ProgramModel for SyntacticModel {
    fn unit_ids(&self) -> Vec<UnitId> {
        (0..self.units.len()).map(UnitId).collect()
    }

    fn unit_name(&self, unit: UnitId) -> Result<&str, ModelError> {
        Ok(&self.unit(unit)?.name)
    }

    fn tree(&self, unit: UnitId) -> Result<&SyntaxTree, ModelError> {
        Ok(&self.unit(unit)?.tree)
    }

    fn update_tree(&mut self, unit: UnitId, tree: SyntaxTree) -> Result<(), ModelError> {
        let source = self.unit_mut(unit)?;
        if source.tree != tree {
            source.tree = tree;
            source.facts = OnceCell::new();
        }
        Ok(())
    }

    fn declared_symbol(&self, unit: UnitId, site: Span) -> Result<Option<SymbolId>, ModelError> {
        let facts = self.facts(unit)?;
        facts.index.token_at_span(site)?;
        let Some(decl) = facts.declarations.iter().find(|d| d.name_span == site) else {
            return Ok(None);
        };
        let key = match decl.kind {
            kind if kind.is_member() => SymbolKey::Member {
                owner: decl.owner.clone(),
                name: decl.name.clone(),
            },
            kind if kind.is_local() => SymbolKey::Local {
                unit,
                scope: decl.scope,
                name: decl.name.clone(),
            },
            _ => return Ok(None),
        };
        Ok(Some(key.encode()))
    }

    fn find_references(&self, symbol: &SymbolId) -> Result<Vec<Reference>, ModelError> {
        let key = SymbolKey::decode(symbol).ok_or_else(|| ModelError::UnknownSymbol(symbol.clone()))?;
        Ok(self
            .usages(&key)?
            .into_iter()
            .map(|u| Reference {
                unit: u.unit,
                span: u.span,
                is_write: u.is_write,
            })
            .collect())
    }

    fn rename_symbol(
        &mut self,
        symbol: &SymbolId,
        new_name: &str,
    ) -> Result<Vec<UnitId>, ModelError> {
        if !is_valid_identifier(new_name) {
            return Err(RenameConflict::InvalidName(new_name.to_string()).into());
        }
        let key = SymbolKey::decode(symbol).ok_or_else(|| ModelError::UnknownSymbol(symbol.clone()))?;
        let old_name = key.name().to_string();

        let sites = self.declaration_sites(&key)?;
        if sites.is_empty() {
            return Err(ModelError::UnknownSymbol(symbol.clone()));
        }
        let usages = self.usages(&key)?;
        if usages.iter().any(|u| u.ambiguous) {
            return Err(RenameConflict::Ambiguous { name: old_name }.into());
        }
        self.check_collision(&key, new_name)?;

        let mut by_unit: BTreeMap<UnitId, Vec<Span>> = BTreeMap::new();
        for (unit, span) in sites
            .into_iter()
            .chain(usages.into_iter().map(|u| (u.unit, u.span)))
        {
            by_unit.entry(unit).or_default().push(span);
        }

        // plan every unit before touching any
        let mut renamed = Vec::with_capacity(by_unit.len());
        for (unit, spans) in by_unit {
            let facts = self.facts(unit)?;
            let edits = spans
                .into_iter()
                .map(|span| {
                    let entry = facts.index.token_at_span(span)?;
                    Ok(TokenEdit::new(entry.path.clone(), new_name, &old_name))
                })
                .collect::<Result<Vec<_>, ModelError>>()?;
            let mut tree = self.unit(unit)?.tree.clone();
            TokenEdit::apply_batch(&mut tree, edits)?;
            renamed.push((unit, tree));
        }

        let changed: Vec<UnitId> = renamed.iter().map(|(unit, _)| *unit).collect();
        for (unit, tree) in renamed {
            self.update_tree(unit, tree)?;
        }
        debug!(symbol = %symbol, %new_name, units = changed.len(), "renamed symbol");
        Ok(changed)
    }

    fn resolve_type(&self, unit: UnitId, site: Span) -> Result<Option<TypeHandle>, ModelError> {
        let facts = self.facts(unit)?;
        let tree = &self.unit(unit)?.tree;
        let text = match facts.index.nodes().iter().find(|n| n.span == site && n.path.depth() > 0) {
            Some(entry) => tree.node_at(&entry.path)?.compact_text(),
            None => {
                let entry = facts.index.token_at_span(site)?;
                tree.token_at(&entry.path)?.text.clone()
            }
        };
        Ok(Some(TypeHandle::new(simple_type_name(&text))).filter(|_| !text.is_empty()))
    }

    fn well_known_type(&self, known: KnownType) -> Option<TypeHandle> {
        Some(TypeHandle::new(match known {
            KnownType::AsyncResult => "Task",
            KnownType::AsyncValueResult => "ValueTask",
        }))
    }

    fn is_generated(&self, unit: UnitId) -> bool {
        self.unit(unit).is_ok_and(|u| u.generated)
    }

    fn is_entry_point_unit(&self, unit: UnitId) -> bool {
        self.facts(unit).is_ok_and(|f| f.entry_point)
    }
}

/// `global::System.Threading.Tasks.Task<int>?` is `Task`.
fn simple_type_name(text: &str) -> &str {
    let base = text.split('<').next().unwrap_or(text).trim_end_matches('?');
    base.rsplit(['.', ':']).next().unwrap_or(base)
}

/// Generated code is recognised by file name, build-output folder or an
/// `<auto-generated>` marker in the first comment.
pub(crate) fn looks_generated(name: &str, tree: &SyntaxTree) -> bool {
    let lower = name.to_ascii_lowercase().replace('\\', "/");
    let by_name = [".g.cs", ".g.i.cs", ".designer.cs", ".generated.cs"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
        || lower.split('/').any(|segment| segment == "obj" || segment == "bin");
    by_name
        || tree
            .root()
            .first_token()
            .and_then(|t| t.leading.iter().find(|l| !l.is_trivial()))
            .is_some_and(|comment| comment.text.contains("<auto-generated"))
}
