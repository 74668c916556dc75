//! Lexical scope trees and type-name resolution.
//!
//! Each compiled unit carries a [`ScopeTree`]: an arena of nested scopes
//! with explicit parent links, terminating at the universe scope that holds
//! the builtin names. [`resolve_type`] walks this structure to find the
//! declaration of a symbol's static type, either by a qualified lookup in a
//! foreign unit's top-level scope or by walking enclosing scopes outward
//! from the symbol's declaration site.

use std::collections::HashMap;

use ustr::Ustr;

use crate::fileset::Pos;
use crate::snapshot::{DeclObject, ObjId, ProgramIndex, UnitIndex};

/// Index of a scope inside its [`ScopeTree`] arena.
pub type ScopeId = usize;

/// One lexical scope: a span of source, a parent link, and the names
/// declared directly inside it.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub start: Pos,
    pub end: Pos,
    names: HashMap<Ustr, ObjId>,
}

impl Scope {
    fn contains(&self, pos: Pos) -> bool {
        pos.is_valid() && self.start <= pos && pos < self.end
    }

    fn extent(&self) -> u32 {
        self.end.0.saturating_sub(self.start.0)
    }
}

/// Arena of nested lexical scopes for one compiled unit.
///
/// Scope [`ScopeTree::UNIVERSE`] (index 0) is the universe scope holding
/// builtin names; every parent chain terminates there. It has no source
/// span, so [`ScopeTree::innermost`] never selects it.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub const UNIVERSE: ScopeId = 0;

    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Append a scope spanning `start..end` under `parent`.
    pub fn push(&mut self, parent: ScopeId, start: Pos, end: Pos) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            start,
            end,
            names: HashMap::new(),
        });
        self.scopes.len() - 1
    }

    /// Declare `name` directly in `scope`.
    pub fn insert(&mut self, scope: ScopeId, name: Ustr, obj: ObjId) {
        self.scopes[scope].names.insert(name, obj);
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Look `name` up in `scope` only; no parent traversal.
    pub fn lookup(&self, scope: ScopeId, name: Ustr) -> Option<ObjId> {
        self.scopes[scope].names.get(&name).copied()
    }

    /// The innermost scope whose span contains `pos`.
    pub fn innermost(&self, pos: Pos) -> Option<ScopeId> {
        self.scopes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.contains(pos))
            .min_by_key(|(_, s)| s.extent())
            .map(|(id, _)| id)
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the declaration of the type named by `descriptor`.
///
/// A qualified descriptor (`unit-path.Ident`) is split at the last `.` and
/// `Ident` is looked up in the named unit's top-level scope only. A bare
/// identifier is looked up by walking scopes outward from the innermost
/// scope enclosing `site`, stopping before the universe scope: builtin
/// types intentionally do not resolve, so a click on a value of builtin
/// type yields no type-definition location.
pub fn resolve_type(
    descriptor: &str,
    site: Pos,
    site_unit: &UnitIndex,
    program: &ProgramIndex,
) -> Option<DeclObject> {
    if let Some(idx) = descriptor.rfind('.') {
        let (unit_path, ident) = (&descriptor[..idx], &descriptor[idx + 1..]);
        let unit = program.unit(unit_path)?;
        let obj = unit.scopes.lookup(unit.unit_scope, Ustr::from(ident))?;
        return Some(unit.object(obj).clone());
    }

    let name = Ustr::from(descriptor);
    let mut scope = site_unit.scopes.innermost(site)?;
    loop {
        if scope == ScopeTree::UNIVERSE {
            return None;
        }
        if let Some(obj) = site_unit.scopes.lookup(scope, name) {
            return Some(site_unit.object(obj).clone());
        }
        scope = site_unit.scopes.scope(scope).parent?;
    }
}
