//! The read-only program model this crate resolves against, and the
//! external collaborators that produce it.
//!
//! Parsing and type checking live outside this crate: a
//! [`SnapshotProvider`] hands us a [`ProgramSnapshot`] for a position, a
//! [`SingleFileResolver`] backs the fast definition strategy, and a
//! [`DescriptorEnricher`] attaches best-effort symbol metadata. Everything
//! in here is treated as immutable once received; concurrent requests may
//! read the same snapshot without coordination.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{Position, Url};
use ustr::Ustr;

use crate::fileset::{FileSet, Pos};
use crate::scope::{ScopeId, ScopeTree};

/// Identity of one identifier occurrence within a unit's syntax tree.
pub type OccurrenceId = u32;

/// Index of a declaration object inside its unit's object arena.
pub type ObjId = u32;

/// One textual appearance of a name, either referencing or declaring an
/// entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub id: OccurrenceId,
    pub name: Ustr,
    pub start: Pos,
    pub end: Pos,
}

/// What kind of entity a declaration object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjKind {
    /// A compiled unit referenced by name (an import).
    Unit,
    Type,
    Func,
    Var,
    Const,
}

/// A resolved declaration: the entity an occurrence refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclObject {
    pub name: Ustr,
    pub kind: ObjKind,
    /// Declaring position; [`Pos::NONE`] for builtins.
    pub pos: Pos,
}

/// Read-only use/def, type and scope information for one compiled unit.
#[derive(Debug, Clone, Default)]
pub struct UnitIndex {
    /// Object arena. Entries may describe declarations from other units;
    /// their positions still resolve through the shared file set.
    pub objects: Vec<DeclObject>,
    /// Occurrence → the object it references.
    pub uses: HashMap<OccurrenceId, ObjId>,
    /// Occurrence → the object it declares.
    pub defs: HashMap<OccurrenceId, ObjId>,
    /// Occurrence → static type descriptor: a bare identifier for
    /// local/builtin types, `unit-path.Ident` for foreign-unit types.
    pub type_of: HashMap<OccurrenceId, String>,
    pub scopes: ScopeTree,
    /// The unit's top-level scope, a direct child of the universe scope.
    pub unit_scope: ScopeId,
}

impl UnitIndex {
    pub fn object(&self, id: ObjId) -> &DeclObject {
        &self.objects[id as usize]
    }
}

/// Program-level index of all compiled units, keyed by import path.
#[derive(Debug, Clone, Default)]
pub struct ProgramIndex {
    pub units: HashMap<String, Arc<UnitIndex>>,
}

impl ProgramIndex {
    pub fn unit(&self, path: &str) -> Option<&Arc<UnitIndex>> {
        self.units.get(path)
    }
}

/// A parsed-and-type-checked view of the workspace around one position.
#[derive(Debug, Clone)]
pub struct ProgramSnapshot {
    pub file_set: Arc<FileSet>,
    /// The identifier occurrence at the requested position.
    pub occurrence: Occurrence,
    /// Enclosing node ids, innermost first. Only the descriptor enricher
    /// consumes these.
    pub enclosing: Vec<u32>,
    pub program: Arc<ProgramIndex>,
    /// Import path of the unit containing the requested position.
    pub unit_path: String,
}

impl ProgramSnapshot {
    /// The use/def index of the clicked unit.
    pub fn unit(&self) -> Option<&Arc<UnitIndex>> {
        self.program.unit(&self.unit_path)
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The position does not sit on an identifier (comment, string,
    /// whitespace, operator). Expected during normal editing; callers
    /// treat it as an empty result, not a failure.
    #[error("not an identifier")]
    NotAnIdentifier,
    #[error("analysis failed: {0}")]
    Analysis(String),
}

/// Produces program snapshots; the parsing/type-checking pass lives behind
/// this trait.
pub trait SnapshotProvider: Send + Sync {
    fn snapshot(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> Result<ProgramSnapshot, SnapshotError>;
}

/// A whole unit referenced by name, as reported by the fast resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRef {
    pub path: String,
    pub name: Ustr,
}

/// What the fast single-file resolver found at an offset.
#[derive(Debug, Clone)]
pub struct FastResult {
    /// Set when the identifier denotes a whole unit rather than a symbol.
    pub unit: Option<UnitRef>,
    pub start: Pos,
    pub end: Pos,
}

#[derive(Debug, Error)]
pub enum FastResolveError {
    /// Fast-path sibling of [`SnapshotError::NotAnIdentifier`].
    #[error("no identifier found")]
    NoIdentifierFound,
    #[error("fast resolve failed: {0}")]
    Resolve(String),
}

/// Single-file resolution backend: trades whole-program semantics for
/// speed. The implementation registers the file (and anything else it
/// loads) in the file set it is given.
pub trait SingleFileResolver: Send + Sync {
    fn resolve(
        &self,
        fset: &mut FileSet,
        offset: u32,
        filename: &Path,
        content: &str,
    ) -> Result<FastResult, FastResolveError>;
}

/// Best-effort structured metadata describing a resolved declaration.
/// Attached to results by this crate, never computed by it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDescriptor {
    pub name: String,
    #[serde(rename = "unitPath")]
    pub unit_path: String,
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct EnrichError(pub String);

/// Computes [`SymbolDescriptor`]s from a snapshot. Failures are logged by
/// the caller and never abort resolution.
pub trait DescriptorEnricher: Send + Sync {
    fn describe(
        &self,
        snapshot: &ProgramSnapshot,
        enclosing: &[u32],
        pos: Pos,
    ) -> Result<SymbolDescriptor, EnrichError>;
}
