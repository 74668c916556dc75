//! Whole-program goto-definition resolution.
//!
//! Given a cursor position this module:
//!   1. Checks the document is inside the managed workspace.
//!   2. Obtains a type-checked program snapshot at the position.
//!   3. Resolves the clicked occurrence through the unit's use/def index
//!      (uses first, defs as fallback).
//!   4. Resolves the symbol's static type to its own declaration via the
//!      scope walk in [`crate::scope`].
//!   5. Maps both declarations to editor locations and attaches a
//!      best-effort symbol descriptor.
//!
//! Clicks that land on non-identifiers, unit names or builtins resolve to
//! an empty result rather than an error; see the module table in
//! [`crate::error`].

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{Position, Url};

use crate::WorkspaceRoot;
use crate::definition::SymbolLocationInfo;
use crate::error::{ResolveError, Result};
use crate::fileset::Pos;
use crate::scope;
use crate::snapshot::{DescriptorEnricher, ObjKind, SnapshotError, SnapshotProvider};
use crate::util;

pub(crate) struct DefinitionResolver {
    snapshots: Arc<dyn SnapshotProvider>,
    enricher: Arc<dyn DescriptorEnricher>,
    stdlib_root: PathBuf,
    workspace_root: WorkspaceRoot,
}

impl DefinitionResolver {
    pub(crate) fn new(
        snapshots: Arc<dyn SnapshotProvider>,
        enricher: Arc<dyn DescriptorEnricher>,
        stdlib_root: PathBuf,
        workspace_root: WorkspaceRoot,
    ) -> Self {
        Self {
            snapshots,
            enricher,
            stdlib_root,
            workspace_root,
        }
    }

    /// Resolve the symbol at `position` to its declaration and, when
    /// possible, the declaration of its static type.
    ///
    /// Returns a list to leave room for ambiguous positions; today exactly
    /// one element is produced for any position that resolves at all.
    pub(crate) fn resolve(
        &self,
        method: &'static str,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> Result<Vec<SymbolLocationInfo>> {
        if !self.in_workspace(uri) {
            return Err(ResolveError::OutOfWorkspaceUri {
                method,
                uri: uri.to_string(),
            });
        }
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let snapshot = match self.snapshots.snapshot(uri, position, cancel) {
            Ok(snapshot) => snapshot,
            // Clicking comments/strings/whitespace is routine; report
            // "nothing here" rather than a failure.
            Err(SnapshotError::NotAnIdentifier) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let unit = snapshot.unit().ok_or_else(|| {
            SnapshotError::Analysis(format!(
                "unit {} missing from program index",
                snapshot.unit_path
            ))
        })?;

        let occurrence = &snapshot.occurrence;
        let obj_id = unit
            .uses
            .get(&occurrence.id)
            .or_else(|| unit.defs.get(&occurrence.id));
        let Some(&obj_id) = obj_id else {
            return Err(ResolveError::DefinitionNotFound);
        };
        let obj = unit.object(obj_id);

        if obj.kind == ObjKind::Unit {
            // Unit names would resolve to a directory; directory-level
            // locations are deferred, so report nothing for now.
            return Ok(Vec::new());
        }
        if !obj.pos.is_valid() {
            // Builtins carry no declaring position. Don't emit a
            // definition for them; jumping to their declaration is not
            // worth synthesizing one here.
            return Ok(Vec::new());
        }

        let type_obj = unit
            .type_of
            .get(&occurrence.id)
            .and_then(|descriptor| scope::resolve_type(descriptor, obj.pos, unit, &snapshot.program))
            .filter(|type_obj| type_obj.pos.is_valid());

        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let location = util::range_to_location(
            &snapshot.file_set,
            obj.pos,
            Pos(obj.pos.0 + obj.name.len() as u32),
            &self.stdlib_root,
        );
        // The index gives no end position for the type's declaration;
        // its name length is a close enough stand-in.
        let type_location = type_obj.map(|type_obj| {
            util::range_to_location(
                &snapshot.file_set,
                type_obj.pos,
                Pos(type_obj.pos.0 + type_obj.name.len() as u32 + 1),
                &self.stdlib_root,
            )
        });

        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        // Best effort; a resolver that can't describe the symbol still
        // produced a perfectly good location.
        let symbol = match self
            .enricher
            .describe(&snapshot, &snapshot.enclosing, obj.pos)
        {
            Ok(descriptor) => Some(descriptor),
            Err(err) => {
                tracing::warn!(uri = %uri, error = %err, "symbol descriptor enrichment failed");
                None
            }
        };

        Ok(vec![SymbolLocationInfo {
            location,
            type_location,
            symbol,
        }])
    }

    /// A document is in the workspace when it is a `file://` URI that
    /// sits under the workspace root. Before a root is negotiated any
    /// `file://` URI passes.
    fn in_workspace(&self, uri: &Url) -> bool {
        let Ok(path) = uri.to_file_path() else {
            return false;
        };
        match self.workspace_root.lock().as_ref() {
            Some(root) => path.starts_with(root),
            None => true,
        }
    }
}
