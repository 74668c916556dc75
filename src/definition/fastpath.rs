//! Fast single-file goto-definition resolution.
//!
//! The fast strategy skips whole-program analysis entirely: it reads one
//! file (through the editor overlay when the document is open), computes
//! the byte offset of the cursor, and asks the external single-file
//! resolver where the definition is. Foreign files the resolver loads on
//! its own land in the request-local file set it is handed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{Location, Position, Url};

use crate::OpenFiles;
use crate::config::PathRemapFn;
use crate::error::{ResolveError, Result};
use crate::fileset::FileSet;
use crate::snapshot::{FastResolveError, SingleFileResolver};
use crate::util;

pub(crate) struct FastPathResolver {
    resolver: Arc<dyn SingleFileResolver>,
    open_files: OpenFiles,
    stdlib_root: PathBuf,
    path_remap: Option<PathRemapFn>,
}

impl FastPathResolver {
    pub(crate) fn new(
        resolver: Arc<dyn SingleFileResolver>,
        open_files: OpenFiles,
        stdlib_root: PathBuf,
        path_remap: Option<PathRemapFn>,
    ) -> Self {
        Self {
            resolver,
            open_files,
            stdlib_root,
            path_remap,
        }
    }

    /// Resolve the symbol at `position` to zero or one definition
    /// locations.
    pub(crate) fn resolve(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> Result<Vec<Location>> {
        let real_path = uri
            .to_file_path()
            .map_err(|()| ResolveError::OutOfWorkspaceUri {
                method: "textDocument/definition",
                uri: uri.to_string(),
            })?;

        // Test suites serve documents from paths that do not match the
        // editor's URIs; give them the chance to correct the path before
        // we read. In production this hook is absent.
        let read_path = match &self.path_remap {
            Some(remap) => remap(&real_path),
            None => real_path.clone(),
        };

        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        let content = self.read_file(&read_path)?;
        // The resolver may load neighbouring files of the same unit, so it
        // gets the real filename, not the remapped one.
        let filename = real_path.display().to_string();
        let offset = util::offset_for_position(&content, position, &filename)?;

        let mut fset = FileSet::new();
        let result = match self.resolver.resolve(&mut fset, offset, &real_path, &content) {
            Ok(result) => result,
            // Expected when the cursor sits on comments, strings or
            // whitespace; report "nothing here" rather than a failure.
            Err(FastResolveError::NoIdentifierFound) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        if result.unit.is_some() {
            // Unit references would resolve to a directory; directory-level
            // locations are deferred, matching the whole-program strategy.
            return Ok(Vec::new());
        }

        let location =
            util::range_to_location(&fset, result.start, result.end, &self.stdlib_root);
        Ok(vec![location])
    }

    /// Read through the editor overlay first, then fall back to disk.
    fn read_file(&self, path: &Path) -> Result<String> {
        if let Ok(uri) = Url::from_file_path(path) {
            if let Some(content) = self.open_files.lock().get(uri.as_str()) {
                return Ok(content.clone());
            }
        }
        Ok(std::fs::read_to_string(path)?)
    }
}
