//! Goto-definition and goto-type-definition support.
//!
//! Two resolution strategies exist, and exactly one serves any given
//! request:
//!
//! - [`resolve`]: the whole-program strategy. Asks the snapshot provider
//!   for a type-checked view of the workspace, resolves the clicked
//!   occurrence through the unit's use/def index, walks lexical scopes to
//!   find the declaration of the symbol's static type, and attaches a
//!   best-effort symbol descriptor.
//! - [`fastpath`]: the single-file strategy. Reads one file, hands it to
//!   the external single-file resolver, and trades whole-program accuracy
//!   for latency. It has no notion of a symbol's type, so type-definition
//!   requests always run the whole-program strategy.
//!
//! [`DefinitionRouter`] picks the strategy once at construction from
//! [`Config::use_fast_path`] and projects the unified result into
//! definition-shaped and type-definition-shaped responses.

pub(crate) mod fastpath;
pub(crate) mod resolve;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{Location, Position, Url};

use crate::OpenFiles;
use crate::config::Config;
use crate::error::Result;
use crate::snapshot::{
    DescriptorEnricher, SingleFileResolver, SnapshotProvider, SymbolDescriptor,
};

use fastpath::FastPathResolver;
use resolve::DefinitionResolver;

/// External collaborators the resolution core consumes.
#[derive(Clone)]
pub struct Providers {
    pub snapshots: Arc<dyn SnapshotProvider>,
    pub fast: Arc<dyn SingleFileResolver>,
    pub enricher: Arc<dyn DescriptorEnricher>,
}

/// One resolved symbol: its definition location, the location of its
/// static type's declaration when that resolves, and best-effort
/// descriptor metadata.
#[derive(Debug, Clone)]
pub struct SymbolLocationInfo {
    pub location: Location,
    pub type_location: Option<Location>,
    pub symbol: Option<SymbolDescriptor>,
}

/// Routes definition-family requests to the strategy fixed at
/// construction.
pub struct DefinitionRouter {
    full: DefinitionResolver,
    /// Present only when the fast single-file strategy is configured.
    fast: Option<FastPathResolver>,
}

impl DefinitionRouter {
    pub(crate) fn new(
        providers: Providers,
        config: &Config,
        open_files: OpenFiles,
        workspace_root: crate::WorkspaceRoot,
    ) -> Self {
        let full = DefinitionResolver::new(
            providers.snapshots,
            providers.enricher,
            config.stdlib_root.clone(),
            workspace_root,
        );
        let fast = config.use_fast_path.then(|| {
            FastPathResolver::new(
                providers.fast,
                open_files,
                config.stdlib_root.clone(),
                config.path_remap.clone(),
            )
        });
        Self { full, fast }
    }

    /// Handle a "find definition" request.
    pub fn find_definition(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> Result<Vec<Location>> {
        if let Some(fast) = &self.fast {
            return fast.resolve(uri, position, cancel);
        }
        let infos = self
            .full
            .resolve("textDocument/definition", uri, position, cancel)?;
        Ok(infos.into_iter().map(|info| info.location).collect())
    }

    /// Handle a "find type definition" request.
    ///
    /// Not everything with a definition also has a type definition;
    /// entries whose type did not resolve are omitted rather than emitted
    /// with an empty range.
    pub fn find_type_definition(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> Result<Vec<Location>> {
        let infos = self
            .full
            .resolve("textDocument/typeDefinition", uri, position, cancel)?;
        Ok(infos
            .into_iter()
            .filter_map(|info| info.type_location)
            .collect())
    }

    /// Whole-program resolution with descriptors attached, regardless of
    /// the configured definition strategy. Extension endpoints and tests
    /// consume this.
    pub fn find_symbol_info(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> Result<Vec<SymbolLocationInfo>> {
        self.full
            .resolve("workspace/xdefinition", uri, position, cancel)
    }
}
