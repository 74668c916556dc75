//! Definition and type-definition resolution core for the Mica language
//! server.
//!
//! Given a document position this crate identifies the symbol under the
//! cursor, resolves it to its declaring site (possibly in another compiled
//! unit), and, for type-definition requests, resolves the symbol's static
//! type to *its* declaring site. Parsing and type checking are external:
//! the embedding server supplies them through the collaborator traits in
//! [`snapshot`].
//!
//! Two strategies exist, selected once at startup by
//! [`Config::use_fast_path`]: whole-program resolution against a typed
//! snapshot, or fast single-file resolution that trades accuracy for
//! latency. See [`definition`] for the routing rules.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tower_lsp::lsp_types::MessageType;
use tower_lsp::{Client, LspService, Server};

pub mod config;
pub mod definition;
pub mod error;
pub mod fileset;
pub mod scope;
pub mod snapshot;
pub mod util;

mod server;

pub use config::{Config, PathRemapFn};
pub use definition::{DefinitionRouter, Providers, SymbolLocationInfo};
pub use error::{ResolveError, Result};

/// Editor overlay: document URI → current text, maintained by the
/// document-lifecycle notifications.
pub(crate) type OpenFiles = Arc<Mutex<HashMap<String, String>>>;

/// Workspace root negotiated during `initialize`; `None` until then.
pub(crate) type WorkspaceRoot = Arc<Mutex<Option<PathBuf>>>;

/// Language server backend: shared document state plus the resolution
/// router. All per-request work lives in [`definition`]; this struct only
/// carries the state the LSP lifecycle mutates.
pub struct Backend {
    name: String,
    version: String,
    client: Option<Client>,
    open_files: OpenFiles,
    workspace_root: WorkspaceRoot,
    router: DefinitionRouter,
    shutdown: tokio_util::sync::CancellationToken,
}

impl Backend {
    pub fn new(client: Client, providers: Providers, config: Config) -> Self {
        Self::build(Some(client), providers, config, None)
    }

    /// Backend without a connected client, for tests.
    pub fn new_test(providers: Providers, config: Config) -> Self {
        Self::build(None, providers, config, None)
    }

    /// Test backend with the workspace root already negotiated.
    pub fn new_test_with_workspace(
        providers: Providers,
        config: Config,
        workspace_root: PathBuf,
    ) -> Self {
        Self::build(None, providers, config, Some(workspace_root))
    }

    fn build(
        client: Option<Client>,
        providers: Providers,
        config: Config,
        workspace_root: Option<PathBuf>,
    ) -> Self {
        let open_files: OpenFiles = Arc::new(Mutex::new(HashMap::new()));
        let workspace_root: WorkspaceRoot = Arc::new(Mutex::new(workspace_root));
        let router = DefinitionRouter::new(
            providers,
            &config,
            Arc::clone(&open_files),
            Arc::clone(&workspace_root),
        );
        Self {
            name: "MicaLSP".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            client,
            open_files,
            workspace_root,
            router,
            shutdown: tokio_util::sync::CancellationToken::new(),
        }
    }

    /// The request router; public so embedding servers and tests can
    /// resolve without going through the LSP surface.
    pub fn router(&self) -> &DefinitionRouter {
        &self.router
    }

    /// Current overlay text for a document, if it is open.
    pub fn open_file(&self, uri: &str) -> Option<String> {
        self.open_files.lock().get(uri).cloned()
    }

    /// A cancellation token scoped to one request. All tokens abort when
    /// the server shuts down.
    pub(crate) fn request_token(&self) -> tokio_util::sync::CancellationToken {
        self.shutdown.child_token()
    }

    pub(crate) fn cancel_all(&self) {
        self.shutdown.cancel();
    }

    pub(crate) async fn log(&self, typ: MessageType, message: String) {
        if let Some(client) = &self.client {
            client.log_message(typ, message).await;
        }
    }
}

/// Install the process-wide tracing subscriber. Stdout carries the LSP
/// protocol, so diagnostics go to stderr; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Serve a backend over stdio. The embedding binary supplies the
/// analyzer collaborators and calls this from its async runtime.
pub async fn serve(providers: Providers, config: Config) {
    let (service, socket) =
        LspService::new(move |client| Backend::new(client, providers, config));
    Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
        .serve(service)
        .await;
}
