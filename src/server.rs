//! LSP server trait implementation.
//!
//! This module contains the `impl LanguageServer for Backend` block: the
//! lifecycle handlers that keep the document overlay current, and the
//! definition-family request handlers that delegate to the
//! [`DefinitionRouter`](crate::DefinitionRouter).

use tower_lsp::LanguageServer;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::lsp_types::request::{GotoTypeDefinitionParams, GotoTypeDefinitionResponse};
use tower_lsp::lsp_types::*;

use crate::Backend;
use crate::error::ResolveError;

fn to_jsonrpc(err: ResolveError) -> Error {
    let code = match err {
        ResolveError::InvalidPosition { .. } | ResolveError::OutOfWorkspaceUri { .. } => {
            ErrorCode::InvalidParams
        }
        // LSP's RequestCancelled
        ResolveError::Cancelled => ErrorCode::ServerError(-32800),
        _ => ErrorCode::InternalError,
    };
    Error {
        code,
        message: err.to_string().into(),
        data: None,
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Extract and store the workspace root path
        let workspace_root = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok());

        if let Some(root) = workspace_root {
            *self.workspace_root.lock() = Some(root);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                definition_provider: Some(OneOf::Left(true)),
                type_definition_provider: Some(TypeDefinitionProviderCapability::Simple(true)),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: self.name.clone(),
                version: Some(self.version.clone()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.log(MessageType::INFO, "MicaLSP initialized!".to_string())
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.cancel_all();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let uri = doc.uri.to_string();

        self.open_files.lock().insert(uri.clone(), doc.text);

        self.log(MessageType::INFO, format!("Opened file: {}", uri))
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.to_string();

        // Full sync: each change carries the complete document.
        if let Some(change) = params.content_changes.first() {
            self.open_files.lock().insert(uri, change.text.clone());
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri.to_string();

        self.open_files.lock().remove(&uri);

        self.log(MessageType::INFO, format!("Closed file: {}", uri))
            .await;
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        tracing::debug!(uri = %uri, line = position.line, character = position.character,
            "goto definition");

        let cancel = self.request_token();
        match self.router().find_definition(&uri, position, &cancel) {
            Ok(locations) => Ok(Some(GotoDefinitionResponse::Array(locations))),
            Err(err) => Err(to_jsonrpc(err)),
        }
    }

    async fn goto_type_definition(
        &self,
        params: GotoTypeDefinitionParams,
    ) -> Result<Option<GotoTypeDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        tracing::debug!(uri = %uri, line = position.line, character = position.character,
            "goto type definition");

        let cancel = self.request_token();
        match self.router().find_type_definition(&uri, position, &cancel) {
            Ok(locations) => Ok(Some(GotoTypeDefinitionResponse::Array(locations))),
            Err(err) => Err(to_jsonrpc(err)),
        }
    }
}
