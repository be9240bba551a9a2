//! Editor-facing requests. Failures degrade to empty results.

use crate::protocol::{
    DocumentSymbol, DocumentSymbolResponse, Hover, Position, file_uri, nested_symbols,
};
use crate::{LspError, LspResult, ServerClient};

use std::path::Path;

use lsp_types::{
    DocumentSymbolParams, HoverParams, TextDocumentIdentifier, TextDocumentPositionParams,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct LanguageFeatures {
    client: ServerClient,
}

impl LanguageFeatures {
    pub fn new(client: ServerClient) -> Self {
        Self { client }
    }

    /// Hover at a zero-based position. None when there is nothing to show.
    pub async fn hover(&self, path: &Path, line: u32, character: u32) -> Option<Hover> {
        let method = "textDocument/hover";
        let text_document = document(method, path)?;
        let params = HoverParams {
            text_document_position_params: TextDocumentPositionParams::new(
                text_document,
                Position::new(line, character),
            ),
            work_done_progress_params: Default::default(),
        };
        self.request::<Option<Hover>>(method, params).await.flatten()
    }

    /// Outline of `path`. Flat server answers come back without children.
    pub async fn document_symbols(&self, path: &Path) -> Vec<DocumentSymbol> {
        let method = "textDocument/documentSymbol";
        let Some(text_document) = document(method, path) else {
            return Vec::new();
        };
        let params = DocumentSymbolParams {
            text_document,
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        self.request::<Option<DocumentSymbolResponse>>(method, params)
            .await
            .flatten()
            .map(nested_symbols)
            .unwrap_or_default()
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: impl Serialize,
    ) -> Option<T> {
        let result: LspResult<T> = async {
            let params = serde_json::to_value(params)?;
            let value = self.client.send_request(method, params).await?;
            Ok(serde_json::from_value(value)?)
        }
        .await;

        match result {
            Ok(value) => Some(value),
            Err(e @ LspError::RequestWhileDisconnected { .. }) => {
                debug!("{method} skipped: {e}");
                None
            }
            Err(e) => {
                warn!("{method} failed: {e}");
                None
            }
        }
    }
}

fn document(method: &str, path: &Path) -> Option<TextDocumentIdentifier> {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    match file_uri(&absolute) {
        Ok(uri) => Some(TextDocumentIdentifier::new(uri)),
        Err(e) => {
            warn!("{method} skipped for {}: {e}", path.display());
            None
        }
    }
}
