//! JSON-RPC envelope plus the `lsp-types` subset used by the handshake and
//! features.

use crate::{LspError, LspResult};

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub use lsp_types::{
    DocumentSymbol, DocumentSymbolResponse, Hover, HoverContents, MarkedString, Position, Range,
    SymbolInformation, SymbolKind, Uri,
};

pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC `MethodNotFound`
pub const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// `file://` URI for an absolute path, percent-encoded per path segment.
pub fn file_uri(path: &Path) -> LspResult<Uri> {
    let url = Url::from_file_path(path).map_err(|()| {
        LspError::protocol(format!("'{}' is not an absolute path", path.display()))
    })?;
    url.as_str()
        .parse()
        .map_err(|_| LspError::protocol(format!("invalid file URI '{url}'")))
}

/// Hover contents flattened to plain text, sections separated by a blank line.
pub fn hover_text(hover: &Hover) -> String {
    fn marked(text: &MarkedString) -> &str {
        match text {
            MarkedString::String(text) => text,
            MarkedString::LanguageString(code) => &code.value,
        }
    }

    match &hover.contents {
        HoverContents::Scalar(text) => marked(text).to_string(),
        HoverContents::Array(items) => items
            .iter()
            .map(marked)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
        HoverContents::Markup(markup) => markup.value.clone(),
    }
}

/// Flat `SymbolInformation` answers become childless `DocumentSymbol`s.
pub fn nested_symbols(response: DocumentSymbolResponse) -> Vec<DocumentSymbol> {
    match response {
        DocumentSymbolResponse::Nested(symbols) => symbols,
        DocumentSymbolResponse::Flat(symbols) => symbols.into_iter().map(from_flat).collect(),
    }
}

#[allow(deprecated)]
fn from_flat(symbol: SymbolInformation) -> DocumentSymbol {
    DocumentSymbol {
        name: symbol.name,
        detail: symbol.container_name,
        kind: symbol.kind,
        tags: symbol.tags,
        deprecated: symbol.deprecated,
        range: symbol.location.range,
        selection_range: symbol.location.range,
        children: None,
    }
}
