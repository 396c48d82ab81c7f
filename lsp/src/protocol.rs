//! JSON-RPC message shapes for the server side of the wire.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use caravel_types::{CaravelConfig, CheckDiagnostic};

/// An incoming frame, after the JSON-RPC envelope is resolved once.
/// We are the server: peers send us requests and notifications, never
/// responses (we issue no requests of our own).
#[derive(Debug)]
pub enum Incoming {
    Request {
        id: serde_json::Value,
        method: String,
        params: Option<serde_json::Value>,
    },
    Notification {
        method: String,
        params: Option<serde_json::Value>,
    },
}

/// Classify a raw frame. Returns `None` for frames that are neither a
/// request nor a notification (malformed, or a stray response).
#[must_use]
pub fn parse_incoming(frame: &serde_json::Value) -> Option<Incoming> {
    let method = frame.get("method")?.as_str()?.to_string();
    let params = frame.get("params").cloned();
    match frame.get("id") {
        Some(id) => Some(Incoming::Request {
            id: id.clone(),
            method,
            params,
        }),
        None => Some(Incoming::Notification { method, params }),
    }
}

pub fn response(id: &serde_json::Value, result: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const SERVER_NOT_INITIALIZED: i64 = -32002;

pub fn error_response(id: &serde_json::Value, code: i64, message: &str) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

pub fn notification(method: &str, params: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "jsonrpc": "2.0", "method": method, "params": params })
}

/// Capabilities we advertise in the `initialize` response: we only need to
/// hear about saves.
#[must_use]
pub fn initialize_result() -> serde_json::Value {
    serde_json::json!({
        "capabilities": {
            "textDocumentSync": {
                "openClose": false,
                "change": 0,
                "save": { "includeText": false }
            }
        },
        "serverInfo": {
            "name": "caravel",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// What we consume from `initialize` params: the workspace root and an
/// optional configuration override the editor passes inline.
#[derive(Debug)]
pub struct InitializeParams {
    pub root: PathBuf,
    pub config_override: Option<CaravelConfig>,
}

impl InitializeParams {
    /// First workspace folder wins; `rootUri` is the fallback.
    pub fn parse(params: Option<&serde_json::Value>) -> Option<Self> {
        let params = params?;
        let uri = params
            .get("workspaceFolders")
            .and_then(|folders| folders.get(0))
            .and_then(|folder| folder.get("uri"))
            .or_else(|| params.get("rootUri"))
            .and_then(|uri| uri.as_str())?;
        let root = file_uri_to_path(uri)?;
        let config_override = params
            .get("initializationOptions")
            .and_then(|options| serde_json::from_value(options.clone()).ok());
        Some(Self {
            root,
            config_override,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DidSaveParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
}

#[derive(Debug, Deserialize)]
pub struct TextDocumentIdentifier {
    pub uri: String,
}

/// `textDocument/publishDiagnostics` params for one file. Returns `None`
/// when the path cannot be expressed as a `file://` URI.
///
/// The published range keeps the aggregator's coordinates untouched: the
/// source convention is zero-based with an inclusive end column, and the
/// editor-side renderer already expects exactly that.
#[must_use]
pub fn publish_diagnostics_params(
    path: &Path,
    diagnostics: &[CheckDiagnostic],
) -> Option<serde_json::Value> {
    let uri = path_to_file_uri(path)?;
    let items: Vec<serde_json::Value> = diagnostics
        .iter()
        .map(|d| {
            let range = d.range();
            serde_json::json!({
                "range": {
                    "start": { "line": range.start_line, "character": range.start_col },
                    "end": { "line": range.end_line, "character": range.end_col }
                },
                "severity": d.severity().to_lsp(),
                "code": d.code(),
                "source": "cargo",
                "message": d.message()
            })
        })
        .collect();
    Some(serde_json::json!({ "uri": uri.as_str(), "diagnostics": items }))
}

#[must_use]
pub fn path_to_file_uri(path: &Path) -> Option<url::Url> {
    match url::Url::from_file_path(path) {
        Ok(uri) => Some(uri),
        Err(()) => {
            tracing::warn!("cannot express {} as a file URI", path.display());
            None
        }
    }
}

#[must_use]
pub fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    url::Url::parse(uri).ok().and_then(|u| u.to_file_path().ok())
}
