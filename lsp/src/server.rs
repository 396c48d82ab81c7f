//! The stdio server loop.

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;

use caravel_engine::Engine;

use crate::codec::{FrameReader, FrameWriter};
use crate::protocol::{self, Incoming};
use crate::sink::DiagnosticsPublisher;

const OUTGOING_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

struct Server {
    engine: Engine,
    /// Set by `initialize`; every cargo-touching operation needs it.
    root: Option<PathBuf>,
    publisher: DiagnosticsPublisher,
    outgoing: mpsc::Sender<serde_json::Value>,
}

/// Serve LSP on stdin/stdout until the peer disconnects or sends `exit`.
///
/// All output frames flow through one writer task; the publisher and the
/// request replies share that single writer, so published diagnostic state
/// has exactly one writer at a time.
pub async fn run_stdio(engine: Engine) -> Result<()> {
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel(OUTGOING_CHANNEL_CAPACITY);

    let writer_handle = tokio::spawn(async move {
        let mut writer = FrameWriter::new(tokio::io::stdout());
        while let Some(frame) = outgoing_rx.recv().await {
            if let Err(e) = writer.write_frame(&frame).await {
                tracing::warn!("stdout write failed, stopping writer: {e:#}");
                break;
            }
        }
    });

    let mut server = Server::new(engine, outgoing_tx);
    let mut reader = FrameReader::new(tokio::io::stdin());
    loop {
        match reader.read_frame().await {
            Ok(Some(frame)) => {
                if server.handle_frame(&frame).await == Flow::Exit {
                    break;
                }
            }
            Ok(None) => {
                tracing::info!("editor closed the stream");
                break;
            }
            Err(e) => {
                // Framing errors mean we can no longer find message
                // boundaries; the transport is unusable.
                tracing::warn!("unrecoverable transport error: {e:#}");
                break;
            }
        }
    }

    drop(server);
    let _ = writer_handle.await;
    Ok(())
}

impl Server {
    fn new(engine: Engine, outgoing: mpsc::Sender<serde_json::Value>) -> Self {
        Self {
            engine,
            root: None,
            publisher: DiagnosticsPublisher::new(outgoing.clone()),
            outgoing,
        }
    }

    async fn handle_frame(&mut self, frame: &serde_json::Value) -> Flow {
        let Some(incoming) = protocol::parse_incoming(frame) else {
            tracing::trace!("ignoring frame that is neither request nor notification");
            return Flow::Continue;
        };
        match incoming {
            Incoming::Request { id, method, params } => {
                self.handle_request(&id, &method, params.as_ref()).await;
                Flow::Continue
            }
            Incoming::Notification { method, params } => {
                self.handle_notification(&method, params.as_ref()).await
            }
        }
    }

    async fn handle_request(
        &mut self,
        id: &serde_json::Value,
        method: &str,
        params: Option<&serde_json::Value>,
    ) {
        let reply = match method {
            "initialize" => self.on_initialize(id, params),
            "shutdown" => protocol::response(id, serde_json::Value::Null),
            "caravel/check" => self.on_check(id).await,
            "caravel/depsTree" => self.on_deps_tree(id).await,
            "caravel/search" => self.on_search(id, params).await,
            "caravel/add" => self.on_mutate(id, params, "spec", true).await,
            "caravel/remove" => self.on_mutate(id, params, "name", false).await,
            other => {
                tracing::debug!("request for unknown method {other}");
                protocol::error_response(
                    id,
                    protocol::METHOD_NOT_FOUND,
                    &format!("method not found: {other}"),
                )
            }
        };
        self.send(reply).await;
    }

    async fn handle_notification(
        &mut self,
        method: &str,
        params: Option<&serde_json::Value>,
    ) -> Flow {
        match method {
            "initialized" => {
                tracing::info!("editor handshake complete");
            }
            "textDocument/didSave" => {
                self.on_did_save(params).await;
            }
            "exit" => return Flow::Exit,
            other => {
                tracing::trace!("ignoring notification {other}");
            }
        }
        Flow::Continue
    }

    fn on_initialize(
        &mut self,
        id: &serde_json::Value,
        params: Option<&serde_json::Value>,
    ) -> serde_json::Value {
        let Some(parsed) = protocol::InitializeParams::parse(params) else {
            return protocol::error_response(
                id,
                protocol::INVALID_PARAMS,
                "initialize params carry no workspace root",
            );
        };
        tracing::info!(root = %parsed.root.display(), "initialized for workspace");
        self.root = Some(parsed.root);
        if let Some(config) = parsed.config_override {
            self.engine.set_config(config);
        }
        protocol::response(id, protocol::initialize_result())
    }

    async fn on_did_save(&mut self, params: Option<&serde_json::Value>) {
        if !self.engine.config().check_on_save {
            return;
        }
        let Some(root) = self.root.clone() else {
            return;
        };
        if let Some(params) = params
            && let Ok(save) = serde_json::from_value::<protocol::DidSaveParams>(params.clone())
        {
            tracing::debug!(uri = %save.text_document.uri, "save triggered check pass");
        }
        match self.engine.check_pass(&root).await {
            Ok(set) => {
                if let Err(e) = self.publisher.publish(set).await {
                    tracing::warn!("publishing diagnostics failed: {e:#}");
                }
            }
            Err(e) => tracing::warn!("check pass failed: {e:#}"),
        }
    }

    async fn on_check(&mut self, id: &serde_json::Value) -> serde_json::Value {
        let Some(root) = self.root.clone() else {
            return self.not_initialized(id);
        };
        match self.engine.check_pass(&root).await {
            Ok(set) => {
                let summary = serde_json::json!({
                    "files": set.file_count(),
                    "errors": set.error_count(),
                    "warnings": set.warning_count(),
                });
                if let Err(e) = self.publisher.publish(set).await {
                    tracing::warn!("publishing diagnostics failed: {e:#}");
                }
                protocol::response(id, summary)
            }
            Err(e) => protocol::error_response(id, protocol::INTERNAL_ERROR, &format!("{e:#}")),
        }
    }

    async fn on_deps_tree(&mut self, id: &serde_json::Value) -> serde_json::Value {
        let Some(root) = self.root.clone() else {
            return self.not_initialized(id);
        };
        match self.engine.deps_tree(&root).await {
            Ok(tree) => match serde_json::to_value(tree) {
                Ok(value) => protocol::response(id, value),
                Err(e) => {
                    protocol::error_response(id, protocol::INTERNAL_ERROR, &format!("{e:#}"))
                }
            },
            Err(e) => protocol::error_response(id, protocol::INTERNAL_ERROR, &format!("{e:#}")),
        }
    }

    async fn on_search(
        &mut self,
        id: &serde_json::Value,
        params: Option<&serde_json::Value>,
    ) -> serde_json::Value {
        let Some(query) = params
            .and_then(|p| p.get("query"))
            .and_then(|q| q.as_str())
        else {
            return protocol::error_response(
                id,
                protocol::INVALID_PARAMS,
                "search needs a `query` string",
            );
        };
        match self.engine.search(query).await {
            Ok(hits) => match serde_json::to_value(hits) {
                Ok(value) => protocol::response(id, value),
                Err(e) => {
                    protocol::error_response(id, protocol::INTERNAL_ERROR, &format!("{e:#}"))
                }
            },
            Err(e) => protocol::error_response(id, protocol::INTERNAL_ERROR, &format!("{e:#}")),
        }
    }

    async fn on_mutate(
        &mut self,
        id: &serde_json::Value,
        params: Option<&serde_json::Value>,
        field: &str,
        add: bool,
    ) -> serde_json::Value {
        let Some(root) = self.root.clone() else {
            return self.not_initialized(id);
        };
        let Some(argument) = params.and_then(|p| p.get(field)).and_then(|v| v.as_str()) else {
            return protocol::error_response(
                id,
                protocol::INVALID_PARAMS,
                &format!("expected a `{field}` string"),
            );
        };
        let result = if add {
            self.engine.add_dependency(&root, argument).await
        } else {
            self.engine.remove_dependency(&root, argument).await
        };
        match result {
            Ok(()) => protocol::response(id, serde_json::Value::Null),
            Err(e) => protocol::error_response(id, protocol::INTERNAL_ERROR, &format!("{e:#}")),
        }
    }

    fn not_initialized(&self, id: &serde_json::Value) -> serde_json::Value {
        protocol::error_response(
            id,
            protocol::SERVER_NOT_INITIALIZED,
            "no workspace root: initialize first",
        )
    }

    async fn send(&self, frame: serde_json::Value) {
        if self.outgoing.send(frame).await.is_err() {
            tracing::warn!("outgoing channel closed, dropping reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caravel_types::CaravelConfig;

    fn test_server() -> (Server, mpsc::Receiver<serde_json::Value>) {
        let (tx, rx) = mpsc::channel(OUTGOING_CHANNEL_CAPACITY);
        let engine = Engine::new(CaravelConfig::default()).expect("engine for tests");
        (Server::new(engine, tx), rx)
    }

    fn initialize_frame(id: u64) -> serde_json::Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "initialize",
            "params": { "rootUri": "file:///ws" }
        })
    }

    #[tokio::test]
    async fn test_initialize_replies_with_capabilities() {
        let (mut server, mut rx) = test_server();
        let flow = server.handle_frame(&initialize_frame(1)).await;
        assert_eq!(flow, Flow::Continue);

        let reply = rx.try_recv().unwrap();
        assert_eq!(reply["id"], 1);
        assert!(reply["result"]["capabilities"]["textDocumentSync"].is_object());
        assert_eq!(reply["result"]["serverInfo"]["name"], "caravel");
        assert_eq!(server.root, Some(PathBuf::from("/ws")));
    }

    #[tokio::test]
    async fn test_initialize_without_root_is_invalid_params() {
        let (mut server, mut rx) = test_server();
        let frame = serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}
        });
        server.handle_frame(&frame).await;
        let reply = rx.try_recv().unwrap();
        assert_eq!(reply["error"]["code"], protocol::INVALID_PARAMS);
        assert!(server.root.is_none());
    }

    #[tokio::test]
    async fn test_initialization_options_override_config() {
        let (mut server, mut rx) = test_server();
        let frame = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "rootUri": "file:///ws",
                "initializationOptions": { "check_on_save": false }
            }
        });
        server.handle_frame(&frame).await;
        let _ = rx.try_recv().unwrap();
        assert!(!server.engine.config().check_on_save);
    }

    #[tokio::test]
    async fn test_unknown_request_is_method_not_found() {
        let (mut server, mut rx) = test_server();
        let frame = serde_json::json!({
            "jsonrpc": "2.0", "id": 9, "method": "textDocument/hover", "params": {}
        });
        server.handle_frame(&frame).await;
        let reply = rx.try_recv().unwrap();
        assert_eq!(reply["id"], 9);
        assert_eq!(reply["error"]["code"], protocol::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cargo_requests_before_initialize_are_rejected() {
        let (mut server, mut rx) = test_server();
        for method in ["caravel/check", "caravel/depsTree", "caravel/add"] {
            let frame = serde_json::json!({
                "jsonrpc": "2.0", "id": 2, "method": method, "params": { "spec": "serde" }
            });
            server.handle_frame(&frame).await;
            let reply = rx.try_recv().unwrap();
            assert_eq!(
                reply["error"]["code"],
                protocol::SERVER_NOT_INITIALIZED,
                "{method} must require a root"
            );
        }
    }

    #[tokio::test]
    async fn test_search_without_query_is_invalid_params() {
        let (mut server, mut rx) = test_server();
        let frame = serde_json::json!({
            "jsonrpc": "2.0", "id": 4, "method": "caravel/search", "params": {}
        });
        server.handle_frame(&frame).await;
        let reply = rx.try_recv().unwrap();
        assert_eq!(reply["error"]["code"], protocol::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_shutdown_then_exit() {
        let (mut server, mut rx) = test_server();
        let shutdown = serde_json::json!({ "jsonrpc": "2.0", "id": 5, "method": "shutdown" });
        assert_eq!(server.handle_frame(&shutdown).await, Flow::Continue);
        let reply = rx.try_recv().unwrap();
        assert!(reply["result"].is_null());

        let exit = serde_json::json!({ "jsonrpc": "2.0", "method": "exit" });
        assert_eq!(server.handle_frame(&exit).await, Flow::Exit);
    }

    #[tokio::test]
    async fn test_unknown_notification_is_ignored() {
        let (mut server, mut rx) = test_server();
        let frame = serde_json::json!({
            "jsonrpc": "2.0", "method": "$/setTrace", "params": { "value": "off" }
        });
        assert_eq!(server.handle_frame(&frame).await, Flow::Continue);
        assert!(rx.try_recv().is_err());
    }
}
