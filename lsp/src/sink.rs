//! The diagnostics publisher — the single writer of editor diagnostic state.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use caravel_types::DiagnosticSet;

use crate::protocol;

/// Publishes finalized diagnostic sets to the editor, one
/// `textDocument/publishDiagnostics` per file.
///
/// The publisher remembers which paths it last published. A new pass first
/// clears every previously-published path that is absent from the new set
/// (an empty publish is how LSP clears a file), then sets each present
/// file's full ordered sequence — never a partial update. There is exactly
/// one publisher per server, so published state has a single writer.
pub struct DiagnosticsPublisher {
    outgoing: mpsc::Sender<serde_json::Value>,
    published: HashSet<PathBuf>,
}

impl DiagnosticsPublisher {
    #[must_use]
    pub fn new(outgoing: mpsc::Sender<serde_json::Value>) -> Self {
        Self {
            outgoing,
            published: HashSet::new(),
        }
    }

    /// Publish one pass's result, consuming it.
    pub async fn publish(&mut self, set: DiagnosticSet) -> Result<()> {
        let files = set.into_files();

        let current: HashSet<PathBuf> = files.iter().map(|(path, _)| path.clone()).collect();
        let stale: Vec<PathBuf> = self
            .published
            .iter()
            .filter(|path| !current.contains(*path))
            .cloned()
            .collect();

        for path in stale {
            if let Some(params) = protocol::publish_diagnostics_params(&path, &[]) {
                self.send(params).await?;
            }
            self.published.remove(&path);
        }

        for (path, items) in files {
            let Some(params) = protocol::publish_diagnostics_params(&path, &items) else {
                continue;
            };
            self.send(params).await?;
            self.published.insert(path);
        }

        Ok(())
    }

    async fn send(&self, params: serde_json::Value) -> Result<()> {
        let frame = protocol::notification("textDocument/publishDiagnostics", params);
        self.outgoing
            .send(frame)
            .await
            .ok()
            .context("outgoing frame channel closed")
    }
}
