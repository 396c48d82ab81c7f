//! The engine facade and the aggregation pass.

use std::path::Path;

use anyhow::Result;
use tokio::sync::Mutex;

use caravel_types::{CaravelConfig, DiagnosticSet};

use crate::cargo::CargoRunner;
use crate::metadata::DepsNode;
use crate::registry::{CrateSummary, RegistryClient};

/// Owns the collaborators a check pass awaits on and the operations the
/// editor surface routes here.
pub struct Engine {
    runner: CargoRunner,
    registry: RegistryClient,
    config: CaravelConfig,
    /// Passes are serialized: a save arriving while a pass runs queues
    /// behind it instead of interleaving publications. Latest result wins
    /// at the sink.
    pass_lock: Mutex<()>,
}

impl Engine {
    pub fn new(config: CaravelConfig) -> Result<Self> {
        Ok(Self {
            runner: CargoRunner::new()?,
            registry: RegistryClient::new()?,
            config,
            pass_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &CaravelConfig {
        &self.config
    }

    /// Replace the configuration (the editor may hand one over in
    /// `initializationOptions`, overriding the file on disk).
    pub fn set_config(&mut self, config: CaravelConfig) {
        self.config = config;
    }

    /// Run one aggregation pass: await `cargo check`, then synchronously
    /// decode and aggregate its stream. The returned set is built fresh —
    /// nothing survives from previous passes.
    pub async fn check_pass(&self, workspace_root: &Path) -> Result<DiagnosticSet> {
        let _guard = self.pass_lock.lock().await;
        tracing::info!(root = %workspace_root.display(), "check pass started");

        let stream = self
            .runner
            .check(workspace_root, &self.config.cargo_args)
            .await?;
        let set = caravel_check::aggregate(workspace_root, caravel_check::decode_stream(&stream));

        tracing::info!(
            files = set.file_count(),
            errors = set.error_count(),
            warnings = set.warning_count(),
            "check pass finished"
        );
        Ok(set)
    }

    /// Fetch workspace metadata and shape it into the display tree.
    pub async fn deps_tree(&self, workspace_root: &Path) -> Result<Vec<DepsNode>> {
        let metadata = self.runner.metadata(workspace_root).await?;
        Ok(metadata.deps_tree())
    }

    /// Search the registry with the configured page size.
    pub async fn search(&self, query: &str) -> Result<Vec<CrateSummary>> {
        self.registry.search(query, self.config.search_limit).await
    }

    /// `cargo add` followed by nothing — the editor triggers a fresh check
    /// pass itself if it wants updated diagnostics.
    pub async fn add_dependency(&self, workspace_root: &Path, spec: &str) -> Result<()> {
        self.runner.add(workspace_root, spec).await
    }

    pub async fn remove_dependency(&self, workspace_root: &Path, name: &str) -> Result<()> {
        self.runner.remove(workspace_root, name).await
    }
}
