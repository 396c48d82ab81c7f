//! Cargo process invocation.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use anyhow::{Context, Result};
use tokio::process::Command;

use crate::metadata::Metadata;

/// A cargo subcommand that exited non-zero without producing usable output.
///
/// This is the one hard failure an aggregation pass surfaces: compile errors
/// are *not* this case (cargo exits non-zero but the stream carries the
/// diagnostics we came for).
#[derive(Debug, thiserror::Error)]
#[error("cargo {subcommand} failed ({status}): {stderr}")]
pub struct CargoFailure {
    pub subcommand: String,
    pub status: String,
    pub stderr: String,
}

/// Spawns cargo subcommands. The executable is resolved once at
/// construction; every method runs with the workspace root as the working
/// directory.
pub struct CargoRunner {
    cargo: PathBuf,
}

impl CargoRunner {
    pub fn new() -> Result<Self> {
        let cargo = which::which("cargo").context("cargo not found in PATH")?;
        Ok(Self { cargo })
    }

    fn command(&self, workspace_root: &Path) -> Command {
        let mut cmd = Command::new(&self.cargo);
        cmd.current_dir(workspace_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn failure(subcommand: &str, output: &Output) -> CargoFailure {
        CargoFailure {
            subcommand: subcommand.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Run `cargo check --message-format=json` and capture the message
    /// stream. A non-zero exit with a non-empty stream is the normal shape
    /// of a build with compile errors; only an empty stream is a failure.
    pub async fn check(&self, workspace_root: &Path, extra_args: &[String]) -> Result<String> {
        let output = self
            .command(workspace_root)
            .arg("check")
            .arg("--message-format=json")
            .args(extra_args)
            .output()
            .await
            .context("running cargo check")?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() && stdout.trim().is_empty() {
            return Err(Self::failure("check", &output).into());
        }
        tracing::debug!(
            status = %output.status,
            bytes = stdout.len(),
            "cargo check stream captured"
        );
        Ok(stdout)
    }

    /// Run `cargo metadata` and decode the workspace graph.
    pub async fn metadata(&self, workspace_root: &Path) -> Result<Metadata> {
        let output = self
            .command(workspace_root)
            .args(["metadata", "--format-version", "1"])
            .output()
            .await
            .context("running cargo metadata")?;

        if !output.status.success() {
            return Err(Self::failure("metadata", &output).into());
        }
        serde_json::from_slice(&output.stdout).context("decoding cargo metadata output")
    }

    /// Run `cargo add <spec>` in the workspace root.
    pub async fn add(&self, workspace_root: &Path, spec: &str) -> Result<()> {
        self.mutate(workspace_root, "add", spec).await
    }

    /// Run `cargo remove <name>` in the workspace root.
    pub async fn remove(&self, workspace_root: &Path, name: &str) -> Result<()> {
        self.mutate(workspace_root, "remove", name).await
    }

    async fn mutate(&self, workspace_root: &Path, subcommand: &str, arg: &str) -> Result<()> {
        let output = self
            .command(workspace_root)
            .args([subcommand, arg])
            .output()
            .await
            .with_context(|| format!("running cargo {subcommand}"))?;

        if !output.status.success() {
            return Err(Self::failure(subcommand, &output).into());
        }
        tracing::info!(subcommand, arg, "cargo manifest updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_carries_stderr() {
        let failure = CargoFailure {
            subcommand: "check".to_string(),
            status: "exit status: 101".to_string(),
            stderr: "error: could not find `Cargo.toml`".to_string(),
        };
        let text = failure.to_string();
        assert!(text.contains("cargo check failed"));
        assert!(text.contains("could not find `Cargo.toml`"));
    }
}
