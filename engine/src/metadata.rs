//! Workspace metadata model and the dependency tree the editor renders.
//!
//! `cargo metadata` output in, display nodes out — pure data transformation.

use serde::{Deserialize, Serialize};

/// The slice of `cargo metadata --format-version 1` output we consume.
/// Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    pub packages: Vec<Package>,
    pub workspace_members: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub version: String,
    pub dependencies: Vec<PackageDependency>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageDependency {
    pub name: String,
    pub req: String,
    /// "dev", "build", or absent for normal dependencies.
    pub kind: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

/// A node of the navigable tree: a workspace package with its declared
/// dependencies as children. A closed variant, not a hierarchy — the editor
/// only ever renders these two shapes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DepsNode {
    Package {
        name: String,
        version: String,
        children: Vec<DepsNode>,
    },
    Dependency {
        name: String,
        req: String,
        optional: bool,
    },
}

impl Metadata {
    /// Build the display tree: one `Package` node per workspace member, in
    /// metadata order, each carrying its declared dependencies.
    #[must_use]
    pub fn deps_tree(&self) -> Vec<DepsNode> {
        self.packages
            .iter()
            .filter(|p| self.workspace_members.contains(&p.id))
            .map(|p| DepsNode::Package {
                name: p.name.clone(),
                version: p.version.clone(),
                children: p
                    .dependencies
                    .iter()
                    .map(|d| DepsNode::Dependency {
                        name: d.name.clone(),
                        req: d.req.clone(),
                        optional: d.optional,
                    })
                    .collect(),
            })
            .collect()
    }
}
