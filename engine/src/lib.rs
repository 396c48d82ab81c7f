//! Orchestration layer for Caravel.
//!
//! The [`Engine`] owns the cargo runner, the registry client and the user
//! configuration, and exposes the operations the editor surface calls into:
//! check passes, the dependency tree, and registry search/add/remove.

mod cargo;
mod config;
mod metadata;
mod pass;
mod registry;

pub use cargo::{CargoFailure, CargoRunner};
pub use config::{config_path, load_config};
pub use metadata::{DepsNode, Metadata, Package, PackageDependency};
pub use pass::Engine;
pub use registry::{CrateSummary, RegistryClient};
