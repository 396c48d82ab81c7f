//! Core domain types for Caravel.
//!
//! These types define the interface between the aggregation core
//! (`caravel-check`), the orchestration layer (`caravel-engine`) and the
//! editor surface (`caravel-lsp`). No IO, no async.

mod config;
mod diagnostic;
mod severity;

pub use config::CaravelConfig;
pub use diagnostic::{CheckDiagnostic, DiagnosticSet, Range};
pub use severity::Severity;
