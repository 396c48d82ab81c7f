//! Serde model for rustc diagnostics as they appear on the cargo stream.
//!
//! Field names are fixed by the compiler's JSON output. Only the fields the
//! aggregator consumes are modeled; everything else on the wire is ignored.

use serde::Deserialize;

/// One decoded line of the cargo stream.
///
/// Cargo interleaves compiler diagnostics with build-artifact and progress
/// records on the same stream. The decoder resolves the distinction once;
/// the aggregator matches only on `Compiler`.
#[derive(Debug, Clone)]
pub enum CheckRecord {
    Compiler(CompilerMessage),
    /// A well-formed record with no diagnostic content (artifact, build
    /// script output, build-finished marker).
    Other,
}

/// A compiler diagnostic: the message tree rooted at one error or warning.
#[derive(Debug, Clone, Deserialize)]
pub struct CompilerMessage {
    /// The primary error message.
    pub message: String,
    pub code: Option<DiagnosticCode>,
    /// "error", "warning", "note", "help" — or something newer; the severity
    /// mapping treats unknown levels as errors.
    pub level: String,
    pub spans: Vec<DiagnosticSpan>,
    /// Attached sub-diagnostics. Unbounded in principle, shallow in practice.
    pub children: Vec<CompilerMessage>,
    /// The message as rustc would render it.
    pub rendered: Option<String>,
}

/// A source location attached to a diagnostic. Coordinates are 1-based and
/// inclusive; `file_name` is relative to the workspace root.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticSpan {
    pub file_name: String,
    pub byte_start: u32,
    pub byte_end: u32,
    pub line_start: usize,
    pub line_end: usize,
    /// 1-based, character offset.
    pub column_start: usize,
    pub column_end: usize,
    /// Whether this is the point where the error occurred. Informational —
    /// every span produces a diagnostic, primary or not.
    pub is_primary: bool,
    /// Label that should be placed at this location (if any).
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticCode {
    /// The code itself (e.g. "E0308").
    pub code: String,
    /// An explanation for the code.
    pub explanation: Option<String>,
}
