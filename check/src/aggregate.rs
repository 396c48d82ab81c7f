//! The diagnostic aggregator: message trees in, per-file positioned
//! diagnostics out.

use std::path::Path;

use caravel_types::{CheckDiagnostic, DiagnosticSet, Range, Severity};

use crate::message::{CheckRecord, CompilerMessage, DiagnosticSpan};

/// Run one aggregation pass over an already-decoded record sequence.
///
/// Only `Compiler` records contribute. For each span of a message, the
/// message and its entire child tree are emitted against that span's file
/// and range — children in this protocol do not carry independent spans, so
/// they inherit the location they were discovered under. A message with no
/// spans cannot be placed in any file and contributes nothing; a message
/// with several spans fans out once per span.
///
/// The aggregator holds no state between calls: every pass starts from an
/// empty set, and the result is consumed exactly once by the publisher.
#[must_use]
pub fn aggregate(
    workspace_root: &Path,
    records: impl IntoIterator<Item = CheckRecord>,
) -> DiagnosticSet {
    let mut set = DiagnosticSet::new();
    for record in records {
        let CheckRecord::Compiler(message) = record else {
            continue;
        };
        add_cargo_diagnostics(&mut set, workspace_root, &message);
    }
    set
}

fn add_cargo_diagnostics(set: &mut DiagnosticSet, workspace_root: &Path, root: &CompilerMessage) {
    for span in &root.spans {
        let range = span_range(span);
        let path = workspace_root.join(&span.file_name);

        // Pre-order walk over the message tree with an explicit stack; the
        // (range, span) pair stays fixed while only the message varies.
        // Depth is unbounded in principle, so no recursion here.
        let mut stack: Vec<&CompilerMessage> = vec![root];
        while let Some(message) = stack.pop() {
            let diagnostic = CheckDiagnostic::new(
                Severity::from_level(&message.level),
                range,
                compose_text(message, span),
                message.code.as_ref().map(|c| c.code.clone()),
            );
            if !set.insert_unique(path.clone(), diagnostic) {
                tracing::trace!(
                    path = %path.display(),
                    "dropping duplicate diagnostic within pass"
                );
            }
            // Reversed so the first child is popped (and emitted) first.
            for child in message.children.iter().rev() {
                stack.push(child);
            }
        }
    }
}

/// Compose `"<level>: <text>"`, with the discovering span's label appended.
/// The label comes from the outer span at every tree level — children share
/// the span they inherited, not one of their own.
fn compose_text(message: &CompilerMessage, span: &DiagnosticSpan) -> String {
    match &span.label {
        Some(label) => format!("{}: {}\nlabel: {label}", message.level, message.message),
        None => format!("{}: {}", message.level, message.message),
    }
}

/// Convert the compiler's 1-based inclusive coordinates to a zero-based
/// range. Clamped rather than wrapped in case a tool ever emits 0.
fn span_range(span: &DiagnosticSpan) -> Range {
    Range::new(
        span.line_start.saturating_sub(1) as u32,
        span.column_start.saturating_sub(1) as u32,
        span.line_end.saturating_sub(1) as u32,
        span.column_end.saturating_sub(1) as u32,
    )
}
