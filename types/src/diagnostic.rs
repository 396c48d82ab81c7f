//! Positioned diagnostics and the per-file set built by an aggregation pass.

use std::path::{Path, PathBuf};

use crate::severity::Severity;

/// A zero-based source range. Both ends are inclusive, following the
/// compiler's coordinate convention after the 1-based offset is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Range {
    #[must_use]
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

/// A single positioned diagnostic produced by an aggregation pass.
///
/// Fields are private; construction goes through [`CheckDiagnostic::new`] and
/// the value is immutable afterwards. Equality is the dedup key used by
/// [`DiagnosticSet::insert_unique`]: severity, range, message text and code.
/// A present code never equals an absent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDiagnostic {
    severity: Severity,
    range: Range,
    message: String,
    code: Option<String>,
}

impl CheckDiagnostic {
    #[must_use]
    pub fn new(severity: Severity, range: Range, message: String, code: Option<String>) -> Self {
        Self {
            severity,
            range,
            message,
            code,
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn range(&self) -> Range {
        self.range
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Format as `path:line:col: severity: message` (1-indexed for display).
    /// Only the first line of the message is shown; span labels and child
    /// notes live on continuation lines.
    #[must_use]
    pub fn display_with_path(&self, path: &Path) -> String {
        let first_line = self.message.lines().next().unwrap_or("");
        format!(
            "{}:{}:{}: {}: {}",
            path.display(),
            self.range.start_line + 1,
            self.range.start_col + 1,
            self.severity.label(),
            first_line,
        )
    }
}

/// Mapping from absolute file path to the ordered diagnostics discovered for
/// that file within one aggregation pass.
///
/// File order and per-file diagnostic order are both first-discovery order —
/// nothing is sorted by position. The set is created empty at the start of a
/// pass, populated through [`insert_unique`](Self::insert_unique), and
/// consumed exactly once by the publisher.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSet {
    // Linear lookup: a pass touches a handful of files, not thousands.
    files: Vec<(PathBuf, Vec<CheckDiagnostic>)>,
}

impl DiagnosticSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic to `path`'s sequence unless an equal one is
    /// already recorded there. Returns whether the diagnostic was kept;
    /// the later duplicate is the one discarded.
    pub fn insert_unique(&mut self, path: PathBuf, diagnostic: CheckDiagnostic) -> bool {
        let index = match self.files.iter().position(|(p, _)| *p == path) {
            Some(index) => index,
            None => {
                self.files.push((path, Vec::new()));
                self.files.len() - 1
            }
        };
        let entry = &mut self.files[index].1;

        if entry.contains(&diagnostic) {
            return false;
        }
        entry.push(diagnostic);
        true
    }

    /// Per-file diagnostics in first-discovery order.
    pub fn files(&self) -> impl Iterator<Item = (&Path, &[CheckDiagnostic])> {
        self.files
            .iter()
            .map(|(path, items)| (path.as_path(), items.as_slice()))
    }

    /// Consume the set for publication.
    #[must_use]
    pub fn into_files(self) -> Vec<(PathBuf, Vec<CheckDiagnostic>)> {
        self.files
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.files.iter().map(|(_, items)| items.len()).sum()
    }

    fn count_by_severity(&self, severity: Severity) -> usize {
        self.files
            .iter()
            .flat_map(|(_, items)| items)
            .filter(|d| d.severity() == severity)
            .count()
    }

    /// Number of error-level diagnostics.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count_by_severity(Severity::Error)
    }

    /// Number of warning-level diagnostics.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count_by_severity(Severity::Warning)
    }
}
