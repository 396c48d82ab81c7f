/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl Severity {
    /// Map a rustc diagnostic level string to a severity.
    ///
    /// The compiler emits `"error"`, `"warning"`, `"note"` and `"help"`.
    /// Anything unrecognized (including future levels and `"error: internal
    /// compiler error"`) maps to `Error` — a level we cannot classify must
    /// not be hidden behind a mild severity.
    #[must_use]
    pub fn from_level(level: &str) -> Self {
        match level {
            "warning" => Self::Warning,
            "note" => Self::Information,
            "help" => Self::Hint,
            _ => Self::Error,
        }
    }

    /// LSP numeric severity (1=Error, 2=Warning, 3=Info, 4=Hint).
    #[must_use]
    pub fn to_lsp(self) -> u64 {
        self as u64
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "info",
            Self::Hint => "hint",
        }
    }
}
