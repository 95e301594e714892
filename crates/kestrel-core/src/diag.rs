//! Append-only diagnostics sink.
//!
//! Every check in the semantic passes is non-fatal: a failed check registers
//! a diagnostic here and the pass continues with a safe fallback type, so a
//! single run surfaces as many problems as possible. Order of registration is
//! source order and is preserved.

use std::fmt;

use crate::error::SemanticError;

/// Diagnostic severity. The semantic passes only ever emit [`Severity::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A single user-visible diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file: String,
    pub line: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.file, self.line, self.severity, self.message
        )
    }
}

/// Collects diagnostics across all passes.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a diagnostic with an explicit severity.
    pub fn register(
        &mut self,
        severity: Severity,
        file: &str,
        line: u32,
        message: impl fmt::Display,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            file: file.into(),
            line,
            message: message.to_string(),
        });
    }

    /// Register a semantic error at the given source position.
    pub fn error(&mut self, file: &str, line: u32, error: SemanticError) {
        self.register(Severity::Error, file, line, error);
    }

    /// Whether no errors have been registered. Code generation must only
    /// run when this holds.
    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sink_is_clean() {
        assert!(DiagnosticSink::new().is_clean());
    }

    #[test]
    fn registration_preserves_order() {
        let mut sink = DiagnosticSink::new();
        sink.register(Severity::Error, "A.kst", 3, "first");
        sink.register(Severity::Error, "A.kst", 7, "second");

        let messages: Vec<_> = sink
            .diagnostics()
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(messages, ["first", "second"]);
        assert_eq!(sink.error_count(), 2);
    }

    #[test]
    fn warnings_do_not_dirty_the_sink() {
        let mut sink = DiagnosticSink::new();
        sink.register(Severity::Warning, "A.kst", 1, "heads up");
        assert!(sink.is_clean());
    }

    #[test]
    fn display_format() {
        let diag = Diagnostic {
            severity: Severity::Error,
            file: "A.kst".into(),
            line: 12,
            message: "not a statement".into(),
        };
        assert_eq!(diag.to_string(), "A.kst:12: error: not a statement");
    }
}
