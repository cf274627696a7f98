//! Diagnostics collected while deriving struct metadata.
//!
//! A build never stops at the first problem. Every finding is appended to a
//! [`DiagnosticSet`], which separates fatal errors from warnings. Callers
//! decide when to escalate with [`DiagnosticSet::escalate`].

use crate::error::{Error, Result};
use std::fmt;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Blocks the build
    Error,
    /// Reported, never blocks the build
    Warning,
}

/// Category of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A tag has an out-of-range id or an unusable name
    MalformedTag,
    /// A field is missing its extraction or injection, or its members disagree
    FieldWiring,
    /// Two members declare the same id (or the same name) incompatibly
    DuplicateField,
    /// No viable construction strategy, or more than one
    ConstructionStrategy,
    /// A reference cycle passes through a field that cannot be deferred
    CycleResolution,
    /// A referenced class is not known to the class source
    UnknownType,
    /// A tagged member plays no part in the chosen strategy
    UnusedMember,
}

impl DiagnosticKind {
    /// Returns the human readable category name
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MalformedTag => "malformed tag",
            DiagnosticKind::FieldWiring => "field wiring error",
            DiagnosticKind::DuplicateField => "duplicate field",
            DiagnosticKind::ConstructionStrategy => "construction strategy error",
            DiagnosticKind::CycleResolution => "cycle resolution error",
            DiagnosticKind::UnknownType => "unknown type",
            DiagnosticKind::UnusedMember => "unused member",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding about one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Error or warning
    pub severity: Severity,
    /// Category
    pub kind: DiagnosticKind,
    /// Class the finding is about
    pub class: String,
    /// Human readable message
    pub message: String,
}

impl Diagnostic {
    /// Returns true for fatal diagnostics
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} in '{}': {}", level, self.kind, self.class, self.message)
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticSet {
    items: Vec<Diagnostic>,
}

impl DiagnosticSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fatal diagnostic
    pub fn error(&mut self, class: &str, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Severity::Error, class, kind, message.into());
    }

    /// Records a non-fatal diagnostic
    pub fn warning(&mut self, class: &str, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Severity::Warning, class, kind, message.into());
    }

    fn push(&mut self, severity: Severity, class: &str, kind: DiagnosticKind, message: String) {
        self.items.push(Diagnostic {
            severity,
            kind,
            class: class.to_string(),
            message,
        });
    }

    /// Appends every diagnostic of `other`
    pub fn extend(&mut self, other: DiagnosticSet) {
        self.items.extend(other.items);
    }

    /// All diagnostics in the order they were reported
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Fatal diagnostics only
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.items.iter().filter(|d| d.is_error()).collect()
    }

    /// Warnings only
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.items.iter().filter(|d| !d.is_error()).collect()
    }

    /// Returns true if at least one fatal diagnostic was recorded
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    /// Returns true if any diagnostic of `kind` was recorded
    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.items.iter().any(|d| d.kind == kind)
    }

    /// Number of diagnostics
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Turns the first fatal diagnostic into an [`Error`]
    pub fn escalate(&self) -> Result<()> {
        match self.items.iter().find(|d| d.is_error()) {
            Some(first) => Err(Error::Metadata {
                class: first.class.clone(),
                kind: first.kind,
                message: first.message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for DiagnosticSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for DiagnosticSet {}

impl IntoIterator for DiagnosticSet {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_and_warnings_are_separated() {
        let mut set = DiagnosticSet::new();
        set.warning("Bonk", DiagnosticKind::UnusedMember, "method `setFoo` is unused");
        set.error("Bonk", DiagnosticKind::MalformedTag, "field `x` has id 0");

        assert_eq!(set.len(), 2);
        assert_eq!(set.errors().len(), 1);
        assert_eq!(set.warnings().len(), 1);
        assert!(set.has_errors());
        assert!(set.contains(DiagnosticKind::MalformedTag));
        assert!(!set.contains(DiagnosticKind::CycleResolution));
    }

    #[test]
    fn test_escalate_reports_first_error() {
        let mut set = DiagnosticSet::new();
        set.warning("Bonk", DiagnosticKind::UnusedMember, "ignored");
        set.error("Bonk", DiagnosticKind::FieldWiring, "field 2 is not fully wired");
        set.error("Bonk", DiagnosticKind::DuplicateField, "second");

        let err = set.escalate().unwrap_err();
        match err {
            Error::Metadata { kind, message, .. } => {
                assert_eq!(kind, DiagnosticKind::FieldWiring);
                assert_eq!(message, "field 2 is not fully wired");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_warnings_do_not_escalate() {
        let mut set = DiagnosticSet::new();
        set.warning("Bonk", DiagnosticKind::UnusedMember, "ignored");
        assert!(set.escalate().is_ok());
        assert!(!set.has_errors());
    }

    #[test]
    fn test_display() {
        let mut set = DiagnosticSet::new();
        set.error("Node", DiagnosticKind::UnknownType, "no class named 'Leaf'");
        assert_eq!(
            set.to_string(),
            "error: unknown type in 'Node': no class named 'Leaf'"
        );
    }
}
