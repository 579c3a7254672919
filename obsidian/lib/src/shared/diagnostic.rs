use std::fmt;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

/// Diagnostic severity levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Note,
    Warning,
    Error,
    Fatal,
}

impl DiagnosticSeverity {
    /// Whether a diagnostic at this level makes the translation unit unusable.
    pub fn is_fatal(&self) -> bool {
        *self >= Self::Error
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        };
        f.write_str(label)
    }
}

/// A source range with 1-based line/column and byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl SourceRange {
    /// Builds the range covered by a tree-sitter node.
    pub fn of(node: Node<'_>) -> Self {
        let start = node.start_position();
        let end = node.end_position();

        Self {
            start_line: start.row.saturating_add(1),
            start_column: start.column.saturating_add(1),
            end_line: end.row.saturating_add(1),
            end_column: end.column.saturating_add(1),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
        }
    }
}

/// A diagnostic reported by the frontend for one translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub range: SourceRange,
    pub severity: DiagnosticSeverity,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.range.start_line, self.range.start_column, self.severity, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_and_fatal_are_fatal() {
        assert!(!DiagnosticSeverity::Note.is_fatal());
        assert!(!DiagnosticSeverity::Warning.is_fatal());
        assert!(DiagnosticSeverity::Error.is_fatal());
        assert!(DiagnosticSeverity::Fatal.is_fatal());
    }

    #[test]
    fn display_includes_position_and_severity() {
        let diagnostic = Diagnostic {
            message: "Missing `;`".to_string(),
            range: SourceRange {
                start_line: 3,
                start_column: 7,
                end_line: 3,
                end_column: 7,
                start_byte: 40,
                end_byte: 40,
            },
            severity: DiagnosticSeverity::Error,
        };

        assert_eq!(diagnostic.to_string(), "3:7: error: Missing `;`");
    }
}
