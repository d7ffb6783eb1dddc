//! Per-file diagnostics reported by the scanner, parser, and driver.

use std::fmt;

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

/// A single problem found while compiling one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub file: String,
    pub span: Span,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            file: file.into(),
            span,
            message_text: message.into(),
        }
    }

    pub fn warning(file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            file: file.into(),
            span,
            message_text: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = match self.category {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
        };
        write!(
            f,
            "{}:{}: {}: {}",
            self.file, self.span.start, category, self.message_text
        )
    }
}
