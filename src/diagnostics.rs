//! Editor-facing diagnostics.
//!
//! Converts toolchain errors into language-server shaped records:
//! zero-based line/character ranges with an exclusive end.

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::token::Span;

/// Source tag attached to every diagnostic.
pub const SOURCE: &str = "noteg";

/// Zero-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub code: Option<String>,
    pub source: String,
    pub message: String,
}

fn zero_based(n: usize) -> u32 {
    u32::try_from(n.saturating_sub(1)).unwrap_or(u32::MAX)
}

impl From<Span> for Range {
    fn from(span: Span) -> Self {
        Self {
            start: Position {
                line: zero_based(span.start.line),
                character: zero_based(span.start.column),
            },
            end: Position {
                line: zero_based(span.end.line),
                character: zero_based(span.end.column),
            },
        }
    }
}

impl Diagnostic {
    /// Build an error diagnostic. Errors without a location are reported
    /// at the start of the document.
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        Self {
            range: err.span().map(Range::from).unwrap_or_default(),
            severity: Severity::Error,
            code: Some(err.code().to_string()),
            source: SOURCE.to_string(),
            message: err.message(),
        }
    }
}

/// Lex and parse `source`, reporting the first error if any.
#[must_use]
pub fn check(source: &str) -> Vec<Diagnostic> {
    match crate::parse_str(source) {
        Ok(_) => Vec::new(),
        Err(err) => {
            tracing::debug!(%err, "check found an error");
            vec![Diagnostic::from_error(&err)]
        }
    }
}
