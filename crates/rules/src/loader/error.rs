//! Error types and per-line parse results for the rule loader.

use std::path::PathBuf;

use crate::rule::SkipReason;

/// Errors that abort rule loading as a whole.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The rule table is missing or unreadable.
    #[error("rule source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for rule loading.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Outcome of parsing a single rule table line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResult {
    /// 1-based line number in the source.
    pub line: usize,
    pub status: LineStatus,
}

/// Status of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineStatus {
    Loaded { code: String },
    Skipped { reason: SkipReason },
}
