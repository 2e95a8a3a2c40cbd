//! Core [`RuleLoader`] and [`RuleTable`]: text parsing and selector filtering.

use std::fs;
use std::path::{Path, PathBuf};

use tapestry_core::RuleSelector;
use tracing::{debug, info};

use crate::rule::{Rule, SkipReason};

use super::error::{LineResult, LineStatus, Result, RuleError};

/// Every syntactically valid rule of a rule table, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
    lines: Vec<LineResult>,
}

impl RuleTable {
    /// Parse rule table text. Malformed lines are recorded and dropped, never fatal.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();
        for (idx, line) in text.lines().enumerate() {
            let status = match Rule::parse_line(line) {
                Ok(rule) => {
                    let code = rule.code.clone();
                    table.rules.push(rule);
                    LineStatus::Loaded { code }
                }
                Err(reason) => LineStatus::Skipped { reason },
            };
            table.lines.push(LineResult {
                line: idx + 1,
                status,
            });
        }
        table
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    /// Per-line parse outcomes, including blanks and comments.
    pub fn lines(&self) -> &[LineResult] {
        &self.lines
    }

    /// Lines dropped for being malformed (blank lines and comments excluded).
    pub fn malformed(&self) -> impl Iterator<Item = &LineResult> {
        self.lines.iter().filter(|l| {
            matches!(
                l.status,
                LineStatus::Skipped {
                    reason: SkipReason::MissingDelimiter | SkipReason::InvalidCode(_)
                }
            )
        })
    }

    /// Rules whose code digits match `selector`, original order preserved.
    pub fn select(&self, selector: &RuleSelector) -> Vec<Rule> {
        self.rules
            .iter()
            .filter(|r| selector.matches_digits(r.log_type, r.analysis_mode))
            .cloned()
            .collect()
    }
}

/// Filesystem-backed rule table loader.
pub struct RuleLoader {
    /// Path of the `RRRRRR|command` rule table.
    source: PathBuf,
}

impl RuleLoader {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Read and parse the whole table without filtering.
    pub fn load_table(&self) -> Result<RuleTable> {
        let text = fs::read_to_string(&self.source).map_err(|e| RuleError::SourceUnavailable {
            path: self.source.clone(),
            source: e,
        })?;
        let table = RuleTable::parse(&text);
        for skipped in table.malformed() {
            if let LineStatus::Skipped { ref reason } = skipped.status {
                debug!(
                    path = %self.source.display(),
                    line = skipped.line,
                    reason = %reason,
                    "skipping malformed rule line"
                );
            }
        }
        Ok(table)
    }

    /// Load the rules that apply to `selector`.
    ///
    /// Filtering happens here so the engine only ever sees applicable rules.
    pub fn load_rules(&self, selector: &RuleSelector) -> Result<Vec<Rule>> {
        let table = self.load_table()?;
        let selected = table.select(selector);
        info!(
            path = %self.source.display(),
            total = table.rules().len(),
            selected = selected.len(),
            log_type = selector.log_type.digit(),
            analysis_mode = selector.analysis_mode.digit(),
            "loaded rules"
        );
        Ok(selected)
    }
}
