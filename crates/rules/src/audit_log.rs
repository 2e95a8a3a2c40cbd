//! Structured audit trail of one rule run.
//!
//! Every engine decision becomes a [`LogEntry`]. Entries are kept in memory in
//! arrival order, capped at a configurable maximum (default 2000, oldest
//! dropped first), and optionally appended as JSON lines to an audit file.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

const DEFAULT_MAX_ENTRIES: usize = 2000;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Step of rule dispatch that produced an entry.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    PlaceholderCheck,
    PolicyCheck,
    OutputRouting,
    Execution,
    Complete,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub rule_code: String,
    pub level: LogLevel,
    pub phase: ExecutionPhase,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

pub struct AuditLog {
    entries: Mutex<VecDeque<LogEntry>>,
    max_entries: usize,
    sink: Option<Mutex<File>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// In-memory trail holding at most `max` entries.
    pub fn with_max_entries(max: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            max_entries: max,
            sink: None,
        }
    }

    /// Also append every entry to `path` (created if missing).
    pub fn persist_to(mut self, path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.sink = Some(Mutex::new(file));
        Ok(self)
    }

    pub fn log(
        &self,
        rule_code: &str,
        level: LogLevel,
        phase: ExecutionPhase,
        message: impl Into<String>,
    ) {
        self.log_with_details(rule_code, level, phase, message, None, None);
    }

    pub fn log_with_details(
        &self,
        rule_code: &str,
        level: LogLevel,
        phase: ExecutionPhase,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
        duration_ms: Option<u64>,
    ) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            rule_code: rule_code.to_string(),
            level,
            phase,
            message: message.into(),
            details,
            duration_ms,
        };
        self.append_to_sink(&entry);

        let mut entries = self.entries.lock().expect("audit_log lock poisoned");
        entries.push_back(entry);
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    fn append_to_sink(&self, entry: &LogEntry) {
        let Some(sink) = &self.sink else {
            return;
        };
        match serde_json::to_string(entry) {
            Ok(line) => {
                let mut file = sink.lock().expect("audit_log sink lock poisoned");
                if let Err(e) = writeln!(file, "{line}") {
                    warn!(error = %e, "failed to write audit entry");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize audit entry"),
        }
    }

    /// Entries for one rule, oldest first.
    #[cfg(test)]
    pub(crate) fn entries_for(&self, rule_code: &str) -> Vec<LogEntry> {
        let entries = self.entries.lock().expect("audit_log lock poisoned");
        entries
            .iter()
            .filter(|e| e.rule_code == rule_code)
            .cloned()
            .collect()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
