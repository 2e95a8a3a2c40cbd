//! Per-run outcome summary returned by the engine.

use std::path::PathBuf;

use serde::Serialize;

/// Why a rule was not executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum SkipCause {
    /// Template references fields absent from the header.
    PlaceholderUnresolved { missing: Vec<String> },
    /// The execution policy refused the resolved command.
    Denied { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRule {
    pub code: String,
    #[serde(flatten)]
    pub cause: SkipCause,
}

/// A rule whose command ran and failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
    pub code: String,
    pub message: String,
}

impl RuleFailure {
    /// Short line for the operator; details go to the execution log.
    pub fn operator_message(&self) -> String {
        format!(
            "Error executing rule {}. Check the log file for details.",
            self.code
        )
    }
}

/// Outcome of one `execute_rules` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub target: PathBuf,
    /// Set once a rule's output was routed somewhere.
    pub output_path: Option<PathBuf>,
    /// True when the target did not exist and nothing ran.
    pub target_missing: bool,
    /// Codes of rules that ran to a zero exit, in order.
    pub executed: Vec<String>,
    pub failures: Vec<RuleFailure>,
    pub skipped: Vec<SkippedRule>,
}

impl RunReport {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Number of rules handed to the runner (successful or not).
    pub fn attempted(&self) -> usize {
        self.executed.len() + self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_message_names_rule() {
        let failure = RuleFailure {
            code: "001201".to_string(),
            message: "command exited with status 1: ".to_string(),
        };
        assert_eq!(
            failure.operator_message(),
            "Error executing rule 001201. Check the log file for details."
        );
    }

    #[test]
    fn skipped_rule_serializes_flat() {
        let skipped = SkippedRule {
            code: "001101".to_string(),
            cause: SkipCause::PlaceholderUnresolved {
                missing: vec!["Src IP".to_string()],
            },
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["code"], "001101");
        assert_eq!(json["cause"], "placeholder_unresolved");
        assert_eq!(json["missing"][0], "Src IP");
    }

    #[test]
    fn attempted_counts_failures() {
        let mut report = RunReport::new("/x.csv");
        report.executed.push("1".into());
        report.failures.push(RuleFailure {
            code: "2".into(),
            message: "boom".into(),
        });
        assert_eq!(report.attempted(), 2);
        assert!(report.has_failures());
    }
}
