//! Core [`RuleEngine`]: placeholder resolution, routing and sequential execution.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::audit_log::{AuditLog, ExecutionPhase, LogLevel};
use crate::fields::FieldPositions;
use crate::policy::ExecPolicy;
use crate::rule::Rule;
use crate::runner::{CommandRunner, ShellRunner};
use crate::template::{self, TemplateError};

use super::error::{EngineError, Result};
use super::output::{OutputMode, OutputRouter};
use super::report::{RuleFailure, RunReport, SkipCause, SkippedRule};

/// Executes rules against target files.
///
/// One engine is one run: the summary file is truncated by the first rule
/// routed to it and appended to by every later rule, including rules of
/// later `execute_rules` calls on the same engine.
pub struct RuleEngine<R = ShellRunner> {
    runner: R,
    policy: ExecPolicy,
    audit: AuditLog,
    router: OutputRouter,
}

impl RuleEngine<ShellRunner> {
    /// Engine writing into `results_dir`, running commands through `sh`.
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self::with_runner(results_dir, ShellRunner::new())
    }
}

impl<R: CommandRunner> RuleEngine<R> {
    pub fn with_runner(results_dir: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            runner,
            policy: ExecPolicy::permissive(),
            audit: AuditLog::new(),
            router: OutputRouter::new(results_dir),
        }
    }

    pub fn with_policy(mut self, policy: ExecPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn results_dir(&self) -> &Path {
        self.router.results_dir()
    }

    /// Run `rules` in order against `target`.
    ///
    /// A missing target runs nothing and creates nothing. Failing to create
    /// the results directory or open a result file aborts the call; rule
    /// level problems are recorded in the report and skipped.
    pub fn execute_rules(
        &mut self,
        rules: &[Rule],
        target: &Path,
        fields: &FieldPositions,
        mode: OutputMode,
    ) -> Result<RunReport> {
        let mut report = RunReport::new(target);

        if !target.is_file() {
            warn!(target = %target.display(), "target log file does not exist, no rules run");
            report.target_missing = true;
            return Ok(report);
        }

        let quoted_target = template::quote_path(target)
            .ok_or_else(|| EngineError::UnsafeTargetPath(target.to_path_buf()))?;

        let results_dir = self.router.results_dir().to_path_buf();
        fs::create_dir_all(&results_dir).map_err(|e| EngineError::DirectoryCreate {
            path: results_dir.clone(),
            source: e,
        })?;

        for rule in rules {
            self.execute_rule(rule, target, &quoted_target, fields, mode, &mut report)?;
        }

        info!(
            target = %target.display(),
            executed = report.executed.len(),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            "rule run complete"
        );
        Ok(report)
    }

    fn execute_rule(
        &mut self,
        rule: &Rule,
        target: &Path,
        quoted_target: &str,
        fields: &FieldPositions,
        mode: OutputMode,
        report: &mut RunReport,
    ) -> Result<()> {
        let command = match template::resolve(&rule.command, fields, quoted_target) {
            Ok(c) => c,
            Err(TemplateError::Unresolved { missing }) => {
                warn!(
                    rule = %rule.code,
                    "Skipping rule {} due to missing fields: {}",
                    rule.code,
                    missing.join(", ")
                );
                self.audit.log_with_details(
                    &rule.code,
                    LogLevel::Warning,
                    ExecutionPhase::PlaceholderCheck,
                    "skipped: unresolved placeholders",
                    Some(serde_json::json!({ "missing": missing })),
                    None,
                );
                report.skipped.push(SkippedRule {
                    code: rule.code.clone(),
                    cause: SkipCause::PlaceholderUnresolved { missing },
                });
                return Ok(());
            }
        };

        if let Err(e) = self.policy.check(&command) {
            warn!(rule = %rule.code, command = %command, reason = %e, "rule command denied");
            self.audit.log_with_details(
                &rule.code,
                LogLevel::Warning,
                ExecutionPhase::PolicyCheck,
                format!("skipped: {e}"),
                Some(serde_json::json!({ "command": command })),
                None,
            );
            report.skipped.push(SkippedRule {
                code: rule.code.clone(),
                cause: SkipCause::Denied {
                    reason: e.to_string(),
                },
            });
            return Ok(());
        }

        let (output_path, file, truncated) =
            self.router
                .open(mode, target)
                .map_err(|e| EngineError::OutputOpen {
                    path: self.router.path_for(mode, target),
                    source: e,
                })?;
        self.audit.log(
            &rule.code,
            LogLevel::Debug,
            ExecutionPhase::OutputRouting,
            format!(
                "{} {}",
                if truncated { "truncated" } else { "appending to" },
                output_path.display()
            ),
        );
        report.output_path = Some(output_path);

        info!(
            "Executing rule {} on file {}: {}",
            rule.code,
            target.display(),
            command
        );
        self.audit.log_with_details(
            &rule.code,
            LogLevel::Info,
            ExecutionPhase::Execution,
            "executing",
            Some(serde_json::json!({
                "target": target.display().to_string(),
                "command": command,
            })),
            None,
        );

        match self.runner.run(&command, file) {
            Ok(output) => {
                self.audit.log_with_details(
                    &rule.code,
                    LogLevel::Info,
                    ExecutionPhase::Complete,
                    "completed",
                    (!output.stderr.is_empty())
                        .then(|| serde_json::json!({ "stderr": output.stderr })),
                    Some(output.duration.as_millis() as u64),
                );
                report.executed.push(rule.code.clone());
            }
            Err(e) => {
                error!(
                    "Error executing rule {} on file {}: {}",
                    rule.code,
                    target.display(),
                    e
                );
                self.audit.log(
                    &rule.code,
                    LogLevel::Error,
                    ExecutionPhase::Execution,
                    e.to_string(),
                );
                report.failures.push(RuleFailure {
                    code: rule.code.clone(),
                    message: e.to_string(),
                });
            }
        }
        Ok(())
    }
}
