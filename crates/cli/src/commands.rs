//! Analysis and extraction flows shared by subcommands and the menu.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tapestry_core::config::{AnalysisConfig, ExtractionConfig};
use tapestry_core::RuleSelector;
use tapestry_ingest::{ExtractOptions, ExtractionReport, Extractor};
use tapestry_rules::audit_log::AuditLog;
use tapestry_rules::policy::ExecPolicy;
use tapestry_rules::{resolve_field_positions, FieldPositions, OutputMode, RuleEngine, RuleLoader, RunReport};
use tracing::info;

pub const MANUAL: &str = "\
Tapestry rule file
==================

Each non-empty line is either a comment or a rule:

    // comment
    RRRRRR|command

RRRRRR is a six digit rule code. Digit 3 selects the log type and digit 4
the analysis mode; the remaining digits are free for numbering.

    Log type:       1 XGFW Event Logs   2 IIS
                    3 General FW        4 General SSLVPN
    Analysis mode:  1 Generate Summary Report
                    2 Run Rules File

Everything after the first '|' is a shell command. Placeholders:

    {log_file}      the analysed log file, double quoted
    ${Field Name}   1-based position of a header column (XGFW only)

A rule whose placeholders name columns missing from the header is skipped.
Summary report rules write in order to summary_report.txt, which each run
starts fresh. Rules file rules append to output_<log file name>.txt.
";

/// Expand a leading `~` and make the path absolute against the working directory.
pub fn expand_path(raw: &str) -> PathBuf {
    let raw = raw.trim();
    let expanded = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(raw),
        },
        _ => PathBuf::from(raw),
    };
    if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    }
}

/// The combined log file inside `dir`, which must exist.
pub fn locate_log_file(dir: &Path, log_file_name: &str) -> Result<PathBuf> {
    if !dir.is_dir() {
        bail!("invalid directory: {}", dir.display());
    }
    let log_file = dir.join(log_file_name);
    if !log_file.is_file() {
        bail!(
            "required file '{}' not found in {}",
            log_file_name,
            dir.display()
        );
    }
    Ok(log_file)
}

/// Resolve fields, load the applicable rules and run them against `log_file`.
pub fn run_analysis(
    config: &AnalysisConfig,
    selector: RuleSelector,
    log_file: &Path,
) -> Result<RunReport> {
    let fields = if selector.log_type.resolves_field_positions() {
        resolve_field_positions(log_file)
    } else {
        FieldPositions::new()
    };
    info!(fields = fields.len(), log_type = %selector.log_type, "field positions resolved");

    let rules = RuleLoader::new(&config.rules_file)
        .load_rules(&selector)
        .with_context(|| format!("failed to load rules from {}", config.rules_file.display()))?;

    let policy = if config.allowed_programs.is_empty() {
        ExecPolicy::permissive()
    } else {
        ExecPolicy::allow_list(config.allowed_programs.iter().cloned())
    };
    let audit = match &config.audit_file {
        Some(path) => AuditLog::new()
            .persist_to(path)
            .with_context(|| format!("failed to open audit file {}", path.display()))?,
        None => AuditLog::new(),
    };

    let mut engine = RuleEngine::new(&config.results_dir)
        .with_policy(policy)
        .with_audit_log(audit);
    let report = engine
        .execute_rules(&rules, log_file, &fields, OutputMode::from(selector.analysis_mode))
        .context("rule execution aborted")?;
    Ok(report)
}

pub fn run_extraction(config: &ExtractionConfig, input_dir: &Path) -> Result<ExtractionReport> {
    let extractor = Extractor::new(ExtractOptions::from(config))?;
    let report = extractor
        .run(input_dir)
        .with_context(|| format!("extraction from {} failed", input_dir.display()))?;
    Ok(report)
}
