use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Resolve a path setting; relative values are anchored at `base`.
fn profiled_env_path(profile: &str, key: &str, base: &Path, default: &str) -> PathBuf {
    let raw = PathBuf::from(profiled_env_or(profile, key, default));
    if raw.is_absolute() {
        raw
    } else {
        base.join(raw)
    }
}

fn profiled_env_list(profile: &str, key: &str) -> Vec<String> {
    profiled_env_opt(profile, key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub analysis: AnalysisConfig,
    pub extraction: ExtractionConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `TAPESTRY_PROFILE`. When set (e.g. `LAB`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    /// Relative paths resolve against the current working directory.
    pub fn from_env() -> Self {
        let profile = env_or("TAPESTRY_PROFILE", "").to_uppercase();
        let base = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::for_profile_in(&profile, &base)
    }

    /// Build config for a named profile with relative paths anchored at `base`.
    pub fn for_profile_in(profile: &str, base: &Path) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            analysis: AnalysisConfig::from_env_profiled(p, base),
            extraction: ExtractionConfig::from_env_profiled(p, base),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:       file={}", self.analysis.rules_file.display());
        tracing::info!("  results:     dir={}", self.analysis.results_dir.display());
        tracing::info!("  log:         file={}", self.analysis.execution_log.display());
        tracing::info!(
            "  audit:       file={}",
            self.analysis
                .audit_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(memory only)".to_string())
        );
        tracing::info!(
            "  policy:      allowed={}",
            if self.analysis.allowed_programs.is_empty() {
                "(any)".to_string()
            } else {
                self.analysis.allowed_programs.join(",")
            }
        );
        tracing::info!("  extraction:  converted_dir={}", self.extraction.converted_dir.display());
    }
}

// ── Analysis ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Flat rule table (`RRRRRR|command`).
    pub rules_file: PathBuf,
    /// Directory receiving `summary_report.txt` / `output_<name>.txt`.
    pub results_dir: PathBuf,
    /// Persistent execution log written by the tracing file layer.
    pub execution_log: PathBuf,
    /// Optional JSON-lines sink for structured audit entries.
    pub audit_file: Option<PathBuf>,
    /// Programs a rule may invoke. Empty allows any program.
    pub allowed_programs: Vec<String>,
    /// File name expected inside the analysed directory.
    pub log_file_name: String,
}

impl AnalysisConfig {
    fn from_env_profiled(p: &str, base: &Path) -> Self {
        Self {
            rules_file: profiled_env_path(p, "TAPESTRY_RULES_FILE", base, "rules.txt"),
            results_dir: profiled_env_path(p, "TAPESTRY_RESULTS_DIR", base, "Tapestry_Results"),
            execution_log: profiled_env_path(
                p,
                "TAPESTRY_EXECUTION_LOG",
                base,
                "tapestry_execution_log.txt",
            ),
            audit_file: profiled_env_opt(p, "TAPESTRY_AUDIT_FILE").map(|v| {
                let raw = PathBuf::from(v);
                if raw.is_absolute() { raw } else { base.join(raw) }
            }),
            allowed_programs: profiled_env_list(p, "TAPESTRY_ALLOWED_PROGRAMS"),
            log_file_name: profiled_env_or(p, "TAPESTRY_LOG_FILE_NAME", "tapestry_logs.csv"),
        }
    }
}

// ── Extraction ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Output directory for per-database CSVs and the combined file.
    pub converted_dir: PathBuf,
    /// Name of the concatenated CSV.
    pub combined_name: String,
    /// Table holding one JSON document per row.
    pub table: String,
}

impl ExtractionConfig {
    fn from_env_profiled(p: &str, base: &Path) -> Self {
        Self {
            converted_dir: profiled_env_path(p, "TAPESTRY_CONVERTED_DIR", base, "converted"),
            combined_name: profiled_env_or(p, "TAPESTRY_LOG_FILE_NAME", "tapestry_logs.csv"),
            table: profiled_env_or(p, "TAPESTRY_EXTRACT_TABLE", "tbllog"),
        }
    }
}
