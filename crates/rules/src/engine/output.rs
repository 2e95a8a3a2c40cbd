//! Result file routing: one shared summary file or one file per target.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tapestry_core::AnalysisMode;

/// Shared result file used in summary mode.
pub const SUMMARY_FILE_NAME: &str = "summary_report.txt";

/// Where rule stdout is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// All rules of the run share `summary_report.txt`, truncated once.
    Summary,
    /// Each target gets `output_<basename>.txt`, always appended.
    PerTarget,
}

impl OutputMode {
    pub fn from_summary_flag(is_summary: bool) -> Self {
        if is_summary {
            OutputMode::Summary
        } else {
            OutputMode::PerTarget
        }
    }
}

impl From<AnalysisMode> for OutputMode {
    fn from(mode: AnalysisMode) -> Self {
        Self::from_summary_flag(mode.is_summary())
    }
}

/// `output_<basename>.txt` for a target file.
pub fn per_target_file_name(target: &Path) -> String {
    let base = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("output_{}.txt", base)
}

/// Opens result files with the right truncate/append mode.
///
/// Holds the summary "first write" flag, so it lives exactly as long as one
/// engine run and is never persisted.
#[derive(Debug)]
pub struct OutputRouter {
    results_dir: PathBuf,
    summary_started: bool,
}

impl OutputRouter {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            summary_started: false,
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Whether the summary file has already been truncated in this run.
    pub fn summary_started(&self) -> bool {
        self.summary_started
    }

    pub fn path_for(&self, mode: OutputMode, target: &Path) -> PathBuf {
        match mode {
            OutputMode::Summary => self.results_dir.join(SUMMARY_FILE_NAME),
            OutputMode::PerTarget => self.results_dir.join(per_target_file_name(target)),
        }
    }

    /// Open the result file for the next rule. Returns the path and whether
    /// the open truncated it.
    pub fn open(&mut self, mode: OutputMode, target: &Path) -> std::io::Result<(PathBuf, File, bool)> {
        let path = self.path_for(mode, target);
        let truncate = mode == OutputMode::Summary && !self.summary_started;

        let mut options = OpenOptions::new();
        options.create(true);
        if truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let file = options.open(&path)?;

        if mode == OutputMode::Summary {
            self.summary_started = true;
        }
        Ok((path, file, truncate))
    }
}
