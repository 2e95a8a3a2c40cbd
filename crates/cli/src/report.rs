//! Operator-facing summaries of analysis and extraction runs.

use tapestry_ingest::ExtractionReport;
use tapestry_rules::engine::SkipCause;
use tapestry_rules::RunReport;

pub fn analysis_lines(report: &RunReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Rules executed: {}, failed: {}, skipped: {}",
        report.executed.len(),
        report.failures.len(),
        report.skipped.len()
    )];
    for skipped in &report.skipped {
        let why = match &skipped.cause {
            SkipCause::PlaceholderUnresolved { missing } => {
                format!("missing fields: {}", missing.join(", "))
            }
            SkipCause::Denied { reason } => reason.clone(),
        };
        lines.push(format!("  skipped rule {} ({why})", skipped.code));
    }
    lines
}

pub fn extraction_lines(report: &ExtractionReport) -> Vec<String> {
    let mut lines = vec![
        format!("Columns: {}", report.columns.len()),
        format!(
            "Databases exported: {}, rows exported: {}",
            report.databases_exported, report.rows_exported
        ),
    ];
    if report.rows_skipped > 0 || report.files_skipped > 0 {
        lines.push(format!(
            "Skipped {} malformed rows and {} unreadable files",
            report.rows_skipped, report.files_skipped
        ));
    }
    match &report.combined_path {
        Some(path) => lines.push(format!("Combined log: {}", path.display())),
        None => lines.push("No databases exported, combined log not written".to_string()),
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tapestry_rules::engine::SkippedRule;

    #[test]
    fn analysis_lines_explain_skips() {
        let mut report = RunReport::new("/logs/tapestry_logs.csv");
        report.executed.push("001101".into());
        report.skipped.push(SkippedRule {
            code: "001102".into(),
            cause: SkipCause::PlaceholderUnresolved {
                missing: vec!["Src IP".into(), "Action".into()],
            },
        });
        let lines = analysis_lines(&report);
        assert_eq!(lines[0], "Rules executed: 1, failed: 0, skipped: 1");
        assert_eq!(lines[1], "  skipped rule 001102 (missing fields: Src IP, Action)");
    }

    #[test]
    fn extraction_lines_mention_skips_only_when_present() {
        let mut report = ExtractionReport {
            columns: vec!["a".into()],
            databases_exported: 1,
            rows_exported: 3,
            combined_path: Some(PathBuf::from("/out/tapestry_logs.csv")),
            ..Default::default()
        };
        assert_eq!(extraction_lines(&report).len(), 3);
        report.files_skipped = 1;
        let lines = extraction_lines(&report);
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("1 unreadable files"));
    }
}
