//! Full extraction over SQLite files created in a temp dir.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tapestry_ingest::{DiagnosticKind, ExtractOptions, Extractor};
use tempfile::TempDir;

fn make_db(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE tbllog (data TEXT);").unwrap();
    for row in rows {
        conn.execute("INSERT INTO tbllog (data) VALUES (?1)", params![row])
            .unwrap();
    }
    path
}

fn extractor(out: &Path) -> Extractor {
    Extractor::new(ExtractOptions {
        converted_dir: out.to_path_buf(),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn builds_superset_header_and_combined_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input");
    let out = dir.path().join("converted");
    fs::create_dir(&input).unwrap();
    make_db(&input, "second.db", &[r#"{"b":"2","c":"3"}"#]);
    make_db(&input, "first.db", &[r#"{"a":"1","b":"x"}"#, r#"{"a":"4"}"#]);

    let report = extractor(&out).run(&input).unwrap();

    assert_eq!(report.columns, vec!["a", "b", "c"]);
    assert_eq!(report.databases_exported, 2);
    assert_eq!(report.rows_exported, 3);
    assert_eq!(report.rows_skipped, 0);
    assert_eq!(report.files_skipped, 0);

    assert_eq!(
        fs::read_to_string(out.join("first.csv")).unwrap(),
        "a,b,c\n1,x,\n4,,\n"
    );
    assert_eq!(
        fs::read_to_string(out.join("second.csv")).unwrap(),
        "a,b,c\n,2,3\n"
    );
    let combined = report.combined_path.unwrap();
    assert_eq!(combined, out.join("tapestry_logs.csv"));
    assert_eq!(
        fs::read_to_string(combined).unwrap(),
        "a,b,c\n1,x,\n4,,\n,2,3\n"
    );
}

#[test]
fn malformed_rows_and_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input");
    let out = dir.path().join("converted");
    fs::create_dir(&input).unwrap();
    make_db(&input, "good.db", &[r#"{"k":"v"}"#, "{broken", r#"{"k":null}"#]);
    fs::write(input.join("corrupt.db"), "definitely not a sqlite database file\n".repeat(40)).unwrap();

    let report = extractor(&out).run(&input).unwrap();

    assert_eq!(report.columns, vec!["k"]);
    assert_eq!(report.rows_exported, 2);
    assert_eq!(report.rows_skipped, 1);
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.databases_exported, 1);

    let row_diag = report
        .diagnostics
        .iter()
        .find(|d| d.kind == DiagnosticKind::MalformedRow)
        .unwrap();
    assert_eq!(row_diag.row, Some(2));
    assert!(row_diag.file.ends_with("good.db"));

    assert!(!out.join("corrupt.csv").exists());
    assert_eq!(
        fs::read_to_string(out.join("tapestry_logs.csv")).unwrap(),
        "k\nv\n\"\"\n"
    );
}

#[test]
fn empty_directory_produces_no_combined_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("converted");
    let report = extractor(&out).run(dir.path()).unwrap();
    assert!(report.columns.is_empty());
    assert!(report.combined_path.is_none());
    assert!(!out.join("tapestry_logs.csv").exists());
}

#[test]
fn rerun_ignores_stale_combined_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input");
    let out = dir.path().join("converted");
    fs::create_dir(&input).unwrap();
    make_db(&input, "one.db", &[r#"{"n":1}"#]);

    let ex = extractor(&out);
    ex.run(&input).unwrap();
    let report = ex.run(&input).unwrap();

    assert_eq!(report.rows_exported, 1);
    assert_eq!(
        fs::read_to_string(out.join("tapestry_logs.csv")).unwrap(),
        "n\n1\n"
    );
}

#[test]
fn database_named_like_combined_file_keeps_its_rows() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input");
    let out = dir.path().join("converted");
    fs::create_dir(&input).unwrap();
    make_db(&input, "a.db", &[r#"{"k":"from_a"}"#]);
    make_db(&input, "tapestry_logs.db", &[r#"{"k":"from_tapestry_logs"}"#]);

    let report = extractor(&out).run(&input).unwrap();

    assert_eq!(report.databases_exported, 2);
    assert_eq!(report.rows_exported, 2);
    assert_eq!(
        fs::read_to_string(out.join("tapestry_logs_1.csv")).unwrap(),
        "k\nfrom_tapestry_logs\n"
    );
    assert_eq!(
        fs::read_to_string(out.join("tapestry_logs.csv")).unwrap(),
        "k\nfrom_a\nfrom_tapestry_logs\n"
    );
}
