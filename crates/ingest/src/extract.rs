//! Three-pass SQLite → CSV extraction.
//!
//! 1. Union the JSON keys of every database into one sorted header.
//! 2. Project each database's rows onto that header as `<stem>.csv`
//!    (suffixed when the name would clash with the combined file).
//! 3. Concatenate the per-database CSVs into the combined log file.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tapestry_core::config::ExtractionConfig;
use tracing::{debug, info, warn};

use crate::error::{ExtractError, Result};
use crate::sqlite_import::{JsonDocument, SqliteImporter};

const DB_EXTENSION: &str = "db";

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub converted_dir: PathBuf,
    pub combined_name: String,
    pub table: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            converted_dir: PathBuf::from("converted"),
            combined_name: "tapestry_logs.csv".to_string(),
            table: "tbllog".to_string(),
        }
    }
}

impl From<&ExtractionConfig> for ExtractOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            converted_dir: config.converted_dir.clone(),
            combined_name: config.combined_name.clone(),
            table: config.table.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MalformedRow,
    MalformedFile,
}

/// A row or file that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    /// 1-based row number, `None` for whole-file problems.
    pub row: Option<usize>,
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    pub columns: Vec<String>,
    pub databases_exported: usize,
    pub rows_exported: usize,
    pub rows_skipped: usize,
    pub files_skipped: usize,
    /// `None` when no per-database CSV was produced.
    pub combined_path: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of projecting one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDatabase {
    pub csv_path: PathBuf,
    pub rows: usize,
}

pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    pub fn new(options: ExtractOptions) -> Result<Self> {
        SqliteImporter::validate_table(&options.table)?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn combined_path(&self) -> PathBuf {
        self.options.converted_dir.join(&self.options.combined_name)
    }

    /// `*.db` files directly inside `input_dir`, sorted by name.
    pub fn discover(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        if !input_dir.is_dir() {
            return Err(ExtractError::MissingDirectory(input_dir.to_path_buf()));
        }
        let io_err = |e| ExtractError::Io {
            path: input_dir.to_path_buf(),
            source: e,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(input_dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_db = path.extension().and_then(|e| e.to_str()) == Some(DB_EXTENSION);
            if is_db && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Pass 1: union of keys over every valid row of every database.
    ///
    /// Files that cannot be read are recorded in `diagnostics` and added to
    /// `skipped_files` so pass 2 can avoid them.
    pub fn collect_columns(
        &self,
        databases: &[PathBuf],
        diagnostics: &mut Vec<Diagnostic>,
        skipped_files: &mut HashSet<PathBuf>,
    ) -> BTreeSet<String> {
        let mut columns = BTreeSet::new();
        let total = databases.len();
        for (i, db) in databases.iter().enumerate() {
            info!("[{}/{}] scanning columns in {}", i + 1, total, db.display());
            let result = SqliteImporter::for_each_document(db, &self.options.table, |doc| {
                columns.extend(doc.keys().cloned());
                Ok(())
            });
            match result {
                Ok(stats) => {
                    for bad in stats.malformed {
                        diagnostics.push(Diagnostic {
                            file: db.clone(),
                            row: Some(bad.row),
                            kind: DiagnosticKind::MalformedRow,
                            message: bad.reason,
                        });
                    }
                }
                Err(e) => {
                    warn!(file = %db.display(), error = %e, "skipping unreadable database");
                    diagnostics.push(Diagnostic {
                        file: db.clone(),
                        row: None,
                        kind: DiagnosticKind::MalformedFile,
                        message: e.to_string(),
                    });
                    skipped_files.insert(db.clone());
                }
            }
        }
        debug!(columns = columns.len(), "column union complete");
        columns
    }

    /// Per-database CSV paths, `<stem>.csv` unless that name is the combined
    /// file or already taken, then `<stem>_1.csv`, `<stem>_2.csv`, ...
    pub fn csv_paths(&self, databases: &[PathBuf]) -> Vec<PathBuf> {
        let mut taken: HashSet<PathBuf> = HashSet::from([self.combined_path()]);
        databases
            .iter()
            .map(|db| {
                let stem = db
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "database".to_string());
                let mut candidate = self.options.converted_dir.join(format!("{stem}.csv"));
                let mut n = 1;
                while taken.contains(&candidate) {
                    candidate = self.options.converted_dir.join(format!("{stem}_{n}.csv"));
                    n += 1;
                }
                taken.insert(candidate.clone());
                candidate
            })
            .collect()
    }

    /// Pass 2: write `db`'s rows to `csv_path` with `columns` as header.
    ///
    /// Malformed rows were already reported by pass 1 and are dropped silently.
    pub fn export_database(
        &self,
        db: &Path,
        csv_path: &Path,
        columns: &[String],
    ) -> Result<ExportedDatabase> {
        let csv_path = csv_path.to_path_buf();
        let csv_err = |e: csv::Error| ExtractError::Csv {
            path: csv_path.clone(),
            source: e,
        };

        let mut writer = csv::Writer::from_path(&csv_path).map_err(csv_err)?;
        writer.write_record(columns).map_err(csv_err)?;

        let mut rows = 0usize;
        SqliteImporter::for_each_document(db, &self.options.table, |doc| {
            writer.write_record(project(&doc, columns)).map_err(csv_err)?;
            rows += 1;
            Ok(())
        })?;
        writer.flush().map_err(|e| ExtractError::Io {
            path: csv_path.clone(),
            source: e,
        })?;

        Ok(ExportedDatabase { csv_path, rows })
    }

    /// Pass 3: merge `csv_files` in order, taking the header from the first.
    pub fn concatenate(&self, csv_files: &[PathBuf]) -> Result<PathBuf> {
        let combined = self.combined_path();
        let out_err = |e: csv::Error| ExtractError::Csv {
            path: combined.clone(),
            source: e,
        };
        let mut writer = csv::Writer::from_path(&combined).map_err(out_err)?;

        for (i, path) in csv_files.iter().enumerate() {
            let in_err = |e: csv::Error| ExtractError::Csv {
                path: path.clone(),
                source: e,
            };
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .from_path(path)
                .map_err(in_err)?;
            if i == 0 {
                let header = reader.byte_headers().map_err(in_err)?.clone();
                writer.write_byte_record(&header).map_err(out_err)?;
            }
            for record in reader.byte_records() {
                writer
                    .write_byte_record(&record.map_err(in_err)?)
                    .map_err(out_err)?;
            }
        }
        writer.flush().map_err(|e| ExtractError::Io {
            path: combined.clone(),
            source: e,
        })?;
        Ok(combined)
    }

    /// Run all three passes over the databases in `input_dir`.
    pub fn run(&self, input_dir: &Path) -> Result<ExtractionReport> {
        let databases = self.discover(input_dir)?;
        let converted = &self.options.converted_dir;
        fs::create_dir_all(converted).map_err(|e| ExtractError::Io {
            path: converted.clone(),
            source: e,
        })?;

        info!(
            databases = databases.len(),
            input = %input_dir.display(),
            "starting extraction"
        );

        let mut report = ExtractionReport::default();
        let mut skipped = HashSet::new();
        let columns: Vec<String> = self
            .collect_columns(&databases, &mut report.diagnostics, &mut skipped)
            .into_iter()
            .collect();
        report.columns = columns.clone();

        let mut exported = Vec::new();
        let remaining: Vec<PathBuf> = databases
            .iter()
            .filter(|d| !skipped.contains(*d))
            .cloned()
            .collect();
        let targets = self.csv_paths(&remaining);
        let total = remaining.len();
        for (i, (db, csv_path)) in remaining.iter().zip(&targets).enumerate() {
            info!("[{}/{}] exporting {}", i + 1, total, db.display());
            match self.export_database(db, csv_path, &columns) {
                Ok(out) => {
                    report.rows_exported += out.rows;
                    report.databases_exported += 1;
                    exported.push(out.csv_path);
                }
                Err(e) => {
                    warn!(file = %db.display(), error = %e, "export failed");
                    report.diagnostics.push(Diagnostic {
                        file: db.clone(),
                        row: None,
                        kind: DiagnosticKind::MalformedFile,
                        message: e.to_string(),
                    });
                    skipped.insert(db.clone());
                }
            }
        }

        let combined = self.combined_path();
        exported.retain(|p| *p != combined);
        exported.sort();
        if !exported.is_empty() {
            report.combined_path = Some(self.concatenate(&exported)?);
        }

        report.files_skipped = skipped.len();
        report.rows_skipped = report
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::MalformedRow)
            .count();

        info!(
            columns = report.columns.len(),
            databases = report.databases_exported,
            rows = report.rows_exported,
            rows_skipped = report.rows_skipped,
            files_skipped = report.files_skipped,
            "extraction complete"
        );
        Ok(report)
    }
}

/// One CSV row: absent and null are empty, strings verbatim, the rest compact JSON.
pub fn project(doc: &JsonDocument, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| match doc.get(c) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: Value) -> JsonDocument {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn project_renders_cells() {
        let columns: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let row = project(
            &doc(json!({"a": "x,y", "b": null, "c": 3, "d": {"k": [1, true]}})),
            &columns,
        );
        assert_eq!(row, vec!["x,y", "", "3", r#"{"k":[1,true]}"#, ""]);
    }

    #[test]
    fn missing_input_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let extractor = Extractor::new(ExtractOptions {
            converted_dir: dir.path().join("converted"),
            ..Default::default()
        })
        .unwrap();
        let err = extractor.run(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ExtractError::MissingDirectory(_)));
        assert!(!dir.path().join("converted").exists());
    }

    #[test]
    fn discover_only_db_files_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["b.db", "a.db", "notes.txt", "c.db-journal"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("d.db")).unwrap();
        let extractor = Extractor::new(ExtractOptions::default()).unwrap();
        let found = extractor.discover(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.db", "b.db"]);
    }

    #[test]
    fn rejects_bad_table_name() {
        let result = Extractor::new(ExtractOptions {
            table: "tbllog--".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ExtractError::InvalidTable(_))));
    }

    #[test]
    fn csv_paths_avoid_the_combined_file() {
        let extractor = Extractor::new(ExtractOptions {
            converted_dir: PathBuf::from("/out"),
            ..Default::default()
        })
        .unwrap();
        let dbs = vec![
            PathBuf::from("/in/a.db"),
            PathBuf::from("/in/tapestry_logs.db"),
            PathBuf::from("/in/tapestry_logs_1.db"),
        ];
        assert_eq!(
            extractor.csv_paths(&dbs),
            vec![
                PathBuf::from("/out/a.csv"),
                PathBuf::from("/out/tapestry_logs_1.csv"),
                PathBuf::from("/out/tapestry_logs_1_1.csv"),
            ]
        );
    }

    #[test]
    fn concatenate_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        fs::write(&a, "x,y\n1,2\n").unwrap();
        fs::write(&b, "x,y\n3,\"4,5\"\n").unwrap();
        let extractor = Extractor::new(ExtractOptions {
            converted_dir: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        let combined = extractor.concatenate(&[a, b]).unwrap();
        assert_eq!(
            fs::read_to_string(combined).unwrap(),
            "x,y\n1,2\n3,\"4,5\"\n"
        );
    }
}
