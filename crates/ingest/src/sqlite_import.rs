use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ExtractError, Result};

/// One JSON object per row, as stored in the first column of the table.
pub type JsonDocument = Map<String, Value>;

/// A row whose payload could not be read as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    /// 1-based row number in query order.
    pub row: usize,
    pub reason: String,
}

/// Row counts for one pass over a database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub rows: usize,
    pub malformed: Vec<MalformedRow>,
}

/// Reads the JSON payload column of an exported firewall event database.
pub struct SqliteImporter;

impl SqliteImporter {
    /// Table names are spliced into SQL, so only `[A-Za-z0-9_]` is accepted.
    pub fn validate_table(table: &str) -> Result<()> {
        let valid = !table.is_empty()
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(())
        } else {
            Err(ExtractError::InvalidTable(table.to_string()))
        }
    }

    /// Call `f` for every row of `table` whose first column is a JSON object.
    ///
    /// Rows that are not JSON objects are skipped and reported in the returned
    /// stats. Failing to open or query the file is an error for the whole file.
    pub fn for_each_document<F>(path: &Path, table: &str, mut f: F) -> Result<ImportStats>
    where
        F: FnMut(JsonDocument) -> Result<()>,
    {
        Self::validate_table(table)?;
        let sqlite_err = |e: rusqlite::Error| ExtractError::Sqlite {
            path: path.to_path_buf(),
            source: e,
        };

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(sqlite_err)?;
        let mut stmt = conn
            .prepare(&format!("SELECT * FROM {table}"))
            .map_err(sqlite_err)?;
        let mut rows = stmt.query([]).map_err(sqlite_err)?;

        let mut stats = ImportStats::default();
        while let Some(row) = rows.next().map_err(sqlite_err)? {
            stats.rows += 1;
            let payload = row.get_ref(0).map_err(sqlite_err)?;
            match parse_document(payload) {
                Ok(doc) => f(doc)?,
                Err(reason) => {
                    warn!(path = %path.display(), row = stats.rows, reason = %reason, "skipping non-JSON row");
                    stats.malformed.push(MalformedRow {
                        row: stats.rows,
                        reason,
                    });
                }
            }
        }
        Ok(stats)
    }
}

fn parse_document(payload: ValueRef<'_>) -> std::result::Result<JsonDocument, String> {
    let bytes = match payload {
        ValueRef::Text(b) | ValueRef::Blob(b) => b,
        ValueRef::Null => return Err("payload is NULL".to_string()),
        ValueRef::Integer(_) | ValueRef::Real(_) => {
            return Err("payload is numeric, expected JSON text".to_string())
        }
    };
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("payload is JSON {}, expected object", json_kind(&other))),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use tempfile::TempDir;

    fn make_db(dir: &TempDir, name: &str, rows: &[Option<&str>]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE tbllog (data TEXT, extra INTEGER);")
            .unwrap();
        for row in rows {
            conn.execute("INSERT INTO tbllog (data, extra) VALUES (?1, 7)", params![row])
                .unwrap();
        }
        path
    }

    #[test]
    fn reads_json_objects_and_skips_the_rest() {
        let dir = TempDir::new().unwrap();
        let path = make_db(
            &dir,
            "a.db",
            &[
                Some(r#"{"a":"1","b":2}"#),
                Some("not json"),
                None,
                Some("[1,2]"),
                Some(r#"{"c":null}"#),
            ],
        );

        let mut docs = Vec::new();
        let stats = SqliteImporter::for_each_document(&path, "tbllog", |doc| {
            docs.push(doc);
            Ok(())
        })
        .unwrap();

        assert_eq!(stats.rows, 5);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["b"], 2);
        let bad_rows: Vec<usize> = stats.malformed.iter().map(|m| m.row).collect();
        assert_eq!(bad_rows, vec![2, 3, 4]);
        assert!(stats.malformed[2].reason.contains("array"));
    }

    #[test]
    fn missing_table_is_file_error() {
        let dir = TempDir::new().unwrap();
        let path = make_db(&dir, "a.db", &[]);
        let err = SqliteImporter::for_each_document(&path, "other", |_| Ok(())).unwrap_err();
        assert!(matches!(err, ExtractError::Sqlite { .. }));
    }

    #[test]
    fn not_a_database_is_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.db");
        std::fs::write(&path, "this is not sqlite at all. ".repeat(40)).unwrap();
        let err = SqliteImporter::for_each_document(&path, "tbllog", |_| Ok(())).unwrap_err();
        assert!(matches!(err, ExtractError::Sqlite { .. }));
    }

    #[test]
    fn table_names_are_restricted() {
        assert!(SqliteImporter::validate_table("tbllog").is_ok());
        assert!(matches!(
            SqliteImporter::validate_table("tbllog; DROP TABLE x"),
            Err(ExtractError::InvalidTable(_))
        ));
        assert!(SqliteImporter::validate_table("").is_err());
    }
}
