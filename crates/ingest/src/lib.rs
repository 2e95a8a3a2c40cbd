//! SQLite → CSV extraction of exported firewall event databases.

pub mod error;
pub mod extract;
pub mod sqlite_import;

pub use error::{ExtractError, Result};
pub use extract::{
    project, Diagnostic, DiagnosticKind, ExportedDatabase, ExtractOptions, ExtractionReport,
    Extractor,
};
pub use sqlite_import::{ImportStats, JsonDocument, MalformedRow, SqliteImporter};
