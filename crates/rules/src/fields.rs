//! Field position resolution from a delimited file's header row.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

/// Column delimiter of target log files.
pub const FIELD_DELIMITER: char = ',';

/// Field name → 1-based column index. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPositions {
    positions: HashMap<String, usize>,
}

impl FieldPositions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build positions from a header line. Names are trimmed, empty names are
    /// skipped and a repeated name keeps its last column.
    pub fn from_header(header: &str) -> Self {
        let header = header.strip_suffix('\n').unwrap_or(header);
        let header = header.strip_suffix('\r').unwrap_or(header);
        let positions = header
            .split(FIELD_DELIMITER)
            .enumerate()
            .filter_map(|(idx, name)| {
                let name = name.trim();
                (!name.is_empty()).then(|| (name.to_string(), idx + 1))
            })
            .collect();
        Self { positions }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Fields sorted by column, for display.
    pub fn by_position(&self) -> Vec<(&str, usize)> {
        let mut fields: Vec<_> = self
            .positions
            .iter()
            .map(|(name, pos)| (name.as_str(), *pos))
            .collect();
        fields.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        fields
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for FieldPositions {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Resolve field positions from the first line of `path`.
///
/// Never fails: a missing, unreadable or empty file yields an empty map.
pub fn resolve_field_positions(path: &Path) -> FieldPositions {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot open log file for field positions");
            return FieldPositions::new();
        }
    };

    let mut header = String::new();
    if let Err(e) = BufReader::new(file).read_line(&mut header) {
        warn!(path = %path.display(), error = %e, "cannot read header row");
        return FieldPositions::new();
    }

    let fields = FieldPositions::from_header(&header);
    if fields.is_empty() {
        warn!(path = %path.display(), "header row yielded no fields");
    } else {
        debug!(path = %path.display(), fields = ?fields.by_position(), "resolved field positions");
    }
    fields
}
