//! Rule record parsed from one line of the rule table.

use serde::{Deserialize, Serialize};

/// Comment marker for rule table lines.
pub const COMMENT_PREFIX: &str = "//";
/// Separates the rule code from its command template.
pub const CODE_DELIMITER: char = '|';
/// Number of decimal digits in a rule code.
pub const CODE_LEN: usize = 6;

const LOG_TYPE_INDEX: usize = 2;
const ANALYSIS_MODE_INDEX: usize = 3;

/// One entry of the rule table.
///
/// `log_type` and `analysis_mode` are the digits at index 2 and 3 of `code`.
/// They are derived from the code in [`Rule::from_parts`] and never set
/// independently, so they always agree with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub code: String,
    pub log_type: u8,
    pub analysis_mode: u8,
    /// Shell command with `${field}` placeholders and a `{log_file}` token.
    pub command: String,
}

/// Why a rule table line did not produce a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    Comment,
    MissingDelimiter,
    InvalidCode(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Blank => write!(f, "blank line"),
            SkipReason::Comment => write!(f, "comment"),
            SkipReason::MissingDelimiter => write!(f, "missing '{}' delimiter", CODE_DELIMITER),
            SkipReason::InvalidCode(code) => {
                write!(f, "rule code '{}' is not {} decimal digits", code, CODE_LEN)
            }
        }
    }
}

impl Rule {
    /// Build a rule from a code and command, deriving the selector digits.
    /// Returns `None` unless `code` is exactly six ASCII digits.
    pub fn from_parts(code: &str, command: &str) -> Option<Self> {
        if !is_valid_code(code) {
            return None;
        }
        let bytes = code.as_bytes();
        Some(Self {
            code: code.to_string(),
            log_type: bytes[LOG_TYPE_INDEX] - b'0',
            analysis_mode: bytes[ANALYSIS_MODE_INDEX] - b'0',
            command: command.to_string(),
        })
    }

    /// Parse one rule table line.
    ///
    /// The line is trimmed, then split on the first `|`. Everything after the
    /// delimiter (including further `|` characters) is the command template.
    pub fn parse_line(line: &str) -> Result<Self, SkipReason> {
        let line = line.trim();
        if line.is_empty() {
            return Err(SkipReason::Blank);
        }
        if line.starts_with(COMMENT_PREFIX) {
            return Err(SkipReason::Comment);
        }
        let (code, command) = line
            .split_once(CODE_DELIMITER)
            .ok_or(SkipReason::MissingDelimiter)?;
        Self::from_parts(code, command).ok_or_else(|| SkipReason::InvalidCode(code.to_string()))
    }
}

fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}
