//! Command template placeholders: `${field}` column references and the
//! `{log_file}` target token.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::fields::FieldPositions;

/// Literal token replaced by the double-quoted target path.
pub const LOG_FILE_TOKEN: &str = "{log_file}";

/// Characters that keep their meaning inside double quotes in `sh`.
const UNSAFE_PATH_CHARS: &[char] = &['"', '`', '$', '\\', '\n', '\r'];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The template names fields that the target header does not have.
    #[error("unresolved placeholders: {}", .missing.join(", "))]
    Unresolved { missing: Vec<String> },
}

/// Field names referenced by `${name}` tokens, first occurrence order, no repeats.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        if let Some(name) = caps.get(1).map(|m| m.as_str()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Placeholders in `template` with no entry in `fields`.
pub fn missing_fields(template: &str, fields: &FieldPositions) -> Vec<String> {
    placeholders(template)
        .into_iter()
        .filter(|name| !fields.contains(name))
        .map(str::to_string)
        .collect()
}

/// Double-quote `path` for the shell, or `None` if it cannot be quoted safely.
pub fn quote_path(path: &Path) -> Option<String> {
    let raw = path.to_str()?;
    if raw.contains(UNSAFE_PATH_CHARS) {
        return None;
    }
    Some(format!("\"{}\"", raw))
}

/// Substitute every placeholder with its column index and `{log_file}` with
/// `quoted_target`. Nothing is substituted unless every placeholder resolves.
pub fn resolve(
    template: &str,
    fields: &FieldPositions,
    quoted_target: &str,
) -> Result<String, TemplateError> {
    let missing = missing_fields(template, fields);
    if !missing.is_empty() {
        return Err(TemplateError::Unresolved { missing });
    }

    let substituted = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        // Every name was checked above.
        fields
            .get(&caps[1])
            .map(|pos| pos.to_string())
            .unwrap_or_default()
    });
    Ok(substituted.replace(LOG_FILE_TOKEN, quoted_target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date_time() -> FieldPositions {
        [("Date", 1), ("Time", 2)].into_iter().collect()
    }

    #[test]
    fn resolves_fields_and_log_file() {
        let quoted = quote_path(Path::new("/tmp/x.csv")).unwrap();
        let cmd = resolve("echo ${Date} ${Time} {log_file}", &date_time(), &quoted).unwrap();
        assert_eq!(cmd, r#"echo 1 2 "/tmp/x.csv""#);
    }

    #[test]
    fn repeated_placeholders_all_replaced() {
        let cmd = resolve("awk -F, '{print $${Date}\",\"$${Date}}' {log_file}", &date_time(), "\"f\"").unwrap();
        assert_eq!(cmd, r#"awk -F, '{print $1","$1}' "f""#);
    }

    #[test]
    fn field_names_may_contain_spaces() {
        let fields: FieldPositions = [("Src IP", 7)].into_iter().collect();
        assert_eq!(placeholders("cut -f${Src IP}"), vec!["Src IP"]);
        assert_eq!(resolve("cut -f${Src IP}", &fields, "\"f\"").unwrap(), "cut -f7");
    }

    #[test]
    fn missing_field_blocks_all_substitution() {
        let err = resolve("echo ${Date} ${Nope} ${Gone} ${Nope}", &date_time(), "\"f\"").unwrap_err();
        assert_eq!(
            err,
            TemplateError::Unresolved {
                missing: vec!["Nope".to_string(), "Gone".to_string()]
            }
        );
        assert_eq!(err.to_string(), "unresolved placeholders: Nope, Gone");
    }

    #[test]
    fn template_without_placeholders_passes_through() {
        let cmd = resolve("wc -l {log_file}", &FieldPositions::new(), "\"a b.csv\"").unwrap();
        assert_eq!(cmd, r#"wc -l "a b.csv""#);
    }

    #[test]
    fn empty_braces_are_not_placeholders() {
        assert!(placeholders("echo ${} $HOME {log_file}").is_empty());
    }

    #[test]
    fn unused_fields_are_irrelevant() {
        let fields: FieldPositions = [("Date", 1), ("Unused", 9)].into_iter().collect();
        assert!(missing_fields("echo ${Date}", &fields).is_empty());
    }

    #[test]
    fn quote_path_rejects_shell_active_characters() {
        assert_eq!(quote_path(Path::new("/tmp/a b.csv")).as_deref(), Some("\"/tmp/a b.csv\""));
        assert_eq!(quote_path(Path::new("/tmp/$(id).csv")), None);
        assert_eq!(quote_path(Path::new("/tmp/a\"b.csv")), None);
        assert_eq!(quote_path(Path::new("/tmp/`x`.csv")), None);
        assert_eq!(quote_path(Path::new("/tmp/a\\b.csv")), None);
    }
}
