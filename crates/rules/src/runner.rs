//! Shell command execution for resolved rule commands.
//!
//! Runs commands via `sh -c` with stdout redirected into the routed result
//! file and stderr captured for diagnostics. Execution blocks until the
//! child exits; there is no timeout.

use std::fs::File;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

/// What a successful command left behind besides its stdout.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Captured standard error (may be non-empty on success).
    pub stderr: String,
    pub duration: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to spawn shell: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("command exited with {}: {}", exit_label(.code), .stderr.trim())]
    Exit { code: Option<i32>, stderr: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "signal".to_string(),
    }
}

/// Seam between the engine and process execution.
pub trait CommandRunner {
    /// Run `command`, writing its stdout to `stdout`.
    /// A non-zero exit is an `Err`.
    fn run(&self, command: &str, stdout: File) -> Result<CommandOutput, RunError>;
}

/// Runs commands through a POSIX shell.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: PathBuf,
    working_dir: Option<PathBuf>,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            shell: PathBuf::from("sh"),
            working_dir: None,
        }
    }

    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, stdout: File) -> Result<CommandOutput, RunError> {
        debug!(shell = %self.shell.display(), command = command, "executing rule command");

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped());
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        let started = Instant::now();
        let output = cmd.output().map_err(RunError::Spawn)?;
        let duration = started.elapsed();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let code = output.status.code();
            debug!(exit_code = ?code, "command returned non-zero exit code");
            return Err(RunError::Exit { code, stderr });
        }

        Ok(CommandOutput { stderr, duration })
    }
}
