//! Console and execution-log tracing setup.

use std::path::Path;

use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Console level for a `-v` count. `RUST_LOG` overrides it.
pub fn console_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the console layer and the appending execution log.
///
/// The returned guard flushes the execution log on drop and must be held
/// for the life of the process.
pub fn init(verbose: u8, execution_log: &Path) -> anyhow::Result<WorkerGuard> {
    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level(verbose).into())
        .from_env_lossy();
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let dir = execution_log
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = execution_log
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("execution log path has no file name: {}", execution_log.display()))?;
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer)
        .with_filter(LevelFilter::INFO);

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()?;
    Ok(guard)
}

/// Record a failed command in the execution log before it leaves `main`.
pub fn log_failure<T>(result: anyhow::Result<T>) -> anyhow::Result<T> {
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "command failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failures_are_logged_with_context_chain() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let result: anyhow::Result<()> = tracing::subscriber::with_default(subscriber, || {
            let failing = Err::<(), _>(anyhow::anyhow!("No such file or directory"))
                .context("failed to load rules from /tmp/nope.txt");
            log_failure(failing)
        });

        assert!(result.is_err());
        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("ERROR"));
        assert!(text.contains("command failed"));
        assert!(text.contains("failed to load rules from /tmp/nope.txt: No such file or directory"));
    }

    #[test]
    fn success_passes_through() {
        assert_eq!(log_failure(Ok::<_, anyhow::Error>(7)).unwrap(), 7);
    }

    #[test]
    fn verbosity_raises_console_level() {
        assert_eq!(console_level(0), LevelFilter::WARN);
        assert_eq!(console_level(1), LevelFilter::INFO);
        assert_eq!(console_level(2), LevelFilter::DEBUG);
        assert_eq!(console_level(9), LevelFilter::TRACE);
    }
}
