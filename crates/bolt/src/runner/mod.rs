//! Process execution layer.
//!
//! - [`ProcessRunner`] is the seam the service talks to; production code uses
//!   [`SystemProcessRunner`], tests use [`crate::testing::ScriptedRunner`].
//! - [`lifecycle`] tracks a child from spawn to exit or kill.

pub mod lifecycle;
pub mod system;

pub use lifecycle::ProcessState;
pub use system::SystemProcessRunner;

use async_trait::async_trait;
use boltdesk_core::{Error, FailureOutput, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Receives output while a run is in progress.
///
/// Callbacks fire synchronously, in pipe arrival order, on the task driving
/// the run.
pub trait OutputSink: Send + Sync {
    /// The rendered bolt command line, once, before the process starts
    fn on_command(&self, _command: &str) {}

    fn on_stdout(&self, _chunk: &str) {}

    fn on_stderr(&self, _chunk: &str) {}
}

/// Per-run overrides of the runner defaults
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub timeout: Option<Duration>,
    pub working_dir: Option<PathBuf>,
}

/// What a finished bolt process produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub success: bool,
    /// Trimmed
    pub stdout: String,
    /// Trimmed
    pub stderr: String,
    pub exit_code: Option<i32>,
    /// Set when the run failed: stderr if any, else an exit code message
    pub error: Option<String>,
}

impl RawOutput {
    /// Build from captured streams; trims both and derives `success` and `error`
    pub fn from_exit(stdout: &str, stderr: &str, exit_code: Option<i32>) -> Self {
        let stdout = stdout.trim().to_string();
        let stderr = stderr.trim().to_string();
        let success = exit_code == Some(0);
        let error = if success {
            None
        } else if !stderr.is_empty() {
            Some(stderr.clone())
        } else {
            Some(match exit_code {
                Some(code) => format!("Command exited with code {code}"),
                None => "Command terminated by signal".to_string(),
            })
        };

        Self {
            success,
            stdout,
            stderr,
            exit_code,
            error,
        }
    }

    /// A successful run that printed `stdout`
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::from_exit(&stdout.into(), "", Some(0))
    }

    pub fn failure_output(&self) -> FailureOutput {
        FailureOutput::new(self.stdout.clone(), self.stderr.clone(), self.exit_code)
    }

    /// The generic execution error for a failed run
    pub fn into_error(self) -> Error {
        let message = self
            .error
            .clone()
            .unwrap_or_else(|| "bolt command failed".to_string());
        Error::execution(message, self.failure_output())
    }
}

/// Trait for running bolt.
///
/// A run that exits non-zero is not an `Err`: it resolves to a `RawOutput`
/// with `success == false`. `Err` means the run could not be completed at all
/// (spawn failure or timeout).
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn execute(
        &self,
        args: &[String],
        options: &ExecOptions,
        sink: Option<&dyn OutputSink>,
    ) -> Result<RawOutput>;
}

/// Render `binary args...` the way a shell user would type it
pub fn render_command_line(binary: &str, args: &[String]) -> String {
    let words = std::iter::once(binary).chain(args.iter().map(String::as_str));
    shlex::try_join(words).unwrap_or_else(|_| {
        std::iter::once(binary.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_exit_success() {
        let raw = RawOutput::from_exit("  {\"items\": []}\n", "\n", Some(0));
        assert!(raw.success);
        assert_eq!(raw.stdout, "{\"items\": []}");
        assert_eq!(raw.error, None);
    }

    #[test]
    fn test_from_exit_prefers_stderr() {
        let raw = RawOutput::from_exit("", "Connection refused\n", Some(1));
        assert!(!raw.success);
        assert_eq!(raw.error.as_deref(), Some("Connection refused"));
    }

    #[test]
    fn test_from_exit_without_stderr() {
        let raw = RawOutput::from_exit("partial", "", Some(2));
        assert_eq!(raw.error.as_deref(), Some("Command exited with code 2"));

        let err = raw.into_error();
        assert!(err.is_generic_execution());
        assert_eq!(err.exit_code(), Some(2));
        assert_eq!(err.failure_output().unwrap().stdout, "partial");
    }

    #[test]
    fn test_render_command_line_quotes() {
        let args = vec![
            "command".to_string(),
            "run".to_string(),
            "ls -la /tmp".to_string(),
            "--targets".to_string(),
            "web-01".to_string(),
        ];
        assert_eq!(
            render_command_line("bolt", &args),
            "bolt command run 'ls -la /tmp' --targets web-01"
        );
    }
}
