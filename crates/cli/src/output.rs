use boltdesk_bolt::OutputSink;
use boltdesk_core::ExecutionResult;
use serde::Serialize;
use std::io::Write;
use std::process::ExitCode;

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> eyre::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}

/// Print an execution result; a failed execution exits non-zero
pub fn print_execution(result: &ExecutionResult) -> eyre::Result<ExitCode> {
    print_json(result)?;
    if result.is_failed() {
        tracing::warn!(execution_id = %result.id, error = ?result.error, "execution failed");
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Mirrors bolt's output on stderr as it arrives
pub struct StderrSink;

impl OutputSink for StderrSink {
    fn on_command(&self, command: &str) {
        eprintln!("$ {command}");
    }

    fn on_stdout(&self, chunk: &str) {
        eprint!("{chunk}");
    }

    fn on_stderr(&self, chunk: &str) {
        eprint!("{chunk}");
    }
}
