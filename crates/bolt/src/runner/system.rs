//! Runs bolt with `tokio::process`.

use super::lifecycle::ProcessState;
use super::{render_command_line, ExecOptions, OutputSink, ProcessRunner, RawOutput};
use async_trait::async_trait;
use boltdesk_config::BoltConfig;
use boltdesk_core::{Error, FailureOutput, Result};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

const READ_BUFFER_SIZE: usize = 8192;

enum WaitOutcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
}

/// Production runner that spawns the bolt binary
#[derive(Debug, Clone)]
pub struct SystemProcessRunner {
    binary: String,
    project_path: PathBuf,
    default_timeout: Duration,
    termination_grace: Duration,
}

impl SystemProcessRunner {
    pub fn new(
        binary: impl Into<String>,
        project_path: impl Into<PathBuf>,
        default_timeout: Duration,
        termination_grace: Duration,
    ) -> Self {
        Self {
            binary: binary.into(),
            project_path: project_path.into(),
            default_timeout,
            termination_grace,
        }
    }

    pub fn from_config(config: &BoltConfig) -> Self {
        Self::new(
            config.binary.clone(),
            config.project_path.clone(),
            config.execution_timeout,
            config.termination_grace,
        )
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Ask the child to stop, then kill it if it is still alive after the
    /// grace period. Escalation happens in the background so the caller sees
    /// the timeout immediately.
    fn terminate(&self, mut child: Child, state: ProcessState) {
        let pid = child.id();
        let state = state.advance(ProcessState::Terminating, pid);
        send_sigterm(&mut child);

        let grace = self.termination_grace;
        tokio::spawn(async move {
            match tokio::time::timeout(grace, child.wait()).await {
                Ok(_) => {
                    state.advance(ProcessState::Exited, pid);
                    debug!(pid = ?pid, "bolt process exited after SIGTERM");
                }
                Err(_) => {
                    warn!(
                        pid = ?pid,
                        grace_ms = grace.as_millis() as u64,
                        "bolt process ignored SIGTERM; killing"
                    );
                    if let Err(e) = child.kill().await {
                        warn!(pid = ?pid, error = %e, "failed to kill bolt process");
                    }
                    state.advance(ProcessState::Killed, pid);
                }
            }
        });
    }
}

#[cfg(unix)]
fn send_sigterm(child: &mut Child) {
    match child.id() {
        Some(pid) => {
            // SAFETY: kill(2) has no memory-safety preconditions; the pid is
            // our own child, which has not been reaped yet.
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc != 0 {
                warn!(pid, error = %std::io::Error::last_os_error(), "failed to send SIGTERM");
            }
        }
        None => debug!("bolt process already reaped; nothing to terminate"),
    }
}

#[cfg(not(unix))]
fn send_sigterm(child: &mut Child) {
    // No graceful signal available; the forced kill is the only option.
    if let Err(e) = child.start_kill() {
        warn!(error = %e, "failed to stop bolt process");
    }
}

/// Turns pipe reads into text for an [`OutputSink`].
///
/// A multi-byte character split across two reads is held back until the rest
/// of it arrives, so the sink never sees half a character.
#[derive(Debug, Default)]
struct ChunkDecoder {
    pending: Vec<u8>,
}

impl ChunkDecoder {
    fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let complete = self.pending.len() - incomplete_tail(&self.pending);
        let text = String::from_utf8_lossy(&self.pending[..complete]).into_owned();
        self.pending.drain(..complete);
        text
    }

    /// Whatever is still held back once the stream has ended
    fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// Length of a UTF-8 sequence at the end of `bytes` that is missing its
/// trailing bytes
fn incomplete_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(4) {
        let byte = bytes[bytes.len() - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { back } else { 0 };
    }
    0
}

fn forward(sink: Option<&dyn OutputSink>, text: &str, stderr: bool) {
    match sink {
        Some(sink) if !text.is_empty() => {
            if stderr {
                sink.on_stderr(text);
            } else {
                sink.on_stdout(text);
            }
        }
        _ => {}
    }
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn execute(
        &self,
        args: &[String],
        options: &ExecOptions,
        sink: Option<&dyn OutputSink>,
    ) -> Result<RawOutput> {
        let timeout = options.timeout.unwrap_or(self.default_timeout);
        let working_dir = options
            .working_dir
            .clone()
            .unwrap_or_else(|| self.project_path.clone());

        let command_line = render_command_line(&self.binary, args);
        if let Some(sink) = sink {
            sink.on_command(&command_line);
        }
        debug!(
            command = %command_line,
            cwd = %working_dir.display(),
            timeout_ms = timeout.as_millis() as u64,
            "spawning bolt"
        );

        let mut child = Command::new(&self.binary)
            .args(args)
            .current_dir(&working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::execution(
                    format!("failed to execute '{}': {e}", self.binary),
                    FailureOutput::default(),
                )
            })?;

        let pid = child.id();
        let mut state = ProcessState::Spawned.advance(ProcessState::Running, pid);

        let (mut stdout, mut stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(out), Some(err)) => (out, err),
            _ => {
                return Err(Error::execution(
                    "failed to capture bolt output pipes",
                    FailureOutput::default(),
                ));
            }
        };

        let mut stdout_acc: Vec<u8> = Vec::new();
        let mut stderr_acc: Vec<u8> = Vec::new();
        let mut stdout_buf = [0u8; READ_BUFFER_SIZE];
        let mut stderr_buf = [0u8; READ_BUFFER_SIZE];
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut stdout_text = ChunkDecoder::default();
        let mut stderr_text = ChunkDecoder::default();

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let outcome = loop {
            tokio::select! {
                read = stdout.read(&mut stdout_buf), if stdout_open => match read {
                    Ok(0) => {
                        stdout_open = false;
                        forward(sink, &stdout_text.finish(), false);
                    }
                    Ok(n) => {
                        stdout_acc.extend_from_slice(&stdout_buf[..n]);
                        forward(sink, &stdout_text.decode(&stdout_buf[..n]), false);
                    }
                    Err(e) => {
                        warn!(pid = ?pid, error = %e, "failed reading bolt stdout");
                        stdout_open = false;
                    }
                },
                read = stderr.read(&mut stderr_buf), if stderr_open => match read {
                    Ok(0) => {
                        stderr_open = false;
                        forward(sink, &stderr_text.finish(), true);
                    }
                    Ok(n) => {
                        stderr_acc.extend_from_slice(&stderr_buf[..n]);
                        forward(sink, &stderr_text.decode(&stderr_buf[..n]), true);
                    }
                    Err(e) => {
                        warn!(pid = ?pid, error = %e, "failed reading bolt stderr");
                        stderr_open = false;
                    }
                },
                status = child.wait(), if !stdout_open && !stderr_open => {
                    break WaitOutcome::Exited(status);
                }
                _ = &mut deadline => break WaitOutcome::TimedOut,
            }
        };

        let partial = || {
            FailureOutput::new(
                String::from_utf8_lossy(&stdout_acc).trim(),
                String::from_utf8_lossy(&stderr_acc).trim(),
                None,
            )
        };

        match outcome {
            WaitOutcome::Exited(Ok(status)) => {
                state.advance(ProcessState::Exited, pid);
                let raw = RawOutput::from_exit(
                    &String::from_utf8_lossy(&stdout_acc),
                    &String::from_utf8_lossy(&stderr_acc),
                    status.code(),
                );
                debug!(
                    pid = ?pid,
                    exit_code = ?raw.exit_code,
                    success = raw.success,
                    "bolt process exited"
                );
                Ok(raw)
            }
            WaitOutcome::Exited(Err(e)) => Err(Error::execution(
                format!("failed waiting for '{}': {e}", self.binary),
                partial(),
            )),
            WaitOutcome::TimedOut => {
                state = state.advance(ProcessState::TimedOut, pid);
                warn!(
                    pid = ?pid,
                    timeout_ms = timeout.as_millis() as u64,
                    command = %command_line,
                    "bolt execution timed out"
                );
                let output = partial();
                self.terminate(child, state);
                Err(Error::timeout(timeout, output))
            }
        }
    }
}
