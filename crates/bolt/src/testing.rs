//! Deterministic stand-ins for bolt, for tests of code built on
//! [`BoltService`](crate::BoltService).

use crate::runner::{render_command_line, ExecOptions, OutputSink, ProcessRunner, RawOutput};
use async_trait::async_trait;
use boltdesk_core::constants::{DEFAULT_BOLT_BINARY, DEFAULT_EXECUTION_TIMEOUT};
use boltdesk_core::{Error, FailureOutput, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Scripted {
    Exit {
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
    },
    Timeout,
    SpawnFailure(String),
}

/// A [`ProcessRunner`] that replays canned responses.
///
/// Responses are keyed by the argument vector joined with spaces, e.g.
/// `"inventory show --detail --format json"`. Every call is recorded, and a
/// call nobody scripted fails like a missing binary would.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    responses: Arc<Mutex<HashMap<String, Scripted>>>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn key<S: AsRef<str>>(args: &[S]) -> String {
        args.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ")
    }

    fn script<S: AsRef<str>>(&self, args: &[S], response: Scripted) -> &Self {
        self.responses.lock().insert(Self::key(args), response);
        self
    }

    /// Exit with `exit_code` after printing `stdout` and `stderr`
    pub fn respond<S: AsRef<str>>(
        &self,
        args: &[S],
        stdout: &str,
        stderr: &str,
        exit_code: i32,
    ) -> &Self {
        self.script(
            args,
            Scripted::Exit {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                exit_code: Some(exit_code),
            },
        )
    }

    /// Exit 0 printing `doc`
    pub fn respond_json<S: AsRef<str>>(&self, args: &[S], doc: &Value) -> &Self {
        self.respond(args, &doc.to_string(), "", 0)
    }

    /// Exit 1 printing `stderr`
    pub fn respond_failure<S: AsRef<str>>(&self, args: &[S], stderr: &str) -> &Self {
        self.respond(args, "", stderr, 1)
    }

    /// Never finish within the run's timeout
    pub fn respond_timeout<S: AsRef<str>>(&self, args: &[S]) -> &Self {
        self.script(args, Scripted::Timeout)
    }

    /// Fail to start at all
    pub fn respond_spawn_failure<S: AsRef<str>>(&self, args: &[S], message: &str) -> &Self {
        self.script(args, Scripted::SpawnFailure(message.to_string()))
    }

    /// Argument vectors of every call so far, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of calls whose arguments start with `prefix`
    pub fn count_matching<S: AsRef<str>>(&self, prefix: &[S]) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| {
                call.len() >= prefix.len()
                    && call.iter().zip(prefix).all(|(a, p)| a == p.as_ref())
            })
            .count()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn execute(
        &self,
        args: &[String],
        options: &ExecOptions,
        sink: Option<&dyn OutputSink>,
    ) -> Result<RawOutput> {
        self.calls.lock().push(args.to_vec());
        let response = self.responses.lock().get(&Self::key(args)).cloned();

        if let Some(sink) = sink {
            sink.on_command(&render_command_line(DEFAULT_BOLT_BINARY, args));
        }

        match response {
            Some(Scripted::Exit {
                stdout,
                stderr,
                exit_code,
            }) => {
                if let Some(sink) = sink {
                    if !stdout.is_empty() {
                        sink.on_stdout(&stdout);
                    }
                    if !stderr.is_empty() {
                        sink.on_stderr(&stderr);
                    }
                }
                Ok(RawOutput::from_exit(&stdout, &stderr, exit_code))
            }
            Some(Scripted::Timeout) => Err(Error::timeout(
                options.timeout.unwrap_or(DEFAULT_EXECUTION_TIMEOUT),
                FailureOutput::default(),
            )),
            Some(Scripted::SpawnFailure(message)) => {
                Err(Error::execution(message, FailureOutput::default()))
            }
            None => Err(Error::execution(
                format!("no scripted response for `{}`", Self::key(args)),
                FailureOutput::default(),
            )),
        }
    }
}

/// Something an [`OutputSink`] was handed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Command(String),
    Stdout(String),
    Stderr(String),
}

/// An [`OutputSink`] that remembers everything it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    /// All stdout chunks concatenated
    pub fn stdout(&self) -> String {
        self.collect(|e| match e {
            SinkEvent::Stdout(chunk) => Some(chunk),
            _ => None,
        })
    }

    /// All stderr chunks concatenated
    pub fn stderr(&self) -> String {
        self.collect(|e| match e {
            SinkEvent::Stderr(chunk) => Some(chunk),
            _ => None,
        })
    }

    fn record(&self, event: SinkEvent) {
        self.events.lock().push(event);
    }

    fn collect(&self, pick: impl Fn(&SinkEvent) -> Option<&String>) -> String {
        self.events
            .lock()
            .iter()
            .filter_map(pick)
            .map(String::as_str)
            .collect()
    }
}

impl OutputSink for RecordingSink {
    fn on_command(&self, command: &str) {
        self.record(SinkEvent::Command(command.to_string()));
    }

    fn on_stdout(&self, chunk: &str) {
        self.record(SinkEvent::Stdout(chunk.to_string()));
    }

    fn on_stderr(&self, chunk: &str) {
        self.record(SinkEvent::Stderr(chunk.to_string()));
    }
}
