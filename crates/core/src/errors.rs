use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result type alias for boltdesk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Diagnostics captured from a failed bolt invocation.
///
/// Carried by every error that originates from a subprocess so operators can
/// see the root cause without re-running the tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl FailureOutput {
    pub fn new(
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Output holding only stderr text
    pub fn stderr_only(stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            ..Self::default()
        }
    }
}

/// Core error type for boltdesk operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bolt exited non-zero or could not be spawned
    #[error("{message}")]
    Execution {
        message: String,
        output: FailureOutput,
    },

    /// Bolt did not finish before the deadline
    #[error("bolt execution timed out after {}ms", .timeout.as_millis())]
    Timeout {
        timeout: Duration,
        output: FailureOutput,
    },

    /// Bolt output was empty or not valid JSON
    #[error("failed to parse bolt output: {message}")]
    Parse {
        message: String,
        output: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The bolt inventory file is missing or unreadable
    #[error("bolt inventory not found: {message}")]
    InventoryNotFound {
        message: String,
        output: FailureOutput,
    },

    /// A target could not be reached over its transport
    #[error("node '{node_id}' is unreachable: {details}")]
    NodeUnreachable {
        node_id: String,
        details: String,
        output: FailureOutput,
    },

    /// Bolt does not know the requested task
    #[error("task '{task_name}' not found")]
    TaskNotFound {
        task_name: String,
        output: FailureOutput,
    },

    /// Bolt rejected the parameters given to a task
    #[error("invalid parameters for task '{task_name}': {}", .errors.join("; "))]
    TaskParameter {
        task_name: String,
        errors: Vec<String>,
        output: FailureOutput,
    },

    /// The command is rejected by the command whitelist
    #[error("command '{command}' is not allowed by the command whitelist")]
    CommandNotAllowed { command: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

// Helper methods for creating errors with context
impl Error {
    /// Create a generic execution error
    #[must_use]
    pub fn execution(message: impl Into<String>, output: FailureOutput) -> Self {
        Error::Execution {
            message: message.into(),
            output,
        }
    }

    /// Create a timeout error keeping whatever output arrived before the deadline
    #[must_use]
    pub fn timeout(timeout: Duration, output: FailureOutput) -> Self {
        Error::Timeout { timeout, output }
    }

    /// Create a parse error; `output` is the raw text that failed to parse
    #[must_use]
    pub fn parse(message: impl Into<String>, output: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            output: output.into(),
            source: None,
        }
    }

    /// Create a parse error with the underlying JSON error
    #[must_use]
    pub fn parse_with_source(output: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Parse {
            message: source.to_string(),
            output: output.into(),
            source: Some(source),
        }
    }

    /// Create an inventory-not-found error
    #[must_use]
    pub fn inventory_not_found(message: impl Into<String>, output: FailureOutput) -> Self {
        Error::InventoryNotFound {
            message: message.into(),
            output,
        }
    }

    /// Create a node-unreachable error
    #[must_use]
    pub fn node_unreachable(
        node_id: impl Into<String>,
        details: impl Into<String>,
        output: FailureOutput,
    ) -> Self {
        Error::NodeUnreachable {
            node_id: node_id.into(),
            details: details.into(),
            output,
        }
    }

    /// Create a task-not-found error
    #[must_use]
    pub fn task_not_found(task_name: impl Into<String>, output: FailureOutput) -> Self {
        Error::TaskNotFound {
            task_name: task_name.into(),
            output,
        }
    }

    /// Create a task parameter error
    #[must_use]
    pub fn task_parameter(
        task_name: impl Into<String>,
        errors: Vec<String>,
        output: FailureOutput,
    ) -> Self {
        Error::TaskParameter {
            task_name: task_name.into(),
            errors,
            output,
        }
    }

    /// Create a command-not-allowed error
    #[must_use]
    pub fn command_not_allowed(command: impl Into<String>) -> Self {
        Error::CommandNotAllowed {
            command: command.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Error::Execution { .. } => "BOLT_EXECUTION_FAILED",
            Error::Timeout { .. } => "BOLT_TIMEOUT",
            Error::Parse { .. } => "BOLT_PARSE_ERROR",
            Error::InventoryNotFound { .. } => "INVENTORY_NOT_FOUND",
            Error::NodeUnreachable { .. } => "NODE_UNREACHABLE",
            Error::TaskNotFound { .. } => "TASK_NOT_FOUND",
            Error::TaskParameter { .. } => "INVALID_TASK_PARAMETERS",
            Error::CommandNotAllowed { .. } => "COMMAND_NOT_ALLOWED",
            Error::Configuration { .. } => "CONFIGURATION_ERROR",
        }
    }

    /// Subprocess diagnostics attached to this error, if any
    pub fn failure_output(&self) -> Option<&FailureOutput> {
        match self {
            Error::Execution { output, .. }
            | Error::Timeout { output, .. }
            | Error::InventoryNotFound { output, .. }
            | Error::NodeUnreachable { output, .. }
            | Error::TaskNotFound { output, .. }
            | Error::TaskParameter { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Captured stderr, empty when the error did not come from a subprocess
    pub fn stderr(&self) -> &str {
        self.failure_output().map_or("", |o| o.stderr.as_str())
    }

    /// Exit code of the failed bolt process
    pub fn exit_code(&self) -> Option<i32> {
        self.failure_output().and_then(|o| o.exit_code)
    }

    /// True for the unclassified execution failure
    pub fn is_generic_execution(&self) -> bool {
        matches!(self, Error::Execution { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_reports_millis() {
        let err = Error::timeout(Duration::from_millis(50), FailureOutput::default());
        assert_eq!(err.to_string(), "bolt execution timed out after 50ms");
        assert_eq!(err.code(), "BOLT_TIMEOUT");
    }

    #[test]
    fn test_classified_errors_keep_diagnostics() {
        let output = FailureOutput::new("", "Connection refused", Some(1));
        let err = Error::node_unreachable("web-01", "Connection refused", output.clone());

        assert_eq!(err.stderr(), "Connection refused");
        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(err.failure_output(), Some(&output));
        assert!(!err.is_generic_execution());
    }

    #[test]
    fn test_parse_error_keeps_raw_text() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = Error::parse_with_source("{oops", source);

        match &err {
            Error::Parse { output, source, .. } => {
                assert_eq!(output, "{oops");
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.stderr(), "");
    }

    #[test]
    fn test_task_parameter_message_joins_lines() {
        let err = Error::task_parameter(
            "apache::restart",
            vec![
                "missing required parameter 'service'".into(),
                "invalid value".into(),
            ],
            FailureOutput::default(),
        );
        assert_eq!(
            err.to_string(),
            concat!(
                "invalid parameters for task 'apache::restart': ",
                "missing required parameter 'service'; invalid value"
            )
        );
    }
}
