//! Per-target results of `command run` and `task run`

use super::{items, object_field, str_field, text_field};
use boltdesk_core::{CommandOutput, NodeResult, NodeStatus};
use serde_json::Value;

const GENERIC_COMMAND_ERROR: &str = "Command failed";
const GENERIC_TASK_ERROR: &str = "Task execution failed";

/// One result per `items[]` entry of a `command run` document.
///
/// `value.stdout`, `value.stderr` and `value.exit_code` become the node output.
/// No `items` array means no results.
pub fn command_results(doc: &Value, fallback_node: &str, duration_ms: u64) -> Vec<NodeResult> {
    items(doc)
        .iter()
        .map(|item| {
            let value = item.get("value").unwrap_or(&Value::Null);
            let status = item_status(item);
            let output = CommandOutput {
                stdout: str_field(value, "stdout").map(str::to_string),
                stderr: str_field(value, "stderr").map(str::to_string),
                exit_code: value.get("exit_code").and_then(Value::as_i64),
            };
            let error = (status == NodeStatus::Failed).then(|| {
                error_message(item)
                    .or_else(|| text_field(value, "stderr"))
                    .unwrap_or_else(|| GENERIC_COMMAND_ERROR.to_string())
            });

            NodeResult {
                node_id: target_of(item, fallback_node),
                status,
                output: Some(output),
                value: None,
                error,
                duration: duration_ms,
            }
        })
        .collect()
}

/// One result per `items[]` entry of a `task run` document.
///
/// The task's `value` is kept as-is. Failed items get a readable error built
/// from `_error`, falling back to the item's `error` and then to a generic
/// message.
pub fn task_results(doc: &Value, fallback_node: &str, duration_ms: u64) -> Vec<NodeResult> {
    items(doc)
        .iter()
        .map(|item| {
            let status = item_status(item);
            let error = (status == NodeStatus::Failed).then(|| failure_message(item));

            NodeResult {
                node_id: target_of(item, fallback_node),
                status,
                output: None,
                value: item.get("value").cloned(),
                error,
                duration: duration_ms,
            }
        })
        .collect()
}

fn failure_message(item: &Value) -> String {
    error_message(item).unwrap_or_else(|| GENERIC_TASK_ERROR.to_string())
}

fn item_status(item: &Value) -> NodeStatus {
    match str_field(item, "status") {
        Some("success") => NodeStatus::Success,
        _ => NodeStatus::Failed,
    }
}

fn target_of(item: &Value, fallback_node: &str) -> String {
    text_field(item, "target")
        .or_else(|| text_field(item, "node"))
        .unwrap_or_else(|| fallback_node.to_string())
}

fn msg_or_message(value: &Value) -> Option<String> {
    text_field(value, "msg").or_else(|| text_field(value, "message"))
}

/// The most specific error text an item carries
fn error_message(item: &Value) -> Option<String> {
    let value = item.get("value").unwrap_or(&Value::Null);
    structured_error(value)
        .or_else(|| item.get("error").and_then(msg_or_message))
        .or_else(|| value.get("error").and_then(msg_or_message))
        .or_else(|| text_field(item, "error"))
}

/// `value._error` rendered as `kind: msg (exit code N)` plus any `_output`
fn structured_error(value: &Value) -> Option<String> {
    let error = value.get("_error")?;
    let mut message = msg_or_message(error)?;

    if let Some(kind) = text_field(error, "kind") {
        message = format!("{kind}: {message}");
    }
    if let Some(code) = object_field(error, "details")
        .and_then(|d| d.get("exit_code"))
        .and_then(Value::as_i64)
    {
        message.push_str(&format!(" (exit code {code})"));
    }
    if let Some(output) = text_field(value, "_output") {
        message.push('\n');
        message.push_str(&output);
    }
    Some(message)
}
