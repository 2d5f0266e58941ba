//! Execution result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of bolt action produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionType {
    Command,
    Task,
    Facts,
    Puppet,
    Package,
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionType::Command => "command",
            ExecutionType::Task => "task",
            ExecutionType::Facts => "facts",
            ExecutionType::Puppet => "puppet",
            ExecutionType::Package => "package",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Success,
    Failed,
    Partial,
}

impl ExecutionStatus {
    /// `Failed` iff any node failed, otherwise `Success`
    pub fn from_results(results: &[NodeResult]) -> Self {
        if results.iter().any(|r| r.status == NodeStatus::Failed) {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::Success
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Partial => "partial",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Success,
    Failed,
}

/// Streams and exit code reported for one node by a command run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
}

/// Outcome of an action on a single node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    pub node_id: String,
    pub status: NodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<CommandOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds
    pub duration: u64,
}

impl NodeResult {
    /// A failed result carrying only an error message
    pub fn failed(node_id: impl Into<String>, error: impl Into<String>, duration: u64) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeStatus::Failed,
            output: None,
            value: None,
            error: Some(error.into()),
            duration,
        }
    }
}

/// Result of a command, task, puppet or package run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub id: String,
    #[serde(rename = "type")]
    pub execution_type: ExecutionType,
    pub target_nodes: Vec<String>,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Map<String, serde_json::Value>>,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Vec<NodeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl ExecutionResult {
    /// A result for an execution that has started but not finished
    pub fn running(
        id: impl Into<String>,
        execution_type: ExecutionType,
        target_nodes: Vec<String>,
        action: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            execution_type,
            target_nodes,
            action: action.into(),
            parameters: None,
            status: ExecutionStatus::Running,
            started_at,
            completed_at: None,
            results: Vec::new(),
            error: None,
            command: None,
            stdout: None,
            stderr: None,
        }
    }

    /// Attach node results, deriving the overall status from them
    pub fn complete(mut self, results: Vec<NodeResult>, completed_at: DateTime<Utc>) -> Self {
        self.status = ExecutionStatus::from_results(&results);
        self.results = results;
        self.completed_at = Some(completed_at);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == ExecutionStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn node_result(status: NodeStatus) -> NodeResult {
        NodeResult {
            node_id: "n1".into(),
            status,
            output: None,
            value: None,
            error: None,
            duration: 0,
        }
    }

    fn started(kind: ExecutionType, action: &str, now: DateTime<Utc>) -> ExecutionResult {
        ExecutionResult::running("id", kind, vec!["n1".into()], action, now)
    }

    #[test]
    fn test_empty_results_are_success() {
        assert_eq!(ExecutionStatus::from_results(&[]), ExecutionStatus::Success);
    }

    #[test]
    fn test_complete_derives_status() {
        let now = Utc::now();
        let results = vec![NodeResult::failed("n1", "boom", 12)];
        let result = started(ExecutionType::Command, "uptime", now).complete(results, now);

        assert!(result.is_failed());
        assert_eq!(result.completed_at, Some(now));
    }

    #[test]
    fn test_serialized_shape() {
        let now = Utc::now();
        let results = vec![node_result(NodeStatus::Success)];
        let result = started(ExecutionType::Task, "reboot", now).complete(results, now);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "task");
        assert_eq!(json["status"], "success");
        assert_eq!(json["targetNodes"][0], "n1");
        assert_eq!(json["results"][0]["nodeId"], "n1");
    }

    proptest! {
        #[test]
        fn prop_failed_iff_any_node_failed(
            statuses in proptest::collection::vec(any::<bool>(), 0..16)
        ) {
            let results: Vec<NodeResult> = statuses
                .iter()
                .map(|ok| node_result(if *ok { NodeStatus::Success } else { NodeStatus::Failed }))
                .collect();

            let status = ExecutionStatus::from_results(&results);
            let any_failed = statuses.iter().any(|ok| !ok);
            prop_assert_eq!(status == ExecutionStatus::Failed, any_failed);
            prop_assert!(status == ExecutionStatus::Failed || status == ExecutionStatus::Success);
        }
    }
}
