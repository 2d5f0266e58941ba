//! Turns a generic bolt failure into a typed error by reading its stderr.
//!
//! Rules live in one ordered table. A rule only applies to the operations it
//! lists, matches when stderr contains any of its phrases (ignoring case), and
//! the first rule that matches and can build its error wins. Anything left
//! over stays a generic [`Error::Execution`].

use boltdesk_core::{Error, FailureOutput};
use std::fmt;
use tracing::debug;

/// The orchestrator operation a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Inventory,
    Facts,
    Command,
    Task,
    TaskDetails,
    TaskList,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Inventory => "inventory",
            Operation::Facts => "facts",
            Operation::Command => "command",
            Operation::Task => "task",
            Operation::TaskDetails => "task-details",
            Operation::TaskList => "task-list",
        };
        f.write_str(name)
    }
}

/// What was being attempted when bolt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
    pub operation: Operation,
    pub node_id: Option<String>,
    pub task_name: Option<String>,
}

impl FailureContext {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            node_id: None,
            task_name: None,
        }
    }

    pub fn inventory() -> Self {
        Self::new(Operation::Inventory)
    }

    pub fn facts(node_id: impl Into<String>) -> Self {
        Self::new(Operation::Facts).with_node(node_id)
    }

    pub fn command(node_id: impl Into<String>) -> Self {
        Self::new(Operation::Command).with_node(node_id)
    }

    pub fn task(node_id: impl Into<String>, task_name: impl Into<String>) -> Self {
        Self::new(Operation::Task)
            .with_node(node_id)
            .with_task(task_name)
    }

    pub fn task_details(task_name: impl Into<String>) -> Self {
        Self::new(Operation::TaskDetails).with_task(task_name)
    }

    pub fn task_list() -> Self {
        Self::new(Operation::TaskList)
    }

    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn with_task(mut self, task_name: impl Into<String>) -> Self {
        self.task_name = Some(task_name.into());
        self
    }
}

type Build = fn(&FailureContext, &str, FailureOutput) -> Option<Error>;

struct Rule {
    name: &'static str,
    applies_to: &'static [Operation],
    patterns: &'static [&'static str],
    build: Build,
}

const PARAMETER_PATTERNS: &[&str] = &["parameter", "invalid", "required", "missing"];

/// Most specific first: a missing-task message can also read as a parameter
/// or connectivity problem.
static RULES: &[Rule] = &[
    Rule {
        name: "inventory-not-found",
        applies_to: &[Operation::Inventory],
        patterns: &["inventory file", "could not find", "no such file"],
        build: inventory_not_found,
    },
    Rule {
        name: "task-not-found",
        applies_to: &[Operation::Task, Operation::TaskDetails],
        patterns: &[
            "could not find",
            "task not found",
            "no such task",
            "unknown task",
        ],
        build: task_not_found,
    },
    Rule {
        name: "task-parameter",
        applies_to: &[Operation::Task],
        patterns: PARAMETER_PATTERNS,
        build: task_parameter,
    },
    Rule {
        name: "node-unreachable",
        applies_to: &[Operation::Facts, Operation::Command, Operation::Task],
        patterns: &[
            "unreachable",
            "connection",
            "could not connect",
            "timed out",
            "connection refused",
            "no route to host",
        ],
        build: node_unreachable,
    },
];

fn inventory_not_found(_: &FailureContext, stderr: &str, output: FailureOutput) -> Option<Error> {
    Some(Error::inventory_not_found(stderr, output))
}

fn task_not_found(ctx: &FailureContext, _: &str, output: FailureOutput) -> Option<Error> {
    Some(Error::task_not_found(ctx.task_name.clone()?, output))
}

fn task_parameter(ctx: &FailureContext, stderr: &str, output: FailureOutput) -> Option<Error> {
    let task_name = ctx.task_name.clone()?;
    let errors = parameter_errors(stderr);
    Some(Error::task_parameter(task_name, errors, output))
}

fn node_unreachable(ctx: &FailureContext, stderr: &str, output: FailureOutput) -> Option<Error> {
    let node_id = ctx.node_id.clone()?;
    Some(Error::node_unreachable(node_id, stderr, output))
}

/// Stderr lines that mention a parameter problem, or the whole stderr
fn parameter_errors(stderr: &str) -> Vec<String> {
    let lines: Vec<String> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| {
            let line = line.to_lowercase();
            PARAMETER_PATTERNS.iter().any(|p| line.contains(p))
        })
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        vec![stderr.trim().to_string()]
    } else {
        lines
    }
}

/// Classify a failed bolt invocation.
///
/// Only generic execution errors with non-empty stderr are inspected; every
/// other error is returned unchanged, as is an execution error no rule claims.
pub fn classify(error: Error, ctx: &FailureContext) -> Error {
    let output = match &error {
        Error::Execution { output, .. } if !output.stderr.trim().is_empty() => output.clone(),
        _ => return error,
    };
    let stderr = output.stderr.trim().to_string();
    let lowered = stderr.to_lowercase();

    for rule in RULES {
        if !rule.applies_to.contains(&ctx.operation)
            || !rule.patterns.iter().any(|p| lowered.contains(p))
        {
            continue;
        }
        if let Some(typed) = (rule.build)(ctx, &stderr, output.clone()) {
            debug!(
                rule = rule.name,
                operation = %ctx.operation,
                code = typed.code(),
                "classified bolt failure"
            );
            return typed;
        }
    }
    error
}
