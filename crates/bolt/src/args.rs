//! Argument vectors for the bolt subcommands boltdesk uses

use boltdesk_core::constants::FACTS_TASK;
use serde_json::{Map, Value};

const FORMAT_FLAG: &str = "--format";
const JSON: &str = "json";

/// A bolt invocation, split into the subcommand with its positional
/// arguments and the flags that follow.
///
/// Positional arguments are user input (a command line, a task name) and are
/// never inspected as flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoltArgs {
    positional: Vec<String>,
    flags: Vec<String>,
}

impl BoltArgs {
    fn new(positional: &[&str]) -> Self {
        Self {
            positional: positional.iter().map(|a| a.to_string()).collect(),
            flags: Vec::new(),
        }
    }

    fn push_flag(&mut self, name: &str, value: impl Into<String>) {
        self.flags.push(name.to_string());
        self.flags.push(value.into());
    }

    /// Make sure bolt is asked for JSON output.
    ///
    /// Appends `--format json` unless a format flag is already present; an
    /// existing `--format <other>` or `--format=<other>` is rewritten to
    /// `json`.
    pub fn json(mut self) -> Self {
        if let Some(pos) = self.flags.iter().position(|a| a == FORMAT_FLAG) {
            match self.flags.get_mut(pos + 1) {
                Some(value) => *value = JSON.to_string(),
                None => self.flags.push(JSON.to_string()),
            }
            return self;
        }
        if let Some(arg) = self.flags.iter_mut().find(|a| a.starts_with("--format=")) {
            *arg = format!("{FORMAT_FLAG}={JSON}");
            return self;
        }

        self.push_flag(FORMAT_FLAG, JSON);
        self
    }

    pub fn into_vec(self) -> Vec<String> {
        let mut args = self.positional;
        args.extend(self.flags);
        args
    }
}

/// `bolt inventory show --detail`
pub fn inventory_show() -> BoltArgs {
    let mut args = BoltArgs::new(&["inventory", "show"]);
    args.flags.push("--detail".to_string());
    args
}

/// `bolt task run facts --targets <node>`
pub fn gather_facts(node_id: &str) -> BoltArgs {
    let mut args = BoltArgs::new(&["task", "run", FACTS_TASK]);
    args.push_flag("--targets", node_id);
    args
}

/// `bolt command run <command> --targets <node>`
pub fn command_run(node_id: &str, command: &str) -> BoltArgs {
    let mut args = BoltArgs::new(&["command", "run", command]);
    args.push_flag("--targets", node_id);
    args
}

/// `bolt task run <task> --targets <node> [--params <json>]`
///
/// `--params` is only passed when there is at least one parameter.
pub fn task_run(
    node_id: &str,
    task_name: &str,
    parameters: Option<&Map<String, Value>>,
) -> BoltArgs {
    let mut args = BoltArgs::new(&["task", "run", task_name]);
    args.push_flag("--targets", node_id);
    if let Some(params) = parameters.filter(|p| !p.is_empty()) {
        let json = Value::Object(params.clone()).to_string();
        args.push_flag("--params", json);
    }
    args
}

/// `bolt task show`
pub fn task_list() -> BoltArgs {
    BoltArgs::new(&["task", "show"])
}

/// `bolt task show <task>`
pub fn task_show(task_name: &str) -> BoltArgs {
    BoltArgs::new(&["task", "show", task_name])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_is_appended_once() {
        let args = inventory_show().json();
        assert_eq!(
            args.clone().into_vec(),
            vec!["inventory", "show", "--detail", "--format", "json"]
        );
        assert_eq!(args.clone().json(), args);
    }

    #[test]
    fn test_other_format_is_rewritten() {
        let mut args = task_list();
        args.push_flag(FORMAT_FLAG, "human");
        assert_eq!(
            args.json().into_vec(),
            vec!["task", "show", "--format", "json"]
        );

        let mut args = task_list();
        args.flags.push("--format=human".to_string());
        assert_eq!(
            args.json().into_vec(),
            vec!["task", "show", "--format=json"]
        );
    }

    #[test]
    fn test_positional_arguments_are_not_flags() {
        let args = command_run("web-01", "--format").json().into_vec();
        assert_eq!(
            args,
            vec![
                "command",
                "run",
                "--format",
                "--targets",
                "web-01",
                "--format",
                "json"
            ]
        );

        let args = task_show("--format=human").json().into_vec();
        assert_eq!(
            args,
            vec!["task", "show", "--format=human", "--format", "json"]
        );
    }

    #[test]
    fn test_task_run_params() {
        let params = json!({"service": "nginx"});
        let args = task_run("web-01", "service::restart", params.as_object());
        assert_eq!(
            args.json().into_vec(),
            vec![
                "task",
                "run",
                "service::restart",
                "--targets",
                "web-01",
                "--params",
                r#"{"service":"nginx"}"#,
                "--format",
                "json"
            ]
        );

        let empty = Map::new();
        let args = task_run("web-01", "reboot", Some(&empty)).into_vec();
        assert!(!args.contains(&"--params".to_string()));
    }

    #[test]
    fn test_facts_targets_node() {
        assert_eq!(
            gather_facts("n1").into_vec(),
            vec!["task", "run", "facts", "--targets", "n1"]
        );
    }
}
