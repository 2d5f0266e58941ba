use clap::Subcommand;
use eyre::WrapErr;
use serde_json::{Map, Value};

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List all tasks with their parameters
    List {
        /// Group the tasks by module
        #[arg(long)]
        by_module: bool,
    },

    /// Show a single task
    Show {
        /// Task name, e.g. `package` or `apache::restart`
        name: String,
    },

    /// Run a task on a node
    Run {
        /// Target name
        node: String,

        /// Task name
        task: String,

        /// Task parameters as a JSON object
        #[arg(long, value_name = "JSON")]
        params: Option<String>,
    },
}

/// Parse `--params`; anything but a JSON object is rejected
pub fn parse_params(params: Option<&str>) -> eyre::Result<Option<Map<String, Value>>> {
    let Some(text) = params else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(text).wrap_err("--params is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        other => Err(eyre::eyre!("--params must be a JSON object, got {other}")),
    }
}
