//! Task catalog types

use crate::constants::{CORE_MODULE, TASK_MODULE_SEPARATOR};
use serde::{Deserialize, Serialize};

/// Parameter value type as declared in task metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    #[default]
    String,
    Integer,
    Boolean,
    Array,
    Hash,
}

/// Metadata for one task parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// The type expression exactly as the task metadata wrote it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
}

impl TaskParameter {
    /// A required `String` parameter with no further metadata
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::String,
            description: None,
            required: true,
            default: None,
            enum_values: None,
            source_type: None,
        }
    }
}

/// A named, parameterized unit of remote work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Vec<TaskParameter>,
    pub module_path: String,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            module: module_of(&name).to_string(),
            name,
            description: None,
            parameters: Vec::new(),
            module_path: String::new(),
        }
    }
}

/// Module a task belongs to: the part before `::`, or `core` when absent
pub fn module_of(task_name: &str) -> &str {
    match task_name.split_once(TASK_MODULE_SEPARATOR) {
        Some((module, _)) if !module.is_empty() => module,
        _ => CORE_MODULE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_derivation() {
        assert_eq!(module_of("apache::restart"), "apache");
        assert_eq!(module_of("reboot"), "core");
        assert_eq!(module_of("puppet_agent::version::check"), "puppet_agent");
        assert_eq!(Task::new("apache::restart").module, "apache");
        assert_eq!(Task::new("reboot").module, "core");
    }

    #[test]
    fn test_parameter_serializes_type_and_enum() {
        let mut param = TaskParameter::new("action");
        param.enum_values = Some(vec!["start".into(), "stop".into()]);
        param.required = false;

        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["type"], "String");
        assert_eq!(json["enum"][1], "stop");
        assert_eq!(json["required"], false);
        assert!(json.get("default").is_none());
    }
}
