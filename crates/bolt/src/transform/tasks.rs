//! `bolt task show` output to [`Task`]s

use super::type_expr;
use super::{array_field, str_field, text_field};
use boltdesk_core::{Task, TaskParameter};
use serde_json::Value;

/// Tasks from a listing.
///
/// Accepts `{"tasks": [...]}` or a bare array. Entries may be
/// `[name, description]` pairs, bare names or full task objects; entries
/// without a name are skipped.
pub fn transform_task_list(doc: &Value) -> Vec<Task> {
    let entries = array_field(doc, "tasks")
        .or_else(|| doc.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    entries.iter().filter_map(list_entry).collect()
}

fn list_entry(entry: &Value) -> Option<Task> {
    match entry {
        Value::Array(pair) => {
            let name = pair.first().and_then(Value::as_str).map(str::trim)?;
            if name.is_empty() {
                return None;
            }
            let mut task = Task::new(name);
            task.description = pair
                .get(1)
                .and_then(Value::as_str)
                .filter(|d| !d.trim().is_empty())
                .map(str::to_string);
            Some(task)
        }
        Value::String(name) if !name.trim().is_empty() => Some(Task::new(name.trim())),
        Value::Object(_) => transform_task_details(entry),
        _ => None,
    }
}

/// A fully described task from `bolt task show <name>`.
///
/// Returns `None` when the document does not name a task.
pub fn transform_task_details(doc: &Value) -> Option<Task> {
    let name = text_field(doc, "name")?;
    let metadata = doc.get("metadata").unwrap_or(&Value::Null);

    let mut task = Task::new(name);
    let description = text_field(metadata, "description");
    task.description = description.or_else(|| text_field(doc, "description"));
    task.module_path = str_field(doc, "module").unwrap_or_default().to_string();
    task.parameters = metadata
        .get("parameters")
        .or_else(|| doc.get("parameters"))
        .or_else(|| doc.get("params"))
        .map(parameters)
        .unwrap_or_default();
    Some(task)
}

fn parameters(value: &Value) -> Vec<TaskParameter> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(name, spec)| parameter(name, spec))
            .collect(),
        Value::Array(list) => list
            .iter()
            .filter_map(|spec| {
                let name = text_field(spec, "name")?;
                Some(parameter(&name, spec))
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parameter(name: &str, spec: &Value) -> TaskParameter {
    // A bare string is shorthand for the type expression
    let source_type = spec
        .as_str()
        .or_else(|| str_field(spec, "type"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let info = source_type
        .as_deref()
        .map(type_expr::infer)
        .unwrap_or_default();
    let explicitly_optional = spec.get("required").and_then(Value::as_bool) == Some(false);

    TaskParameter {
        name: name.to_string(),
        param_type: info.param_type,
        description: text_field(spec, "description"),
        required: info.required && !explicitly_optional,
        default: spec.get("default").cloned(),
        enum_values: info.enum_values,
        source_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boltdesk_core::ParameterType;
    use serde_json::json;

    #[test]
    fn test_shallow_listing() {
        let doc = json!({
            "tasks": [
                ["facts", "Gather system facts"],
                ["apache::restart", ""],
                [],
                "reboot",
                {"name": "service::restart", "description": "Restart a service"}
            ],
            "modulepath": ["/etc/puppetlabs/code/modules"]
        });
        let tasks = transform_task_list(&doc);
        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["facts", "apache::restart", "reboot", "service::restart"]
        );
        assert_eq!(tasks[0].description.as_deref(), Some("Gather system facts"));
        assert_eq!(tasks[0].module, "core");
        assert_eq!(tasks[1].module, "apache");
        assert_eq!(tasks[1].description, None);
        assert_eq!(tasks[3].description.as_deref(), Some("Restart a service"));
    }

    #[test]
    fn test_listing_of_other_shapes() {
        assert!(transform_task_list(&json!({"tasks": "none"})).is_empty());
        assert_eq!(transform_task_list(&json!(["a::b"])).len(), 1);
    }

    #[test]
    fn test_details_with_metadata() {
        let doc = json!({
            "name": "package",
            "module": "/opt/modules/package",
            "metadata": {
                "description": "Manage packages",
                "parameters": {
                    "action": {
                        "description": "The operation",
                        "type": "Enum[install, status, uninstall, upgrade]"
                    },
                    "name": {"type": "String[1]"},
                    "version": {"type": "Optional[String[1]]"},
                    "timeout": {"type": "Integer", "default": 30, "required": false}
                }
            }
        });
        let task = transform_task_details(&doc).unwrap();
        assert_eq!(task.module, "core");
        assert_eq!(task.module_path, "/opt/modules/package");
        assert_eq!(task.description.as_deref(), Some("Manage packages"));
        assert_eq!(task.parameters.len(), 4);

        let param = |name: &str| task.parameters.iter().find(|p| p.name == name).unwrap();
        let action = param("action");
        assert_eq!(action.param_type, ParameterType::String);
        assert_eq!(action.enum_values.as_ref().map(Vec::len), Some(4));
        assert!(action.required);
        assert!(!param("version").required);
        assert_eq!(
            param("version").source_type.as_deref(),
            Some("Optional[String[1]]")
        );

        let timeout = param("timeout");
        assert_eq!(timeout.param_type, ParameterType::Integer);
        assert!(!timeout.required);
        assert_eq!(timeout.default, Some(json!(30)));
    }

    #[test]
    fn test_params_array_and_shorthand() {
        let doc = json!({
            "name": "mysql::sql",
            "params": [
                {"name": "sql", "type": "String"},
                {"name": "port", "type": "Optional[Integer]"},
                {"type": "Boolean"}
            ]
        });
        let task = transform_task_details(&doc).unwrap();
        assert_eq!(task.module, "mysql");
        assert_eq!(task.parameters.len(), 2);
        assert_eq!(task.parameters[1].param_type, ParameterType::Integer);

        let doc = json!({"name": "x", "parameters": {"flag": "Boolean"}});
        let task = transform_task_details(&doc).unwrap();
        assert_eq!(task.parameters[0].param_type, ParameterType::Boolean);
        assert!(task.parameters[0].required);
    }

    #[test]
    fn test_parameter_without_type() {
        let doc = json!({"name": "x", "parameters": {"anything": {"description": "free form"}}});
        let param = &transform_task_details(&doc).unwrap().parameters[0];
        assert_eq!(param.param_type, ParameterType::String);
        assert!(param.required);
        assert_eq!(param.source_type, None);
    }

    #[test]
    fn test_details_need_a_name() {
        assert!(transform_task_details(&json!({"metadata": {}})).is_none());
        assert!(transform_task_details(&json!([])).is_none());
    }
}
