//! Maps decoded bolt documents onto the domain types.
//!
//! Every function here is total: a field of the wrong shape or a missing
//! field falls back to a default, it never fails the transform.

pub mod execution;
pub mod facts;
pub mod inventory;
pub mod tasks;
pub mod type_expr;

pub use execution::{command_results, task_results};
pub use facts::transform_facts;
pub use inventory::transform_inventory;
pub use tasks::{transform_task_details, transform_task_list};

use serde_json::{Map, Value};

pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// A string field that is present and not blank
pub(crate) fn text_field(value: &Value, key: &str) -> Option<String> {
    str_field(value, key)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn object_field<'a>(value: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    value.get(key).and_then(Value::as_object)
}

pub(crate) fn array_field<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value.get(key).and_then(Value::as_array)
}

/// The `items[]` array bolt wraps per-target results in
pub(crate) fn items(doc: &Value) -> &[Value] {
    array_field(doc, "items")
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_field_skips_blank() {
        let doc = json!({"a": "  x ", "b": "   ", "c": 3});
        assert_eq!(text_field(&doc, "a").as_deref(), Some("x"));
        assert_eq!(text_field(&doc, "b"), None);
        assert_eq!(text_field(&doc, "c"), None);
    }

    #[test]
    fn test_items_of_other_shapes() {
        assert!(items(&json!({"items": {"not": "an array"}})).is_empty());
        assert!(items(&json!([1, 2])).is_empty());
        assert_eq!(items(&json!({"items": [1, 2]})).len(), 2);
    }
}
