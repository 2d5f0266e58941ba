//! Decodes bolt stdout

use boltdesk_core::{Error, Result};
use serde_json::Value;

/// Parse bolt stdout as JSON.
///
/// Empty or whitespace-only output is a parse error of its own; any decode
/// failure keeps the raw text and the JSON error.
pub fn parse_output(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Err(Error::parse("empty output", text));
    }
    serde_json::from_str(text).map_err(|e| Error::parse_with_source(text, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_empty_output() {
        for text in ["", "   ", "\n\t"] {
            match parse_output(text) {
                Err(Error::Parse {
                    message,
                    output,
                    source,
                }) => {
                    assert_eq!(message, "empty output");
                    assert_eq!(output, text);
                    assert!(source.is_none());
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn test_malformed_output_keeps_text() {
        let text = "Started on web-01...\n{\"items\": [";
        match parse_output(text) {
            Err(Error::Parse { output, source, .. }) => {
                assert_eq!(output, text);
                assert!(source.is_some());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_valid_document() {
        let text = r#"{"items": [{"target": "web-01", "status": "success"}]}"#;
        let doc = parse_output(text).unwrap();
        assert_eq!(doc["items"][0]["target"], "web-01");
    }

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 _:-]{0,16}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..6)
                    .prop_map(Value::Array),
                proptest::collection::btree_map("[a-z_]{1,8}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_valid_json_decodes(value in json_value()) {
            let text = serde_json::to_string(&value).unwrap();
            prop_assert_eq!(parse_output(&text).unwrap(), value);
        }

        #[test]
        fn prop_non_json_fails_with_raw_text(text in "[a-zA-Z][a-zA-Z ]{0,30}") {
            // `true`, `false` and `null` are valid JSON documents
            prop_assume!(!["true", "false", "null"].contains(&text.trim()));
            match parse_output(&text) {
                Err(Error::Parse { output, .. }) => prop_assert_eq!(output, text),
                other => prop_assert!(false, "unexpected result: {:?}", other),
            }
        }
    }
}
