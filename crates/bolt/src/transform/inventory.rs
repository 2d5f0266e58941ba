//! `bolt inventory show --detail` output to [`Node`]s

use super::{array_field, object_field, str_field, text_field};
use boltdesk_core::{Node, NodeConfig, Transport};
use serde_json::{Map, Value};

/// Top-level keys of the inventory envelope that are never target names
const ENVELOPE_KEYS: &[&str] = &["inventory", "targets", "count", "file", "items", "flags"];

/// A shape the inventory document can take. Returns `None` when the document
/// is not of this shape.
type ShapeDetector = fn(&Value) -> Option<Vec<Node>>;

const DETECTORS: &[ShapeDetector] = &[nested_targets, top_level_targets, keyed_targets];

/// Build nodes from an inventory document.
///
/// Shapes are tried in order: `inventory.targets[]`, `targets[]`, then a map
/// of `name -> target`. The first shape that matches is used. Targets without
/// a name are dropped.
pub fn transform_inventory(doc: &Value) -> Vec<Node> {
    DETECTORS
        .iter()
        .find_map(|detect| detect(doc))
        .unwrap_or_default()
}

fn nested_targets(doc: &Value) -> Option<Vec<Node>> {
    let inventory = doc.get("inventory")?;
    array_field(inventory, "targets").map(|targets| listed_targets(targets))
}

fn top_level_targets(doc: &Value) -> Option<Vec<Node>> {
    array_field(doc, "targets").map(|targets| listed_targets(targets))
}

fn listed_targets(targets: &[Value]) -> Vec<Node> {
    targets
        .iter()
        .filter_map(|t| target_to_node(t, None))
        .collect()
}

fn keyed_targets(doc: &Value) -> Option<Vec<Node>> {
    let map = doc.as_object()?;
    let nodes = map
        .iter()
        .filter(|(key, value)| !ENVELOPE_KEYS.contains(&key.as_str()) && value.is_object())
        .filter_map(|(key, value)| target_to_node(value, Some(key.as_str())))
        .collect();
    Some(nodes)
}

fn target_to_node(target: &Value, key: Option<&str>) -> Option<Node> {
    // `inventory show` without `--detail` lists bare names
    if let Some(name) = target.as_str() {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let transport = Transport::from_uri(name).unwrap_or_default();
        return Some(Node::new(name, name, transport, NodeConfig::default()));
    }

    let name = text_field(target, "name").or_else(|| key.map(str::to_string))?;
    let uri = text_field(target, "uri").unwrap_or_else(|| name.clone());
    let config = object_field(target, "config");

    let transport = str_field(target, "transport")
        .or_else(|| config?.get("transport")?.as_str())
        .and_then(Transport::parse)
        .or_else(|| Transport::from_uri(&uri))
        .unwrap_or_default();

    let node_config = config
        .and_then(|c| c.get(transport.as_str()))
        .and_then(Value::as_object)
        .map(transport_config)
        .unwrap_or_default();

    Some(Node::new(name, uri, transport, node_config))
}

fn transport_config(section: &Map<String, Value>) -> NodeConfig {
    let mut extra = section.clone();
    let user = extra
        .remove("user")
        .and_then(|v| v.as_str().map(str::to_string));
    let port = extra.remove("port").and_then(|v| match v {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    NodeConfig { user, port, extra }
}
