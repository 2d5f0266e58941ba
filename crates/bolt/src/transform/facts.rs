//! Output of the `facts` task to [`Facts`]

use super::{items, object_field, str_field};
use boltdesk_core::constants::UNKNOWN;
use boltdesk_core::{
    FactSet, Facts, MemoryFacts, NetworkingFacts, OsFacts, OsRelease, ProcessorFacts, SystemMemory,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

const STRUCTURED_KEYS: &[&str] = &["os", "processors", "memory", "networking"];

/// Build the facts of `node_id` from a facts document.
///
/// The payload is the value of the first successful item when the document
/// carries `items[]`, otherwise the document itself. The four structured
/// sections always come out populated; every other key is copied through.
pub fn transform_facts(
    node_id: &str,
    doc: &Value,
    gathered_at: DateTime<Utc>,
    command: Option<String>,
) -> Facts {
    let empty = Map::new();
    let payload = payload(doc).unwrap_or(&empty);
    let section = |key: &str| payload.get(key).unwrap_or(&Value::Null);

    let extra = payload
        .iter()
        .filter(|(key, _)| !STRUCTURED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Facts {
        node_id: node_id.to_string(),
        gathered_at,
        facts: FactSet {
            os: os_facts(section("os")),
            processors: processor_facts(section("processors")),
            memory: memory_facts(section("memory")),
            networking: networking_facts(section("networking")),
            extra,
        },
        command,
    }
}

fn payload(doc: &Value) -> Option<&Map<String, Value>> {
    if doc.get("items").is_some_and(Value::is_array) {
        return items(doc)
            .iter()
            .filter(|item| str_field(item, "status") == Some("success"))
            .find_map(|item| object_field(item, "value"));
    }
    doc.as_object()
}

/// A scalar rendered as text, `unknown` when absent
fn text_or_unknown(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

fn os_facts(os: &Value) -> OsFacts {
    let release = os.get("release").unwrap_or(&Value::Null);
    OsFacts {
        family: text_or_unknown(os, "family"),
        name: text_or_unknown(os, "name"),
        release: OsRelease {
            full: text_or_unknown(release, "full"),
            major: text_or_unknown(release, "major"),
        },
    }
}

fn processor_facts(processors: &Value) -> ProcessorFacts {
    let count = match processors.get("count") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    let models = processors
        .get("models")
        .and_then(Value::as_array)
        .map(|models| {
            models
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    ProcessorFacts { count, models }
}

fn memory_facts(memory: &Value) -> MemoryFacts {
    let system = memory.get("system").unwrap_or(&Value::Null);
    MemoryFacts {
        system: SystemMemory {
            total: text_or_unknown(system, "total"),
            available: text_or_unknown(system, "available"),
        },
    }
}

fn networking_facts(networking: &Value) -> NetworkingFacts {
    NetworkingFacts {
        hostname: text_or_unknown(networking, "hostname"),
        interfaces: object_field(networking, "interfaces")
            .cloned()
            .unwrap_or_default(),
    }
}
