//! Facts gathered from a target

use crate::constants::UNKNOWN;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn unknown() -> String {
    UNKNOWN.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsRelease {
    pub full: String,
    pub major: String,
}

impl Default for OsRelease {
    fn default() -> Self {
        Self {
            full: unknown(),
            major: unknown(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsFacts {
    pub family: String,
    pub name: String,
    pub release: OsRelease,
}

impl Default for OsFacts {
    fn default() -> Self {
        Self {
            family: unknown(),
            name: unknown(),
            release: OsRelease::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorFacts {
    pub count: u64,
    pub models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMemory {
    pub total: String,
    pub available: String,
}

impl Default for SystemMemory {
    fn default() -> Self {
        Self {
            total: unknown(),
            available: unknown(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryFacts {
    pub system: SystemMemory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkingFacts {
    pub hostname: String,
    pub interfaces: serde_json::Map<String, serde_json::Value>,
}

impl Default for NetworkingFacts {
    fn default() -> Self {
        Self {
            hostname: unknown(),
            interfaces: serde_json::Map::new(),
        }
    }
}

/// The structured facts every target exposes plus any extra facts reported.
///
/// The four structured sections are always present; missing source data turns
/// into `"unknown"`, `0` or an empty collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactSet {
    pub os: OsFacts,
    pub processors: ProcessorFacts,
    pub memory: MemoryFacts,
    pub networking: NetworkingFacts,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Facts gathered from one node at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facts {
    pub node_id: String,
    pub gathered_at: DateTime<Utc>,
    pub facts: FactSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fact_set_uses_sentinels() {
        let facts = FactSet::default();
        assert_eq!(facts.os.family, "unknown");
        assert_eq!(facts.os.release.major, "unknown");
        assert_eq!(facts.processors.count, 0);
        assert!(facts.processors.models.is_empty());
        assert_eq!(facts.memory.system.total, "unknown");
        assert_eq!(facts.networking.hostname, "unknown");
        assert!(facts.networking.interfaces.is_empty());
    }

    #[test]
    fn test_extra_facts_serialize_at_top_level() {
        let mut facts = FactSet::default();
        facts
            .extra
            .insert("kernel".into(), serde_json::Value::String("Linux".into()));

        let json = serde_json::to_value(&facts).unwrap();
        assert_eq!(json["kernel"], "Linux");
        assert_eq!(json["os"]["family"], "unknown");
    }
}
