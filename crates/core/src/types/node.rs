//! Inventory target types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection transport bolt uses to reach a target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Ssh,
    Winrm,
    Docker,
    Local,
}

impl Transport {
    /// Parse a transport name or URI scheme, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ssh" => Some(Transport::Ssh),
            "winrm" => Some(Transport::Winrm),
            "docker" => Some(Transport::Docker),
            "local" => Some(Transport::Local),
            _ => None,
        }
    }

    /// Infer the transport from a `scheme://host` URI
    pub fn from_uri(uri: &str) -> Option<Self> {
        uri.split_once("://").and_then(|(scheme, _)| Self::parse(scheme))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Ssh => "ssh",
            Transport::Winrm => "winrm",
            Transport::Docker => "docker",
            Transport::Local => "local",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport settings for a target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Any other transport options bolt reported
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An addressable target from the bolt inventory.
///
/// `id` always equals `name`; `name` is the key used by every lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub transport: Transport,
    pub config: NodeConfig,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        transport: Transport,
        config: NodeConfig,
    ) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            uri: uri.into(),
            transport,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_from_uri() {
        assert_eq!(
            Transport::from_uri("winrm://win-01"),
            Some(Transport::Winrm)
        );
        assert_eq!(Transport::from_uri("docker://abc"), Some(Transport::Docker));
        assert_eq!(Transport::from_uri("web-01.example.com"), None);
        assert_eq!(Transport::from_uri("pcp://web-01"), None);
    }

    #[test]
    fn test_node_id_matches_name() {
        let config = NodeConfig::default();
        let node = Node::new("web-01", "ssh://web-01", Transport::Ssh, config);
        assert_eq!(node.id, node.name);
    }

    #[test]
    fn test_node_serializes_flat_config() {
        let mut extra = serde_json::Map::new();
        extra.insert("host-key-check".into(), serde_json::Value::Bool(false));
        let node = Node::new(
            "web-01",
            "web-01",
            Transport::Ssh,
            NodeConfig {
                user: Some("root".into()),
                port: Some(22),
                extra,
            },
        );

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["transport"], "ssh");
        assert_eq!(json["config"]["user"], "root");
        assert_eq!(json["config"]["host-key-check"], false);
    }
}
