//! Caches for the expensive bolt queries

use crate::entry::CacheStats;
use crate::ttl::TtlCache;
use boltdesk_config::CacheSettings;
use boltdesk_core::{Facts, Node, Task};
use serde::Serialize;

/// Inventory, per-node facts and task catalog caches.
///
/// The inventory and facts caches expire after their configured TTLs. The
/// task catalog is filled once and kept until invalidated.
pub struct ExecutionCache {
    inventory: TtlCache<(), Vec<Node>>,
    facts: TtlCache<String, Facts>,
    tasks: TtlCache<(), Vec<Task>>,
}

/// Statistics for each cache kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionCacheStats {
    pub inventory: CacheStats,
    pub facts: CacheStats,
    pub tasks: CacheStats,
}

impl ExecutionCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            inventory: TtlCache::new(settings.inventory_ttl),
            facts: TtlCache::new(settings.facts_ttl),
            tasks: TtlCache::unbounded(),
        }
    }

    pub fn inventory(&self) -> Option<Vec<Node>> {
        self.inventory.get(&())
    }

    pub fn set_inventory(&self, nodes: Vec<Node>) {
        self.inventory.set((), nodes);
    }

    pub fn invalidate_inventory(&self) {
        self.inventory.invalidate(&());
    }

    pub fn facts(&self, node_id: &str) -> Option<Facts> {
        self.facts.get(&node_id.to_string())
    }

    pub fn set_facts(&self, node_id: impl Into<String>, facts: Facts) {
        self.facts.set(node_id.into(), facts);
    }

    /// Drop the facts of one node, or of every node when `node_id` is `None`
    pub fn invalidate_facts(&self, node_id: Option<&str>) {
        match node_id {
            Some(id) => {
                self.facts.invalidate(&id.to_string());
            }
            None => self.facts.clear(),
        }
    }

    pub fn tasks(&self) -> Option<Vec<Task>> {
        self.tasks.get(&())
    }

    pub fn set_tasks(&self, tasks: Vec<Task>) {
        self.tasks.set((), tasks);
    }

    pub fn invalidate_tasks(&self) {
        self.tasks.invalidate(&());
    }

    /// Drop everything
    pub fn clear(&self) {
        self.inventory.clear();
        self.facts.clear();
        self.tasks.clear();
        tracing::debug!("cleared all bolt caches");
    }

    pub fn stats(&self) -> ExecutionCacheStats {
        ExecutionCacheStats {
            inventory: self.inventory.stats(),
            facts: self.facts.stats(),
            tasks: self.tasks.stats(),
        }
    }
}

impl Default for ExecutionCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boltdesk_core::{FactSet, NodeConfig, Transport};
    use chrono::Utc;
    use std::time::Duration;

    fn settings() -> CacheSettings {
        CacheSettings {
            inventory_ttl: Duration::from_millis(30),
            facts_ttl: Duration::from_millis(300),
        }
    }

    fn facts(node: &str) -> Facts {
        Facts {
            node_id: node.to_string(),
            gathered_at: Utc::now(),
            facts: FactSet::default(),
            command: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttls_are_independent() {
        let cache = ExecutionCache::new(settings());
        let web = Node::new("web-01", "web-01", Transport::Ssh, NodeConfig::default());
        cache.set_inventory(vec![web]);
        cache.set_facts("web-01", facts("web-01"));
        cache.set_tasks(vec![Task::new("reboot")]);

        tokio::time::advance(Duration::from_millis(31)).await;
        assert!(cache.inventory().is_none());
        assert!(cache.facts("web-01").is_some());

        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(cache.facts("web-01").is_none());
        assert_eq!(cache.tasks().map(|t| t.len()), Some(1));
    }

    #[test]
    fn test_facts_invalidation() {
        let cache = ExecutionCache::default();
        cache.set_facts("a", facts("a"));
        cache.set_facts("b", facts("b"));

        cache.invalidate_facts(Some("a"));
        assert!(cache.facts("a").is_none());
        assert!(cache.facts("b").is_some());

        cache.invalidate_facts(None);
        assert!(cache.facts("b").is_none());
    }

    #[test]
    fn test_returned_values_are_snapshots() {
        let cache = ExecutionCache::default();
        cache.set_tasks(vec![Task::new("reboot")]);

        let mut snapshot = cache.tasks().unwrap();
        snapshot.push(Task::new("apache::restart"));

        assert_eq!(cache.tasks().unwrap().len(), 1);
    }

    #[test]
    fn test_clear_and_stats() {
        let cache = ExecutionCache::default();
        cache.set_tasks(vec![Task::new("reboot")]);
        assert!(cache.tasks().is_some());
        assert!(cache.inventory().is_none());

        let stats = cache.stats();
        assert_eq!(stats.tasks.hits, 1);
        assert_eq!(stats.inventory.misses, 1);

        cache.clear();
        assert_eq!(cache.stats().tasks.entries, 0);
    }
}
