//! Centralized configuration for boltdesk
//!
//! `BoltConfig` is immutable after construction and can be shared freely
//! across the service and the runner.

use crate::whitelist::WhitelistConfig;
use boltdesk_core::constants::{
    DEFAULT_BOLT_BINARY, DEFAULT_EXECUTION_TIMEOUT, DEFAULT_FACTS_TTL, DEFAULT_INVENTORY_TTL,
    DEFAULT_PACKAGE_TASK, DEFAULT_PUPPET_TASK, DEFAULT_TERMINATION_GRACE,
};
use boltdesk_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// TTLs for the query caches.
///
/// The task catalog has no TTL; it is only dropped by explicit invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub inventory_ttl: Duration,
    pub facts_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            inventory_ttl: DEFAULT_INVENTORY_TTL,
            facts_ttl: DEFAULT_FACTS_TTL,
        }
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default configuration
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variable
    EnvironmentVariable(String),
    /// Command line argument
    CommandLine,
}

/// How boltdesk talks to bolt
#[derive(Debug, Clone)]
pub struct BoltConfig {
    /// Name or path of the bolt executable
    pub binary: String,
    /// Bolt project directory; used as the working directory of every run
    pub project_path: PathBuf,
    /// Deadline for a single bolt invocation
    pub execution_timeout: Duration,
    /// Time between SIGTERM and SIGKILL once a run has timed out
    pub termination_grace: Duration,
    pub cache: CacheSettings,
    pub command_whitelist: WhitelistConfig,
    /// Task used by puppet runs
    pub puppet_task: String,
    /// Task used by package installs
    pub package_task: String,
    /// Where the highest-precedence setting came from
    pub source: ConfigSource,
}

impl Default for BoltConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BOLT_BINARY.to_string(),
            project_path: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
            termination_grace: DEFAULT_TERMINATION_GRACE,
            cache: CacheSettings::default(),
            command_whitelist: WhitelistConfig::default(),
            puppet_task: DEFAULT_PUPPET_TASK.to_string(),
            package_task: DEFAULT_PACKAGE_TASK.to_string(),
            source: ConfigSource::Default,
        }
    }
}

impl BoltConfig {
    pub fn builder() -> BoltConfigBuilder {
        BoltConfigBuilder::new()
    }

    /// Reject settings bolt cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.binary.trim().is_empty() {
            return Err(Error::configuration("bolt binary must not be empty"));
        }
        if self.execution_timeout.is_zero() {
            return Err(Error::configuration("execution timeout must be greater than 0"));
        }
        if self.puppet_task.trim().is_empty() || self.package_task.trim().is_empty() {
            return Err(Error::configuration("task names must not be empty"));
        }
        if !self.project_path.exists() {
            tracing::warn!(
                project_path = %self.project_path.display(),
                "bolt project directory does not exist"
            );
        }
        Ok(())
    }
}

/// Builder for creating bolt configurations
pub struct BoltConfigBuilder {
    config: BoltConfig,
}

impl BoltConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: BoltConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: BoltConfig) -> Self {
        Self { config }
    }

    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.config.binary = binary.into();
        self
    }

    pub fn project_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.project_path = path.into();
        self
    }

    pub fn execution_timeout(mut self, timeout: Duration) -> Self {
        self.config.execution_timeout = timeout;
        self
    }

    pub fn termination_grace(mut self, grace: Duration) -> Self {
        self.config.termination_grace = grace;
        self
    }

    pub fn inventory_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache.inventory_ttl = ttl;
        self
    }

    pub fn facts_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache.facts_ttl = ttl;
        self
    }

    pub fn command_whitelist(mut self, whitelist: WhitelistConfig) -> Self {
        self.config.command_whitelist = whitelist;
        self
    }

    pub fn puppet_task(mut self, task: impl Into<String>) -> Self {
        self.config.puppet_task = task.into();
        self
    }

    pub fn package_task(mut self, task: impl Into<String>) -> Self {
        self.config.package_task = task.into();
        self
    }

    /// Set configuration source
    pub fn source(mut self, source: ConfigSource) -> Self {
        self.config.source = source;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<BoltConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for BoltConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
