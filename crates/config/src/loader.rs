//! Configuration loader for boltdesk
//!
//! Settings are layered: defaults, then an optional JSON config file, then
//! environment variables. Command line flags are applied on top by the CLI
//! through [`BoltConfigBuilder::from_config`](crate::BoltConfigBuilder::from_config).

use crate::config::{BoltConfig, ConfigSource};
use crate::whitelist::{MatchMode, WhitelistConfig};
use boltdesk_core::constants::{
    BOLT_BINARY_VAR, BOLT_EXECUTION_TIMEOUT_VAR, BOLT_PACKAGE_TASK_VAR, BOLT_PROJECT_PATH_VAR,
    BOLT_PUPPET_TASK_VAR, BOLT_TERMINATION_GRACE_VAR, CACHE_FACTS_TTL_VAR, CACHE_INVENTORY_TTL_VAR,
    COMMAND_WHITELIST_ALLOW_ALL_VAR, COMMAND_WHITELIST_MATCH_MODE_VAR, COMMAND_WHITELIST_VAR,
};
use boltdesk_core::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// On-disk configuration; every field is optional and durations are milliseconds
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FileConfig {
    binary: Option<String>,
    project_path: Option<PathBuf>,
    execution_timeout_ms: Option<u64>,
    termination_grace_ms: Option<u64>,
    cache: Option<FileCacheConfig>,
    command_whitelist: Option<WhitelistConfig>,
    puppet_task: Option<String>,
    package_task: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FileCacheConfig {
    inventory_ttl_ms: Option<u64>,
    facts_ttl_ms: Option<u64>,
}

/// Configuration loader that handles all startup configuration
pub struct ConfigLoader {
    file: Option<PathBuf>,
    read_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            file: None,
            read_env: true,
        }
    }

    /// Read settings from a JSON file
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Whether environment variables override file settings
    pub fn read_env(mut self, read_env: bool) -> Self {
        self.read_env = read_env;
        self
    }

    /// Load from the process environment
    pub fn load(self) -> Result<BoltConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve environment variables
    pub fn load_with_env<F>(self, lookup: F) -> Result<BoltConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = BoltConfig::default();

        if let Some(path) = &self.file {
            apply_file(&mut config, read_file(path)?);
            config.source = ConfigSource::ConfigFile(path.clone());
        }

        if self.read_env {
            apply_env(&mut config, &lookup)?;
        }

        config.validate()?;
        tracing::debug!(
            source = ?config.source,
            binary = %config.binary,
            "loaded bolt configuration"
        );
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| file_error(path, "unreadable", e))?;
    serde_json::from_str(&content).map_err(|e| file_error(path, "invalid", e))
}

fn file_error(path: &Path, problem: &str, e: impl std::fmt::Display) -> Error {
    Error::configuration(format!("{problem} config file '{}': {e}", path.display()))
}

fn apply_file(config: &mut BoltConfig, file: FileConfig) {
    if let Some(binary) = file.binary {
        config.binary = binary;
    }
    if let Some(path) = file.project_path {
        config.project_path = path;
    }
    if let Some(ms) = file.execution_timeout_ms {
        config.execution_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = file.termination_grace_ms {
        config.termination_grace = Duration::from_millis(ms);
    }
    if let Some(cache) = file.cache {
        if let Some(ms) = cache.inventory_ttl_ms {
            config.cache.inventory_ttl = Duration::from_millis(ms);
        }
        if let Some(ms) = cache.facts_ttl_ms {
            config.cache.facts_ttl = Duration::from_millis(ms);
        }
    }
    if let Some(whitelist) = file.command_whitelist {
        config.command_whitelist = whitelist;
    }
    if let Some(task) = file.puppet_task {
        config.puppet_task = task;
    }
    if let Some(task) = file.package_task {
        config.package_task = task;
    }
}

fn apply_env<F>(config: &mut BoltConfig, lookup: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = None;
    let mut get = |key: &'static str| {
        let value = lookup(key).filter(|v| !v.trim().is_empty());
        if value.is_some() {
            applied = Some(key);
        }
        value
    };

    if let Some(binary) = get(BOLT_BINARY_VAR) {
        config.binary = binary;
    }
    if let Some(path) = get(BOLT_PROJECT_PATH_VAR) {
        config.project_path = PathBuf::from(path);
    }
    if let Some(value) = get(BOLT_EXECUTION_TIMEOUT_VAR) {
        config.execution_timeout = parse_millis(BOLT_EXECUTION_TIMEOUT_VAR, &value)?;
    }
    if let Some(value) = get(BOLT_TERMINATION_GRACE_VAR) {
        config.termination_grace = parse_millis(BOLT_TERMINATION_GRACE_VAR, &value)?;
    }
    if let Some(value) = get(CACHE_INVENTORY_TTL_VAR) {
        config.cache.inventory_ttl = parse_millis(CACHE_INVENTORY_TTL_VAR, &value)?;
    }
    if let Some(value) = get(CACHE_FACTS_TTL_VAR) {
        config.cache.facts_ttl = parse_millis(CACHE_FACTS_TTL_VAR, &value)?;
    }
    if let Some(value) = get(COMMAND_WHITELIST_ALLOW_ALL_VAR) {
        config.command_whitelist.allow_all = parse_bool(COMMAND_WHITELIST_ALLOW_ALL_VAR, &value)?;
    }
    if let Some(value) = get(COMMAND_WHITELIST_VAR) {
        config.command_whitelist.commands = serde_json::from_str(&value).map_err(|e| {
            Error::configuration(format!(
                "{COMMAND_WHITELIST_VAR} must be a JSON array of strings: {e}"
            ))
        })?;
    }
    if let Some(value) = get(COMMAND_WHITELIST_MATCH_MODE_VAR) {
        config.command_whitelist.match_mode = MatchMode::parse(&value).ok_or_else(|| {
            Error::configuration(format!(
                "{COMMAND_WHITELIST_MATCH_MODE_VAR} must be 'exact' or 'prefix', got '{value}'"
            ))
        })?;
    }
    if let Some(task) = get(BOLT_PUPPET_TASK_VAR) {
        config.puppet_task = task;
    }
    if let Some(task) = get(BOLT_PACKAGE_TASK_VAR) {
        config.package_task = task;
    }

    if let Some(key) = applied {
        config.source = ConfigSource::EnvironmentVariable(key.to_string());
    }
    Ok(())
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| Error::configuration(format!("{key} must be milliseconds, got '{value}'")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::configuration(format!("{key} must be true or false, got '{value}'"))),
    }
}
