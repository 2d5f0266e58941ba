/// Constants used throughout the boltdesk codebase
use std::time::Duration;

// Bolt binary
pub const DEFAULT_BOLT_BINARY: &str = "bolt";

// Environment variable names
pub const BOLT_BINARY_VAR: &str = "BOLT_BINARY";
pub const BOLT_PROJECT_PATH_VAR: &str = "BOLT_PROJECT_PATH";
pub const BOLT_EXECUTION_TIMEOUT_VAR: &str = "BOLT_EXECUTION_TIMEOUT";
pub const BOLT_TERMINATION_GRACE_VAR: &str = "BOLT_TERMINATION_GRACE";
pub const BOLT_PUPPET_TASK_VAR: &str = "BOLT_PUPPET_TASK";
pub const BOLT_PACKAGE_TASK_VAR: &str = "BOLT_PACKAGE_TASK";
pub const CACHE_INVENTORY_TTL_VAR: &str = "CACHE_INVENTORY_TTL";
pub const CACHE_FACTS_TTL_VAR: &str = "CACHE_FACTS_TTL";
pub const COMMAND_WHITELIST_VAR: &str = "COMMAND_WHITELIST";
pub const COMMAND_WHITELIST_ALLOW_ALL_VAR: &str = "COMMAND_WHITELIST_ALLOW_ALL";
pub const COMMAND_WHITELIST_MATCH_MODE_VAR: &str = "COMMAND_WHITELIST_MATCH_MODE";

// Timeouts
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_millis(300_000);
pub const DEFAULT_TERMINATION_GRACE: Duration = Duration::from_secs(5);

// Cache TTLs
pub const DEFAULT_INVENTORY_TTL: Duration = Duration::from_millis(30_000);
pub const DEFAULT_FACTS_TTL: Duration = Duration::from_millis(300_000);

// Tasks
pub const TASK_MODULE_SEPARATOR: &str = "::";
pub const CORE_MODULE: &str = "core";
pub const FACTS_TASK: &str = "facts";
pub const DEFAULT_PUPPET_TASK: &str = "psick::puppet_agent";
pub const DEFAULT_PACKAGE_TASK: &str = "package";

// Placeholder for fact fields the target did not report
pub const UNKNOWN: &str = "unknown";
