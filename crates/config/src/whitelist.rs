//! Allowlist for ad-hoc commands

use serde::{Deserialize, Serialize};

/// How allowlist entries are compared with a command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The whole trimmed command must equal an entry
    #[default]
    Exact,
    /// The trimmed command must start with an entry
    Prefix,
}

impl MatchMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exact" => Some(MatchMode::Exact),
            "prefix" => Some(MatchMode::Prefix),
            _ => None,
        }
    }
}

/// Which commands `run_command` may execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WhitelistConfig {
    pub allow_all: bool,
    pub commands: Vec<String>,
    pub match_mode: MatchMode,
}

impl Default for WhitelistConfig {
    fn default() -> Self {
        Self {
            allow_all: true,
            commands: Vec::new(),
            match_mode: MatchMode::Exact,
        }
    }
}

impl WhitelistConfig {
    /// Only the given commands, matched exactly
    pub fn exact<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow_all: false,
            commands: commands.into_iter().map(Into::into).collect(),
            match_mode: MatchMode::Exact,
        }
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        if self.allow_all {
            return true;
        }

        let command = command.trim();
        if command.is_empty() {
            return false;
        }

        let mut allowed = self.commands.iter().map(|c| c.trim());
        match self.match_mode {
            MatchMode::Exact => allowed.any(|a| a == command),
            MatchMode::Prefix => allowed.any(|a| !a.is_empty() && command.starts_with(a)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all_accepts_anything() {
        let whitelist = WhitelistConfig::default();
        assert!(whitelist.is_allowed("rm -rf /tmp/scratch"));
    }

    #[test]
    fn test_exact_mode() {
        let whitelist = WhitelistConfig::exact(["uptime", "df -h"]);
        assert!(whitelist.is_allowed("uptime"));
        assert!(whitelist.is_allowed("  df -h "));
        assert!(!whitelist.is_allowed("df -h /var"));
        assert!(!whitelist.is_allowed(""));
    }

    #[test]
    fn test_prefix_mode() {
        let whitelist = WhitelistConfig {
            allow_all: false,
            commands: vec!["systemctl status".into(), "".into()],
            match_mode: MatchMode::Prefix,
        };
        assert!(whitelist.is_allowed("systemctl status nginx"));
        assert!(!whitelist.is_allowed("systemctl restart nginx"));
    }

    #[test]
    fn test_empty_list_rejects_everything() {
        let whitelist = WhitelistConfig::exact(Vec::<String>::new());
        assert!(!whitelist.is_allowed("uptime"));
    }

    #[test]
    fn test_match_mode_parse() {
        assert_eq!(MatchMode::parse("PREFIX"), Some(MatchMode::Prefix));
        assert_eq!(MatchMode::parse("exact"), Some(MatchMode::Exact));
        assert_eq!(MatchMode::parse("glob"), None);
    }
}
