//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";

/// Number of trailing messages published in the session watcher slots.
pub const DEFAULT_RECENT_MESSAGES: usize = 20;

/// Configuration for the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Write diagnostic logs to stderr.
    #[serde(default)]
    pub debug: bool,
    /// When false, every slot is published as the disabled marker.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Explicit chat client root directory.
    #[serde(default)]
    pub root_override: Option<PathBuf>,
    /// IANA timezone for display timestamps.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Trailing messages to include per active session.
    #[serde(default = "default_recent_messages")]
    pub recent_messages: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_recent_messages() -> usize {
    DEFAULT_RECENT_MESSAGES
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            enabled: default_enabled(),
            root_override: None,
            timezone: default_timezone(),
            recent_messages: default_recent_messages(),
        }
    }
}

/// Whether the viewer exits after one emission or stays resident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    OneShot,
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_config_defaults() {
        let config = ViewerConfig::default();
        assert!(!config.debug);
        assert!(config.enabled);
        assert!(config.root_override.is_none());
        assert_eq!(config.timezone, "Asia/Shanghai");
        assert_eq!(config.recent_messages, 20);
    }

    #[test]
    fn test_viewer_config_deserialize_partial() {
        let toml = r#"
            debug = true
            timezone = "Europe/Berlin"
        "#;
        let config: ViewerConfig = toml::from_str(toml).unwrap();
        assert!(config.debug);
        assert!(config.enabled);
        assert_eq!(config.timezone, "Europe/Berlin");
        assert_eq!(config.recent_messages, 20);
    }

    #[test]
    fn test_viewer_config_deserialize_root_override() {
        let toml = r#"
            enabled = false
            root_override = "/opt/chat"
        "#;
        let config: ViewerConfig = toml::from_str(toml).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.root_override, Some(PathBuf::from("/opt/chat")));
    }
}
