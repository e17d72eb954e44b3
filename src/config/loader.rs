//! Configuration file loader.
//!
//! Settings come from an optional TOML file and are then overridden by the
//! environment variables the plugin host passes to its children.

use std::path::PathBuf;

use super::types::ViewerConfig;

/// Environment variable enabling diagnostic logs.
pub const ENV_DEBUG: &str = "DebugMode";
/// Environment variable toggling the whole viewer.
pub const ENV_ENABLED: &str = "Enabled";
/// Environment variable overriding the chat client root.
pub const ENV_ROOT: &str = "VCPChatRoot";
/// Environment variable selecting the display timezone.
pub const ENV_TIMEZONE: &str = "TimeZone";
/// Environment variable for the trailing message count.
pub const ENV_RECENT_MESSAGES: &str = "RecentMessages";

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: chatroom-viewer.toml
        search_paths.push(PathBuf::from("chatroom-viewer.toml"));

        // 2. User config directory: ~/.config/chatroom-viewer/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("chatroom-viewer").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load the file layer, then apply the process environment on top.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load(&self) -> Result<ViewerConfig, ConfigError> {
        let mut config = self.load_file()?;
        apply_env(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load_file(&self) -> Result<ViewerConfig, ConfigError> {
        match self.find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::load_from_path(&path)
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(ViewerConfig::default())
            }
        }
    }

    fn load_from_path(path: &PathBuf) -> Result<ViewerConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|p| p.exists()).cloned()
    }
}

/// Overlay environment values onto `config`.
///
/// Boolean flags follow the host convention: only a case-insensitive
/// `"true"` turns a flag on, anything else turns it off. Empty strings are
/// treated as unset.
pub fn apply_env<F>(config: &mut ViewerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(value) = get(ENV_DEBUG) {
        config.debug = is_true(&value);
    }
    if let Some(value) = get(ENV_ENABLED) {
        config.enabled = is_true(&value);
    }
    if let Some(value) = get(ENV_ROOT) {
        config.root_override = Some(PathBuf::from(value));
    }
    if let Some(value) = get(ENV_TIMEZONE) {
        config.timezone = value.trim().to_string();
    }
    if let Some(value) = get(ENV_RECENT_MESSAGES) {
        match value.trim().parse() {
            Ok(n) => config.recent_messages = n,
            Err(_) => tracing::warn!(value = %value, "Ignoring invalid {ENV_RECENT_MESSAGES}"),
        }
    }
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_loader_default_paths() {
        let loader = ConfigLoader::new();
        assert!(!loader.search_paths().is_empty());
        assert!(loader.search_paths()[0].ends_with("chatroom-viewer.toml"));
    }

    #[test]
    fn test_config_loader_returns_defaults_when_no_file() {
        let loader = ConfigLoader::with_path(PathBuf::from("/nonexistent/path.toml"));
        let config = loader.load_file().unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_config_loader_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "debug = true\nrecent_messages = 5\n").unwrap();

        let config = ConfigLoader::with_path(path).load_file().unwrap();
        assert!(config.debug);
        assert_eq!(config.recent_messages, 5);
    }

    #[test]
    fn test_config_loader_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "debug = [not toml").unwrap();

        let result = ConfigLoader::with_path(path).load_file();
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_apply_env_overrides_everything() {
        let mut config = ViewerConfig::default();
        apply_env(
            &mut config,
            lookup(&[
                ("DebugMode", "TRUE"),
                ("Enabled", "false"),
                ("VCPChatRoot", "/srv/chat"),
                ("TimeZone", "UTC"),
                ("RecentMessages", "3"),
            ]),
        );

        assert!(config.debug);
        assert!(!config.enabled);
        assert_eq!(config.root_override, Some(PathBuf::from("/srv/chat")));
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.recent_messages, 3);
    }

    #[test]
    fn test_apply_env_non_true_disables() {
        let mut config = ViewerConfig::default();
        apply_env(&mut config, lookup(&[("Enabled", "yes")]));
        assert!(!config.enabled);
    }

    #[test]
    fn test_apply_env_ignores_empty_and_invalid() {
        let mut config = ViewerConfig::default();
        apply_env(
            &mut config,
            lookup(&[("VCPChatRoot", "  "), ("RecentMessages", "many")]),
        );
        assert!(config.root_override.is_none());
        assert_eq!(config.recent_messages, 20);
    }
}
