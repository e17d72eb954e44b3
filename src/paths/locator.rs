//! Chat client root discovery.

use std::path::{Path, PathBuf};

/// Number of ancestors between the install directory and the client root.
///
/// The viewer is installed as `<root>/VCPDistributedServer/Plugin/<name>/`.
pub const INSTALL_DEPTH: usize = 3;

/// Resolves the chat client's root data directory.
#[derive(Debug, Clone)]
pub struct DirectoryLocator {
    root_override: Option<PathBuf>,
    anchor: PathBuf,
}

impl DirectoryLocator {
    /// Create a locator anchored at an explicit install directory.
    #[must_use]
    pub fn new(root_override: Option<PathBuf>, anchor: PathBuf) -> Self {
        Self {
            root_override,
            anchor,
        }
    }

    /// Create a locator anchored at the directory holding the running binary.
    ///
    /// Falls back to the working directory, then to `.`, when the
    /// executable path cannot be determined.
    #[must_use]
    pub fn from_current_exe(root_override: Option<PathBuf>) -> Self {
        let anchor = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root_override, anchor)
    }

    /// Return the root directory.
    ///
    /// Never fails: a path that does not exist is returned as-is and
    /// readers surface the missing file instead.
    #[must_use]
    pub fn locate(&self) -> PathBuf {
        if let Some(root) = &self.root_override {
            tracing::debug!(root = %root.display(), "Using configured root");
            return root.clone();
        }

        let root = self
            .anchor
            .ancestors()
            .nth(INSTALL_DEPTH)
            .unwrap_or(&self.anchor)
            .to_path_buf();
        tracing::debug!(
            anchor = %self.anchor.display(),
            root = %root.display(),
            "Inferred root from install location"
        );
        root
    }
}

/// Every on-disk location the viewer reads, derived from one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    pub app_data: PathBuf,
    pub settings: PathBuf,
    pub fallback_settings: Option<PathBuf>,
    pub theme_css: PathBuf,
    pub themes_dir: PathBuf,
    pub theme_assets_dir: PathBuf,
    pub agents_dir: PathBuf,
    pub groups_dir: PathBuf,
    pub user_data: PathBuf,
}

impl AppPaths {
    /// Derive all locations from `root`.
    #[must_use]
    pub fn from_root(root: PathBuf) -> Self {
        let app_data = root.join("AppData");
        Self {
            settings: app_data.join("settings.json"),
            fallback_settings: dirs::home_dir().map(|h| h.join("VCPChat").join("settings.json")),
            theme_css: root.join("styles").join("themes.css"),
            themes_dir: root.join("styles").join("themes"),
            theme_assets_dir: root.join("public").join("assets").join("themes"),
            agents_dir: app_data.join("Agents"),
            groups_dir: app_data.join("AgentGroups"),
            user_data: app_data.join("UserData"),
            app_data,
            root,
        }
    }

    /// Path of an agent's config file.
    #[must_use]
    pub fn agent_config(&self, agent_id: &str) -> PathBuf {
        self.agents_dir.join(agent_id).join("config.json")
    }

    /// Path of a group's config file.
    #[must_use]
    pub fn group_config(&self, group_id: &str) -> PathBuf {
        self.groups_dir.join(group_id).join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_is_returned_verbatim() {
        let locator = DirectoryLocator::new(
            Some(PathBuf::from("relative/root")),
            PathBuf::from("/a/b/c/d"),
        );
        assert_eq!(locator.locate(), PathBuf::from("relative/root"));
    }

    #[test]
    fn test_root_inferred_three_levels_up() {
        let locator = DirectoryLocator::new(
            None,
            PathBuf::from("/home/u/VCPChat/VCPDistributedServer/Plugin/ChatRoomViewer"),
        );
        assert_eq!(locator.locate(), PathBuf::from("/home/u/VCPChat"));
    }

    #[test]
    fn test_shallow_anchor_does_not_fail() {
        let locator = DirectoryLocator::new(None, PathBuf::from("/plugin"));
        // "/plugin" has only two ancestors, so the anchor itself is used.
        assert_eq!(locator.locate(), PathBuf::from("/plugin"));
    }

    #[test]
    fn test_from_current_exe_resolves_something() {
        let locator = DirectoryLocator::from_current_exe(None);
        assert!(!locator.locate().as_os_str().is_empty());
    }

    #[test]
    fn test_app_paths_layout() {
        let paths = AppPaths::from_root(PathBuf::from("/chat"));
        assert_eq!(paths.settings, PathBuf::from("/chat/AppData/settings.json"));
        assert_eq!(paths.theme_css, PathBuf::from("/chat/styles/themes.css"));
        assert_eq!(paths.agents_dir, PathBuf::from("/chat/AppData/Agents"));
        assert_eq!(paths.user_data, PathBuf::from("/chat/AppData/UserData"));
        assert_eq!(
            paths.group_config("g1"),
            PathBuf::from("/chat/AppData/AgentGroups/g1/config.json")
        );
        assert_eq!(
            paths.agent_config("_Agent_1_2"),
            PathBuf::from("/chat/AppData/Agents/_Agent_1_2/config.json")
        );
    }
}
