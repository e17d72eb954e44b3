//! Watched resources and the events they produce.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths::AppPaths;
use crate::snapshot::Slot;
use crate::sources::SessionKind;

/// Logical name of a watched resource. At most one watch is active per name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Settings,
    Theme,
    Agents,
    UserData,
    AgentSession,
    GroupSession,
}

impl Resource {
    /// Resources whose target never moves.
    pub const STATIC: [Resource; 4] = [
        Resource::Settings,
        Resource::Theme,
        Resource::Agents,
        Resource::UserData,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Settings => "settings",
            Self::Theme => "theme",
            Self::Agents => "agents",
            Self::UserData => "userData",
            Self::AgentSession => "agentSession",
            Self::GroupSession => "groupSession",
        }
    }

    /// Quiet period a change must survive before the resource fires.
    ///
    /// Small config files settle slowly; histories fire sooner to keep the
    /// session slots responsive.
    #[must_use]
    pub fn debounce(self) -> DebounceParams {
        let ms = match self {
            Self::Settings | Self::Theme => 300,
            Self::Agents => 500,
            Self::UserData => 200,
            Self::AgentSession | Self::GroupSession => 150,
        };
        DebounceParams::new(Duration::from_millis(ms))
    }

    /// Slots recomputed when the resource fires.
    ///
    /// `UserData` recomputes nothing directly; it re-targets the session
    /// watches and the changed sessions' slots follow.
    #[must_use]
    pub fn slots(self) -> &'static [Slot] {
        match self {
            Self::Settings => &[Slot::Status, Slot::Theme],
            Self::Theme => &[Slot::Theme],
            Self::Agents => &[Slot::Agents],
            Self::UserData => &[],
            Self::AgentSession => &[Slot::SessionWatcher, Slot::SessionTimeElapsed],
            Self::GroupSession => &[Slot::GroupSessionWatcher],
        }
    }

    /// The resource tracking the active session of `kind`.
    #[must_use]
    pub fn session(kind: SessionKind) -> Self {
        match kind {
            SessionKind::Agent => Self::AgentSession,
            SessionKind::Group => Self::GroupSession,
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Debounce settings for one watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceParams {
    pub quiet_period: Duration,
}

impl DebounceParams {
    #[must_use]
    pub const fn new(quiet_period: Duration) -> Self {
        Self { quiet_period }
    }
}

/// What a watch is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    /// A single file, observed through its parent directory.
    File(PathBuf),
    /// A directory and everything below it.
    Tree(PathBuf),
}

impl WatchTarget {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) | Self::Tree(path) => path,
        }
    }

    /// Whether a changed path belongs to this target.
    #[must_use]
    pub fn covers(&self, changed: &Path) -> bool {
        match self {
            Self::File(path) => changed == path,
            Self::Tree(root) => changed.starts_with(root),
        }
    }
}

/// A complete watch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSpec {
    pub resource: Resource,
    pub target: WatchTarget,
    pub debounce: DebounceParams,
}

impl WatchSpec {
    #[must_use]
    pub fn new(resource: Resource, target: WatchTarget) -> Self {
        Self {
            resource,
            target,
            debounce: resource.debounce(),
        }
    }

    /// Watch on the active history file of `kind`.
    #[must_use]
    pub fn session(kind: SessionKind, history: PathBuf) -> Self {
        Self::new(Resource::session(kind), WatchTarget::File(history))
    }

    /// The fixed watches installed at startup.
    #[must_use]
    pub fn static_plan(paths: &AppPaths) -> Vec<Self> {
        vec![
            Self::new(Resource::Settings, WatchTarget::File(paths.settings.clone())),
            Self::new(Resource::Theme, WatchTarget::File(paths.theme_css.clone())),
            Self::new(Resource::Agents, WatchTarget::Tree(paths.agents_dir.clone())),
            Self::new(Resource::UserData, WatchTarget::Tree(paths.user_data.clone())),
        ]
    }
}

/// Identity of one installation of a watch.
///
/// Reinstalling a resource issues a new id, so events from the previous
/// installation can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub u64);

/// A raw filesystem notification posted by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub resource: Resource,
    pub watch_id: WatchId,
    pub paths: Vec<PathBuf>,
}
