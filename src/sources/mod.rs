//! Slot collectors: read application state from disk and shape it into slot values.

mod agents;
mod bubble;
mod read;
mod sessions;
mod status;
mod theme;

pub use agents::{find_avatar, list_agent_dirs, read_agent, AVATAR_CANDIDATES, DEFAULT_AVATAR};
pub use bubble::BUBBLE_TIP;
pub use read::{read_history, read_json, read_text, SourceError};
pub use sessions::{locate, time_elapsed_slot, watcher_slot, SessionKind};
pub use status::{read_settings, settings_summary};
pub use theme::{parse_theme_config, parse_theme_css, ThemeInfo, UNKNOWN_COLOR};

use async_trait::async_trait;

use crate::clock::Clock;
use crate::paths::AppPaths;
use crate::session::Recency;
use crate::snapshot::{Slot, SlotValue};

/// Computes slot values and locates active sessions.
///
/// Implementations must contain their own failures: a collector reports
/// problems inside the returned value rather than failing the call.
#[async_trait]
pub trait SlotCollector: Send + Sync {
    /// Recompute one slot from scratch.
    async fn collect(&self, slot: Slot) -> SlotValue;

    /// Run the recency scan for one session family.
    async fn locate_session(&self, kind: SessionKind) -> Recency;
}

/// Collector backed by the application's data directory.
#[derive(Debug, Clone)]
pub struct FsCollector {
    paths: AppPaths,
    clock: Clock,
    recent_messages: usize,
}

impl FsCollector {
    #[must_use]
    pub fn new(paths: AppPaths, clock: Clock, recent_messages: usize) -> Self {
        Self {
            paths,
            clock,
            recent_messages,
        }
    }

    #[must_use]
    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }
}

#[async_trait]
impl SlotCollector for FsCollector {
    async fn collect(&self, slot: Slot) -> SlotValue {
        tracing::debug!(slot = %slot, "Collecting slot");
        let paths = &self.paths;
        let clock = &self.clock;

        let value = match slot {
            Slot::Status => status::collect(paths, clock).await,
            Slot::Theme => theme::collect(paths, clock).await,
            Slot::Agents => agents::collect(paths, clock).await,
            Slot::ModeBubbleTip => bubble::collect(clock),
            Slot::SessionWatcher => {
                let recency = self.locate_session(SessionKind::Agent).await;
                watcher_slot(paths, clock, SessionKind::Agent, &recency, self.recent_messages)
                    .await
            }
            Slot::GroupSessionWatcher => {
                let recency = self.locate_session(SessionKind::Group).await;
                watcher_slot(paths, clock, SessionKind::Group, &recency, self.recent_messages)
                    .await
            }
            Slot::SessionTimeElapsed => {
                let recency = self.locate_session(SessionKind::Agent).await;
                time_elapsed_slot(clock, &recency).await
            }
        };
        SlotValue::Structured(value)
    }

    async fn locate_session(&self, kind: SessionKind) -> Recency {
        locate(&self.paths, kind).await
    }
}
