//! Most-recently-modified session file discovery.
//!
//! Histories live at `<root>/<owner>/topics/<topic>/history.<ext>`. A scan
//! walks every matching owner and topic, stats each history file and keeps
//! the newest one.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Directory-name predicate used at one level of the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameFilter {
    Any,
    Prefix(String),
}

impl NameFilter {
    #[must_use]
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
        }
    }
}

/// Directory prefix of agent owners.
pub const AGENT_PREFIX: &str = "_Agent_";
/// Directory prefix of group topics.
pub const GROUP_TOPIC_PREFIX: &str = "group_";
/// File stem of conversation history files.
pub const HISTORY_STEM: &str = "history";

/// What a recency scan looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecencyQuery {
    /// Filter on top-level owner directories.
    pub owner: NameFilter,
    /// Filter on directories under `<owner>/topics/`.
    pub topic: NameFilter,
    /// Stem the target file must have (any extension).
    pub file_stem: String,
}

impl RecencyQuery {
    /// `_Agent_*/topics/*/history.*`
    #[must_use]
    pub fn agent_sessions() -> Self {
        Self {
            owner: NameFilter::prefix(AGENT_PREFIX),
            topic: NameFilter::Any,
            file_stem: HISTORY_STEM.to_string(),
        }
    }

    /// `*/topics/group_*/history.*`
    #[must_use]
    pub fn group_sessions() -> Self {
        Self {
            owner: NameFilter::Any,
            topic: NameFilter::prefix(GROUP_TOPIC_PREFIX),
            file_stem: HISTORY_STEM.to_string(),
        }
    }

    fn matches_file(&self, path: &Path) -> bool {
        path.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem == self.file_stem)
            && path.extension().is_some()
    }
}

/// The single most recently touched conversation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPointer {
    /// Agent or group directory name.
    pub owner_id: String,
    /// Topic directory name.
    pub topic_id: String,
    pub file_path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

/// Outcome of a recency scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recency {
    Active(SessionPointer),
    None,
    Error(String),
}

impl Recency {
    #[must_use]
    pub fn pointer(&self) -> Option<&SessionPointer> {
        match self {
            Self::Active(pointer) => Some(pointer),
            Self::None | Self::Error(_) => None,
        }
    }

    /// Status tag as published in the slot.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Active(_) => "active",
            Self::None => "none",
            Self::Error(_) => "error",
        }
    }
}

/// Pick the candidate with the greatest modification time.
///
/// Ties keep the first candidate seen.
#[must_use]
pub fn select_most_recent<I>(candidates: I) -> Option<SessionPointer>
where
    I: IntoIterator<Item = SessionPointer>,
{
    let mut best: Option<SessionPointer> = None;
    for candidate in candidates {
        let newer = best
            .as_ref()
            .map_or(true, |current| candidate.modified > current.modified);
        if newer {
            best = Some(candidate);
        }
    }
    best
}

/// Scan `root` for the most recently modified file matching `query`.
///
/// A missing root yields [`Recency::None`]. Unreadable owners, topics and
/// files are skipped.
pub async fn find_most_recent(root: &Path, query: &RecencyQuery) -> Recency {
    let owners = match list_dirs(root, &query.owner).await {
        Ok(owners) => owners,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(root = %root.display(), "Session root does not exist");
            return Recency::None;
        }
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "Cannot read session root");
            return Recency::Error(format!("Cannot read {}: {e}", root.display()));
        }
    };

    let mut candidates = Vec::new();
    for (owner_id, owner_path) in owners {
        let topics_dir = owner_path.join("topics");
        let topics = match list_dirs(&topics_dir, &query.topic).await {
            Ok(topics) => topics,
            Err(e) => {
                tracing::trace!(path = %topics_dir.display(), error = %e, "Skipping owner");
                continue;
            }
        };

        for (topic_id, topic_path) in topics {
            for (file_path, metadata) in matching_files(&topic_path, query).await {
                let Ok(modified) = metadata.modified() else {
                    continue;
                };
                candidates.push(SessionPointer {
                    owner_id: owner_id.clone(),
                    topic_id: topic_id.clone(),
                    file_path,
                    modified,
                    size: metadata.len(),
                });
            }
        }
    }

    match select_most_recent(candidates) {
        Some(pointer) => {
            tracing::debug!(
                owner = %pointer.owner_id,
                topic = %pointer.topic_id,
                path = %pointer.file_path.display(),
                "Most recent session"
            );
            Recency::Active(pointer)
        }
        None => Recency::None,
    }
}

/// Child directories of `dir` whose names pass `filter`, in listing order.
async fn list_dirs(dir: &Path, filter: &NameFilter) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut dirs = Vec::new();

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::trace!(path = %dir.display(), error = %e, "Listing interrupted");
                break;
            }
        };
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };
        if filter.matches(&name) {
            dirs.push((name, entry.path()));
        }
    }

    Ok(dirs)
}

async fn matching_files(
    topic_dir: &Path,
    query: &RecencyQuery,
) -> Vec<(PathBuf, std::fs::Metadata)> {
    let Ok(mut entries) = tokio::fs::read_dir(topic_dir).await else {
        return Vec::new();
    };

    let mut files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if !query.matches_file(&path) {
            continue;
        }
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => files.push((path, metadata)),
            Ok(_) => {}
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "Skipping unreadable file");
            }
        }
    }
    files
}
