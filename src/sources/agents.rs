//! Agent roster slot.

use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use serde_json::{json, Map, Value};

use super::read::{present, read_json, str_field};
use crate::clock::Clock;
use crate::paths::AppPaths;
use crate::session::AGENT_PREFIX;

/// Avatar file names probed in order.
pub const AVATAR_CANDIDATES: [&str; 7] = [
    "avatar.png",
    "avatar.jpg",
    "avatar.jpeg",
    "avatar.gif",
    "avatar.webp",
    "profile.png",
    "profile.jpg",
];

/// Avatar reported when no candidate exists.
pub const DEFAULT_AVATAR: &str = "assets/default_avatar.png";

const DEFAULT_TEMPERATURE: f64 = 0.5;

/// Config fields copied through only when the agent sets them.
const OPTIONAL_FIELDS: [(&str, &str); 10] = [
    ("streamOutput", "streamOutput"),
    ("ttsVoicePrimary", "ttsVoicePrimary"),
    ("ttsRegexPrimary", "ttsRegexPrimary"),
    ("ttsVoiceSecondary", "ttsVoiceSecondary"),
    ("ttsRegexSecondary", "ttsRegexSecondary"),
    ("ttsSpeed", "ttsSpeed"),
    ("avatarCalculatedColor", "avatarCalculatedColor"),
    ("top_p", "topP"),
    ("top_k", "topK"),
    ("uiCollapseStates", "uiCollapseStates"),
];

/// List `_Agent_*` directories under `agents_dir`, sorted by name.
pub async fn list_agent_dirs(agents_dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut entries = tokio::fs::read_dir(agents_dir).await?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.starts_with(AGENT_PREFIX) {
            continue;
        }
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            dirs.push((name, entry.path()));
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// First avatar file present in the agent folder.
pub async fn find_avatar(agent_dir: &Path) -> String {
    for candidate in AVATAR_CANDIDATES {
        let path = agent_dir.join(candidate);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return path.display().to_string();
        }
    }
    DEFAULT_AVATAR.to_string()
}

async fn created_at(config_path: &Path, clock: &Clock) -> Option<String> {
    let meta = tokio::fs::metadata(config_path).await.ok()?;
    let time = meta.created().or_else(|_| meta.modified()).ok()?;
    Some(clock.iso(time.into()))
}

/// Build one roster entry. Config failures are reported in the entry.
pub async fn read_agent(id: String, dir: PathBuf, clock: &Clock) -> Value {
    let config_path = dir.join("config.json");
    let avatar = find_avatar(&dir).await;
    let created = created_at(&config_path, clock).await;
    let config = match read_json(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            tracing::debug!(agent = %id, error = %e, "Agent config unreadable");
            return json!({
                "agentId": id,
                "folderPath": dir.display().to_string(),
                "name": id,
                "avatarPath": avatar,
                "createdAt": created,
                "topicsCount": 0,
                "error": format!("Cannot read agent config: {e}"),
            });
        }
    };

    let topics_count = config
        .get("topics")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    let mut entry = Map::new();
    entry.insert("agentId".into(), json!(id));
    entry.insert("folderPath".into(), json!(dir.display().to_string()));
    entry.insert(
        "name".into(),
        json!(str_field(&config, "name").unwrap_or(&id)),
    );
    entry.insert(
        "model".into(),
        json!(str_field(&config, "model").unwrap_or("Not set")),
    );
    entry.insert(
        "temperature".into(),
        present(&config, "temperature")
            .cloned()
            .unwrap_or_else(|| json!(DEFAULT_TEMPERATURE)),
    );
    for key in ["contextTokenLimit", "maxOutputTokens"] {
        entry.insert(
            key.into(),
            present(&config, key).cloned().unwrap_or(Value::Null),
        );
    }
    entry.insert("avatarPath".into(), json!(avatar));
    entry.insert("createdAt".into(), json!(created));
    entry.insert("topicsCount".into(), json!(topics_count));

    for (source, target) in OPTIONAL_FIELDS {
        if let Some(value) = present(&config, source) {
            entry.insert(target.into(), value.clone());
        }
    }
    Value::Object(entry)
}

pub async fn collect(paths: &AppPaths, clock: &Clock) -> Value {
    let (timestamp, display_time) = clock.stamp();

    let dirs = match list_agent_dirs(&paths.agents_dir).await {
        Ok(dirs) => dirs,
        Err(e) => {
            tracing::debug!(path = %paths.agents_dir.display(), error = %e, "Agents directory unavailable");
            return json!({
                "timestamp": timestamp,
                "displayTime": display_time,
                "error": format!("Cannot read agents directory {}: {e}", paths.agents_dir.display()),
                "totalCount": 0,
                "agents": [],
            });
        }
    };

    let agents = join_all(
        dirs.into_iter()
            .map(|(id, dir)| read_agent(id, dir, clock)),
    )
    .await;
    tracing::debug!(count = agents.len(), "Collected agents");

    json!({
        "timestamp": timestamp,
        "displayTime": display_time,
        "totalCount": agents.len(),
        "agents": agents,
        "lastUpdate": timestamp,
        "lastUpdateDisplay": clock.datetime(clock.now()),
    })
}
