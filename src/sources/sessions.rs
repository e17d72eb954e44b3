//! Active-session slots: the agent and group session watchers and the
//! conversation timing summary.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::read::{read_history, read_json, str_field};
use crate::clock::{format_millis, from_millis, Clock};
use crate::paths::AppPaths;
use crate::session::{
    message_timestamps, segment_messages, Burst, Recency, RecencyQuery, SessionPointer, BURST_GAP_MS,
};

/// Which conversation family a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Agent,
    Group,
}

impl SessionKind {
    pub const ALL: [SessionKind; 2] = [SessionKind::Agent, SessionKind::Group];

    #[must_use]
    pub fn query(self) -> RecencyQuery {
        match self {
            Self::Agent => RecencyQuery::agent_sessions(),
            Self::Group => RecencyQuery::group_sessions(),
        }
    }

    fn owner_key(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Group => "group",
        }
    }

    fn owner_config(self, paths: &AppPaths, owner_id: &str) -> PathBuf {
        match self {
            Self::Agent => paths.agent_config(owner_id),
            Self::Group => paths.group_config(owner_id),
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.owner_key())
    }
}

/// Find the active session of `kind` under the user-data tree.
pub async fn locate(paths: &AppPaths, kind: SessionKind) -> Recency {
    let recency = crate::session::find_most_recent(&paths.user_data, &kind.query()).await;
    tracing::debug!(kind = %kind, status = recency.status(), "Located session");
    recency
}

/// Owner and topic display names from the owner's config, when readable.
async fn names(paths: &AppPaths, kind: SessionKind, pointer: &SessionPointer) -> (String, String) {
    let Ok(config) = read_json(&kind.owner_config(paths, &pointer.owner_id)).await else {
        return (pointer.owner_id.clone(), pointer.topic_id.clone());
    };

    let owner = str_field(&config, "name")
        .unwrap_or(&pointer.owner_id)
        .to_string();
    let topic = config
        .get("topics")
        .and_then(Value::as_array)
        .and_then(|topics| {
            topics
                .iter()
                .find(|t| t.get("id").and_then(Value::as_str) == Some(pointer.topic_id.as_str()))
        })
        .and_then(|t| str_field(t, "name"))
        .unwrap_or(&pointer.topic_id)
        .to_string();
    (owner, topic)
}

fn base(clock: &Clock, recency: &Recency) -> Value {
    let (timestamp, display_time) = clock.stamp();
    json!({
        "timestamp": timestamp,
        "displayTime": display_time,
        "status": recency.status(),
    })
}

/// Build the session watcher slot for an already located session.
pub async fn watcher_slot(
    paths: &AppPaths,
    clock: &Clock,
    kind: SessionKind,
    recency: &Recency,
    recent_messages: usize,
) -> Value {
    let mut slot = base(clock, recency);
    let pointer = match recency {
        Recency::Active(pointer) => pointer,
        Recency::None => {
            slot["message"] = json!(format!("No active {kind} session"));
            return slot;
        }
        Recency::Error(message) => {
            slot["error"] = json!(message);
            return slot;
        }
    };

    let (owner_name, topic_name) = names(paths, kind, pointer).await;
    let key = kind.owner_key();
    let modified: DateTime<Utc> = pointer.modified.into();

    slot[format!("{key}Id")] = json!(pointer.owner_id);
    slot[format!("{key}Name")] = json!(owner_name);
    slot["topicId"] = json!(pointer.topic_id);
    slot["topicName"] = json!(topic_name);
    slot["filePath"] = json!(pointer.file_path.display().to_string());
    slot["lastModified"] = json!(clock.iso(modified));
    slot["lastModifiedDisplay"] = json!(clock.datetime(modified));
    slot["size"] = json!(pointer.size);

    match read_history(&pointer.file_path).await {
        Ok(messages) => {
            let skip = messages.len().saturating_sub(recent_messages);
            slot["messageCount"] = json!(messages.len());
            slot["recentMessages"] = json!(&messages[skip..]);
        }
        Err(e) => {
            tracing::debug!(error = %e, "History unreadable");
            slot["error"] = json!(format!("Cannot read history: {e}"));
        }
    }
    slot
}

fn instant(clock: &Clock, ms: i64) -> Value {
    from_millis(ms).map_or(Value::Null, |at| json!(clock.iso(at)))
}

fn burst_json(clock: &Clock, burst: &Burst) -> Value {
    json!({
        "startIndex": burst.start_index,
        "endIndex": burst.end_index,
        "startTime": instant(clock, burst.start_time),
        "endTime": instant(clock, burst.end_time),
        "messageCount": burst.message_count,
        "durationMs": burst.duration,
        "durationDisplay": format_millis(burst.duration),
    })
}

/// Build the timing slot for an already located agent session.
pub async fn time_elapsed_slot(clock: &Clock, recency: &Recency) -> Value {
    let mut slot = base(clock, recency);
    let pointer = match recency {
        Recency::Active(pointer) => pointer,
        Recency::None => {
            slot["message"] = json!("No active agent session");
            return slot;
        }
        Recency::Error(message) => {
            slot["error"] = json!(message);
            return slot;
        }
    };

    slot["agentId"] = json!(pointer.owner_id);
    slot["topicId"] = json!(pointer.topic_id);

    let messages = match read_history(&pointer.file_path).await {
        Ok(messages) => messages,
        Err(e) => {
            slot["error"] = json!(format!("Cannot read history: {e}"));
            return slot;
        }
    };

    let timed = message_timestamps(&messages);
    let bursts = segment_messages(&timed, BURST_GAP_MS);
    let total_active = bursts
        .iter()
        .fold(0_i64, |total, b| total.saturating_add(b.duration));
    let now_ms = clock.now().timestamp_millis();

    slot["messageCount"] = json!(messages.len());
    slot["timedMessageCount"] = json!(timed.len());
    slot["burstCount"] = json!(bursts.len());
    slot["gapThresholdMinutes"] = json!(BURST_GAP_MS / 60_000);
    slot["totalActiveMs"] = json!(total_active);
    slot["totalActiveDisplay"] = json!(format_millis(total_active));
    slot["currentBurst"] = bursts
        .last()
        .map_or(Value::Null, |burst| burst_json(clock, burst));

    if let Some(last) = bursts.last() {
        let since = now_ms.saturating_sub(last.end_time);
        slot["lastMessageTime"] = instant(clock, last.end_time);
        slot["sinceLastMessageMs"] = json!(since);
        slot["sinceLastMessageDisplay"] = json!(format_millis(since));
    }
    slot["bursts"] = Value::Array(bursts.iter().map(|b| burst_json(clock, b)).collect());
    slot
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_history(paths: &AppPaths, owner: &str, topic: &str, body: &str) -> PathBuf {
        let dir = paths.user_data.join(owner).join("topics").join(topic);
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("history.json");
        std::fs::write(&file, body).unwrap();
        file
    }

    fn write_config(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn paths_in(temp: &TempDir) -> AppPaths {
        AppPaths::from_root(temp.path().to_path_buf())
    }

    #[tokio::test]
    async fn test_watcher_slot_active_agent() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        let messages: Vec<Value> = (0..5)
            .map(|i| json!({"role": "user", "content": format!("m{i}"), "timestamp": i}))
            .collect();
        write_history(&paths, "_Agent_1", "t1", &Value::Array(messages).to_string());
        write_config(
            &paths.agent_config("_Agent_1"),
            r#"{"name": "Nova", "topics": [{"id": "t1", "name": "Daily"}]}"#,
        );

        let recency = locate(&paths, SessionKind::Agent).await;
        let slot = watcher_slot(&paths, &Clock::default(), SessionKind::Agent, &recency, 2).await;

        assert_eq!(slot["status"], "active");
        assert_eq!(slot["agentId"], "_Agent_1");
        assert_eq!(slot["agentName"], "Nova");
        assert_eq!(slot["topicName"], "Daily");
        assert_eq!(slot["messageCount"], 5);
        let recent = slot["recentMessages"].as_array().unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1]["content"], "m4");
    }

    #[tokio::test]
    async fn test_watcher_slot_group_uses_group_config() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        write_history(&paths, "team", "group_42", "[]");
        write_config(&paths.group_config("team"), r#"{"name": "Team"}"#);

        let recency = locate(&paths, SessionKind::Group).await;
        let slot = watcher_slot(&paths, &Clock::default(), SessionKind::Group, &recency, 20).await;

        assert_eq!(slot["groupId"], "team");
        assert_eq!(slot["groupName"], "Team");
        assert_eq!(slot["topicName"], "group_42");
        assert_eq!(slot["messageCount"], 0);
    }

    #[tokio::test]
    async fn test_watcher_slot_none() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        let slot = watcher_slot(&paths, &Clock::default(), SessionKind::Agent, &Recency::None, 20).await;
        assert_eq!(slot["status"], "none");
        assert!(slot.get("agentId").is_none());
    }

    #[tokio::test]
    async fn test_watcher_slot_bad_history_keeps_pointer() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        write_history(&paths, "_Agent_1", "t1", "{broken");

        let recency = locate(&paths, SessionKind::Agent).await;
        let slot = watcher_slot(&paths, &Clock::default(), SessionKind::Agent, &recency, 20).await;
        assert_eq!(slot["status"], "active");
        assert_eq!(slot["agentName"], "_Agent_1");
        assert!(slot["error"].as_str().unwrap().starts_with("Cannot read history"));
    }

    #[tokio::test]
    async fn test_time_elapsed_slot_bursts() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        let minute = 60_000;
        let body = json!([
            {"role": "user", "timestamp": 0},
            {"role": "assistant", "timestamp": 10 * minute},
            {"role": "system"},
            {"role": "user", "timestamp": 50 * minute},
        ]);
        write_history(&paths, "_Agent_1", "t1", &body.to_string());

        let recency = locate(&paths, SessionKind::Agent).await;
        let slot = time_elapsed_slot(&Clock::default(), &recency).await;

        assert_eq!(slot["messageCount"], 4);
        assert_eq!(slot["timedMessageCount"], 3);
        assert_eq!(slot["burstCount"], 2);
        assert_eq!(slot["gapThresholdMinutes"], 30);
        assert_eq!(slot["totalActiveMs"], 10 * minute);
        assert_eq!(slot["currentBurst"]["startIndex"], 3);
        assert_eq!(slot["currentBurst"]["endIndex"], 3);
        assert_eq!(slot["bursts"][0]["endIndex"], 1);
        assert_eq!(slot["currentBurst"]["durationDisplay"], "0s");
        assert_eq!(slot["bursts"][0]["durationDisplay"], "10m 0s");
        assert!(slot["sinceLastMessageMs"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_time_elapsed_slot_survives_extreme_timestamps() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        let body = r#"[{"timestamp": 1e19}, {"timestamp": -1e19}, {"role": "user", "timestamp": 1000}]"#;
        write_history(&paths, "_Agent_1", "t1", body);

        let recency = locate(&paths, SessionKind::Agent).await;
        let slot = time_elapsed_slot(&Clock::default(), &recency).await;
        assert_eq!(slot["messageCount"], 3);
        assert_eq!(slot["timedMessageCount"], 1);
        assert_eq!(slot["burstCount"], 1);
        assert_eq!(slot["currentBurst"]["startIndex"], 2);
    }

    #[tokio::test]
    async fn test_time_elapsed_slot_empty_history() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        write_history(&paths, "_Agent_1", "t1", "[]");

        let recency = locate(&paths, SessionKind::Agent).await;
        let slot = time_elapsed_slot(&Clock::default(), &recency).await;
        assert_eq!(slot["burstCount"], 0);
        assert!(slot["currentBurst"].is_null());
        assert!(slot.get("sinceLastMessageMs").is_none());
    }

    #[tokio::test]
    async fn test_time_elapsed_slot_scan_error() {
        let slot = time_elapsed_slot(&Clock::default(), &Recency::Error("denied".into())).await;
        assert_eq!(slot["status"], "error");
        assert_eq!(slot["error"], "denied");
    }
}
