//! End-to-end one-shot runs against an on-disk chat client tree.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tempfile::TempDir;

use chatroom_viewer::clock::Clock;
use chatroom_viewer::config::{apply_env, ViewerConfig};
use chatroom_viewer::paths::{AppPaths, DirectoryLocator};
use chatroom_viewer::snapshot::Slot;
use chatroom_viewer::sources::FsCollector;
use chatroom_viewer::viewer::{RunStatus, Viewer};

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Build a small client tree: settings, a theme, two agents and one history each.
fn seed(root: &Path) -> AppPaths {
    let paths = AppPaths::from_root(root.to_path_buf());
    write(
        &paths.settings,
        r#"{"userName": "Ada", "currentThemeMode": "light", "currentTheme": "paper"}"#,
    );
    write(
        &paths.theme_css,
        "/* Paper Theme */\n:root { --primary-bg: #fafafa; --chat-wallpaper-light: url(p.png); }",
    );
    write(
        &paths.agent_config("_Agent_1"),
        r#"{"name": "Nova", "model": "m1", "topics": [{"id": "t1", "name": "Morning"}]}"#,
    );
    write(&paths.agent_config("_Agent_2"), r#"{"name": "Orion"}"#);
    write(
        &paths.group_config("team"),
        r#"{"name": "Team", "topics": [{"id": "group_1", "name": "Standup"}]}"#,
    );
    write(
        &paths
            .user_data
            .join("_Agent_1/topics/t1/history.json"),
        r#"[{"role": "user", "name": "Ada", "content": "hi", "timestamp": 1700000000000},
            {"role": "assistant", "name": "Nova", "content": "hello", "timestamp": 1700000060000}]"#,
    );
    write(
        &paths.user_data.join("team/topics/group_1/history.json"),
        r#"[{"role": "user", "content": "sync?", "timestamp": 1700000000000}]"#,
    );
    paths
}

fn slot(doc: &Map<String, Value>, slot: Slot) -> Value {
    serde_json::from_str(doc[slot.token()].as_str().unwrap()).unwrap()
}

async fn run_once(paths: AppPaths) -> (RunStatus, Map<String, Value>) {
    let mut paths = paths;
    paths.fallback_settings = None;
    let collector = Arc::new(FsCollector::new(paths, Clock::new("UTC"), 20));
    let mut viewer = Viewer::new(collector, Vec::new());
    let status = viewer.run_once().await.unwrap();
    let output = String::from_utf8(viewer.into_output()).unwrap();
    assert_eq!(output.lines().count(), 1);
    (status, serde_json::from_str(output.trim_end()).unwrap())
}

#[tokio::test]
async fn test_one_shot_over_client_tree() {
    let temp = TempDir::new().unwrap();
    let (status, doc) = run_once(seed(temp.path())).await;

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(doc.len(), 7);

    let status_slot = slot(&doc, Slot::Status);
    assert_eq!(status_slot["settings"]["userName"], "Ada");
    assert_eq!(status_slot["timeZone"], "UTC");

    let theme = slot(&doc, Slot::Theme);
    assert_eq!(theme["currentTheme"], "Paper");
    assert_eq!(theme["mode"], "light");
    assert_eq!(theme["wallpaper"]["current"], "url(p.png)");

    let agents = slot(&doc, Slot::Agents);
    assert_eq!(agents["totalCount"], 2);
    assert_eq!(agents["agents"][0]["name"], "Nova");
    assert_eq!(agents["agents"][0]["agentId"], "_Agent_1");

    let session = slot(&doc, Slot::SessionWatcher);
    assert_eq!(session["status"], "active");
    assert_eq!(session["agentName"], "Nova");
    assert_eq!(session["topicName"], "Morning");
    assert_eq!(session["messageCount"], 2);

    let group = slot(&doc, Slot::GroupSessionWatcher);
    assert_eq!(group["groupName"], "Team");
    assert_eq!(group["topicName"], "Standup");

    let elapsed = slot(&doc, Slot::SessionTimeElapsed);
    assert_eq!(elapsed["burstCount"], 1);
    assert_eq!(elapsed["totalActiveMs"], 60_000);
    assert_eq!(elapsed["currentBurst"]["durationDisplay"], "1m 0s");

    assert!(slot(&doc, Slot::ModeBubbleTip)["content"].is_string());
}

#[tokio::test]
async fn test_empty_root_still_emits_every_slot() {
    let temp = TempDir::new().unwrap();
    let (status, doc) = run_once(AppPaths::from_root(temp.path().to_path_buf())).await;

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(doc.len(), 7);
    assert!(slot(&doc, Slot::Status)["settings"]["error"].is_string());
    assert!(slot(&doc, Slot::Theme)["error"].is_string());
    assert!(slot(&doc, Slot::Agents)["error"].is_string());
    assert_eq!(slot(&doc, Slot::SessionWatcher)["status"], "none");
    assert_eq!(slot(&doc, Slot::GroupSessionWatcher)["status"], "none");
}

#[test]
fn test_root_override_from_environment() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_string_lossy().into_owned();

    let mut config = ViewerConfig::default();
    apply_env(&mut config, |key| (key == "VCPChatRoot").then(|| root.clone()));

    let located = DirectoryLocator::from_current_exe(config.root_override).locate();
    assert_eq!(located, temp.path());
}

#[tokio::test]
async fn test_extreme_history_timestamps_keep_other_slots() {
    let temp = TempDir::new().unwrap();
    let paths = seed(temp.path());
    write(
        &paths.user_data.join("_Agent_1/topics/t1/history.json"),
        r#"[{"role": "user", "timestamp": 1e19}, {"role": "user", "timestamp": -1e19}]"#,
    );
    let (status, doc) = run_once(paths).await;

    assert_eq!(status, RunStatus::Completed);
    let elapsed = slot(&doc, Slot::SessionTimeElapsed);
    assert_eq!(elapsed["messageCount"], 2);
    assert_eq!(elapsed["burstCount"], 0);
    assert_eq!(slot(&doc, Slot::Agents)["totalCount"], 2);
    assert_eq!(slot(&doc, Slot::Theme)["currentTheme"], "Paper");
}
