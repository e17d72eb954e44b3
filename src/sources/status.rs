//! Client status slot.

use serde_json::{json, Value};

use super::read::{read_json, str_field, SourceError};
use crate::clock::Clock;
use crate::paths::AppPaths;

/// Read the settings file, falling back to the per-user copy.
///
/// When both reads fail the primary path's error is returned.
pub async fn read_settings(paths: &AppPaths) -> Result<Value, SourceError> {
    tracing::debug!(path = %paths.settings.display(), "Reading settings");
    let primary = match read_json(&paths.settings).await {
        Ok(settings) => return Ok(settings),
        Err(e) => e,
    };
    tracing::debug!(error = %primary, "Primary settings unavailable");

    if let Some(fallback) = &paths.fallback_settings {
        match read_json(fallback).await {
            Ok(settings) => {
                tracing::debug!(path = %fallback.display(), "Using fallback settings");
                return Ok(settings);
            }
            Err(e) => tracing::debug!(error = %e, "Fallback settings unavailable"),
        }
    }
    Err(primary)
}

/// Fixed projection of the settings file published in the status slot.
#[must_use]
pub fn settings_summary(settings: &Value) -> Value {
    let flag = |key: &str| settings.get(key).and_then(Value::as_bool).unwrap_or(false);
    let number = |key: &str, default: u64| {
        settings
            .get(key)
            .filter(|v| v.is_number())
            .cloned()
            .unwrap_or_else(|| json!(default))
    };

    json!({
        "userName": str_field(settings, "userName").unwrap_or("Not set"),
        "vcpServerUrl": str_field(settings, "vcpServerUrl").unwrap_or("Not set"),
        "vcpLogEnabled": str_field(settings, "vcpLogUrl").is_some()
            && str_field(settings, "vcpLogKey").is_some(),
        "distributedServerEnabled": flag("enableDistributedServer"),
        "assistantEnabled": flag("assistantEnabled"),
        "musicControlEnabled": flag("agentMusicControl"),
        "vcpToolInjectionEnabled": flag("enableVcpToolInjection"),
        "sidebarWidth": number("sidebarWidth", 260),
        "notificationsSidebarWidth": number("notificationsSidebarWidth", 300),
    })
}

fn hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn collect(paths: &AppPaths, clock: &Clock) -> Value {
    let (timestamp, display_time) = clock.stamp();
    let settings = match read_settings(paths).await {
        Ok(settings) => settings_summary(&settings),
        Err(e) => json!({ "error": format!("Cannot read settings file: {e}") }),
    };

    json!({
        "timestamp": timestamp,
        "displayTime": display_time,
        "clientStatus": "running",
        "timeZone": clock.timezone().name(),
        "system": {
            "version": env!("CARGO_PKG_VERSION"),
            "platform": std::env::consts::OS,
            "architecture": std::env::consts::ARCH,
            "pid": std::process::id(),
        },
        "nodeInfo": { "hostname": hostname() },
        "settings": settings,
    })
}
