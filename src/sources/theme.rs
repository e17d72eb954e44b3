//! Active theme slot.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};

use super::read::{read_json, read_text, str_field, SourceError};
use super::status::read_settings;
use crate::clock::Clock;
use crate::paths::AppPaths;

/// Placeholder for colours the stylesheet does not define.
pub const UNKNOWN_COLOR: &str = "#unknown";

static THEME_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/\*[\s\S]*?([^*/]+)\s*Theme[\s\S]*?\*/").expect("valid theme name regex")
});

static CSS_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--([\w-]+):\s*([^;]+);").expect("valid css variable regex"));

/// What the viewer extracts from a theme definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeInfo {
    pub name: String,
    pub is_dark_mode: bool,
    /// Custom properties without the leading `--`.
    pub variables: BTreeMap<String, String>,
}

impl ThemeInfo {
    fn var(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    fn color(&self, name: &str) -> &str {
        self.var(name).unwrap_or(UNKNOWN_COLOR)
    }
}

/// Mode requested by the settings file, if any.
fn settings_dark_mode(settings: Option<&Value>) -> Option<bool> {
    settings
        .and_then(|s| str_field(s, "currentThemeMode"))
        .map(|mode| mode == "dark")
}

/// Parse a stylesheet.
///
/// The settings file's `currentThemeMode` decides dark mode; without it a
/// stylesheet that styles `body.light-theme` is taken as light.
#[must_use]
pub fn parse_theme_css(css: &str, settings: Option<&Value>) -> ThemeInfo {
    let is_dark_mode =
        settings_dark_mode(settings).unwrap_or_else(|| !css.contains("body.light-theme"));

    let name = THEME_NAME
        .captures(css)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Current theme".to_string());

    let variables = CSS_VARIABLE
        .captures_iter(css)
        .map(|c| (c[1].to_string(), c[2].trim().to_string()))
        .collect();

    ThemeInfo {
        name,
        is_dark_mode,
        variables,
    }
}

/// Interpret a `theme.config.json` document.
#[must_use]
pub fn parse_theme_config(config: &Value, settings: Option<&Value>) -> ThemeInfo {
    let mut variables = BTreeMap::new();
    for section in ["colors", "wallpaper"] {
        if let Some(map) = config.get(section).and_then(Value::as_object) {
            for (key, value) in map {
                if let Some(text) = value.as_str() {
                    variables.insert(key.trim_start_matches("--").to_string(), text.to_string());
                }
            }
        }
    }

    ThemeInfo {
        name: str_field(config, "name")
            .unwrap_or("Current theme")
            .to_string(),
        is_dark_mode: settings_dark_mode(settings)
            .or_else(|| config.get("isDarkMode").and_then(Value::as_bool))
            .unwrap_or(true),
        variables,
    }
}

/// A loaded theme and where it came from.
#[derive(Debug)]
struct LoadedTheme {
    info: ThemeInfo,
    source: PathBuf,
    css: Option<String>,
}

/// Candidate locations for a named theme.
fn named_theme_paths(paths: &AppPaths, name: &str) -> Vec<PathBuf> {
    vec![
        paths.themes_dir.join(format!("themes{name}.css")),
        paths.themes_dir.join(format!("{name}.css")),
        paths.theme_assets_dir.join(name).join("theme.config.json"),
    ]
}

async fn load_theme(paths: &AppPaths, settings: Option<&Value>) -> Result<LoadedTheme, SourceError> {
    let active_error = match read_text(&paths.theme_css).await {
        Ok(css) => {
            return Ok(LoadedTheme {
                info: parse_theme_css(&css, settings),
                source: paths.theme_css.clone(),
                css: Some(css),
            })
        }
        Err(e) => e,
    };
    tracing::debug!(error = %active_error, "Active stylesheet unavailable");

    let Some(name) = settings.and_then(|s| str_field(s, "currentTheme")) else {
        return Err(active_error);
    };

    for candidate in named_theme_paths(paths, name) {
        tracing::debug!(path = %candidate.display(), "Trying named theme");
        let is_json = candidate.extension().is_some_and(|ext| ext == "json");
        let loaded = if is_json {
            read_json(&candidate).await.map(|config| LoadedTheme {
                info: parse_theme_config(&config, settings),
                source: candidate.clone(),
                css: None,
            })
        } else {
            read_text(&candidate).await.map(|css| LoadedTheme {
                info: parse_theme_css(&css, settings),
                source: candidate.clone(),
                css: Some(css),
            })
        };
        match loaded {
            Ok(theme) => return Ok(theme),
            Err(e) => tracing::trace!(error = %e, "Named theme candidate failed"),
        }
    }

    Err(active_error)
}

pub async fn collect(paths: &AppPaths, clock: &Clock) -> Value {
    let (timestamp, display_time) = clock.stamp();
    let settings = read_settings(paths).await.ok();

    let mut slot = match load_theme(paths, settings.as_ref()).await {
        Ok(theme) => theme_json(&theme),
        Err(e) => json!({ "error": format!("Cannot read theme: {e}") }),
    };

    slot["timestamp"] = json!(timestamp);
    slot["displayTime"] = json!(display_time);
    if let Some(name) = settings.as_ref().and_then(|s| str_field(s, "currentTheme")) {
        slot["settingsTheme"] = json!(name);
    }
    slot
}

fn theme_json(theme: &LoadedTheme) -> Value {
    let info = &theme.info;
    let dark = info.var("chat-wallpaper-dark");
    let light = info.var("chat-wallpaper-light");

    json!({
        "currentTheme": info.name,
        "mode": if info.is_dark_mode { "dark" } else { "light" },
        "isDarkMode": info.is_dark_mode,
        "colors": {
            "primaryBg": info.color("primary-bg"),
            "secondaryBg": info.color("secondary-bg"),
            "primaryText": info.color("primary-text"),
            "highlightText": info.color("highlight-text"),
            "borderColor": info.color("border-color"),
        },
        "wallpaper": {
            "current": if info.is_dark_mode { dark } else { light },
            "dark": dark,
            "light": light,
        },
        "variables": info.variables,
        "source": theme.source.display().to_string(),
        "fullCSS": theme.css,
    })
}
