//! File reads shared by the slot collectors.

use std::path::{Path, PathBuf};

use serde_json::Value;

/// A collector input could not be read or decoded.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file decoded to an unexpected shape.
    #[error("Unexpected content in {path}: {reason}")]
    Shape { path: PathBuf, reason: &'static str },
}

impl SourceError {
    /// True when the underlying file simply does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

pub async fn read_text(path: &Path) -> Result<String, SourceError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })
}

pub async fn read_json(path: &Path) -> Result<Value, SourceError> {
    let content = read_text(path).await?;
    serde_json::from_str(&content).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a history file as a list of opaque messages.
pub async fn read_history(path: &Path) -> Result<Vec<Value>, SourceError> {
    match read_json(path).await? {
        Value::Array(messages) => Ok(messages),
        _ => Err(SourceError::Shape {
            path: path.to_path_buf(),
            reason: "history is not an array",
        }),
    }
}

/// Look up a string field, treating empty strings as missing.
#[must_use]
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Look up a field that is present and not null.
#[must_use]
pub fn present<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}
