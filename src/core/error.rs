use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PacekeeperError>;

/// Error taxonomy for every pacekeeper operation. Fatal variants abort the
/// command; per-item variants are collected into outcome tallies by the
/// batch operations (sync, dedupe, remove) and surfaced in the summary.
#[derive(Debug, Error)]
pub enum PacekeeperError {
    #[error("no heartbeat config found (checked: {})", fmt_paths(.0))]
    ConfigNotFound(Vec<PathBuf>),

    #[error("failed to parse {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scheduler query failed: {0}")]
    ExternalQuery(String),

    #[error("create failed: {0}")]
    CreateFailed(String),

    #[error("failed to remove job {id}: {reason}")]
    RemoveFailed { id: String, reason: String },

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("heartbeat \"{0}\" must set exactly one of prompt or message")]
    MissingPayload(String),

    #[error("{0}")]
    Validation(String),

    #[error("cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("dashboard server error: {0}")]
    Server(String),

    #[error("{0}")]
    Usage(String),
}

fn fmt_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
