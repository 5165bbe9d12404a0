use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{PacekeeperError, Result};

pub const DEFAULT_CONFIG_ARG: &str = "pacekeeper.yaml";

/// The declarative file. Unknown keys at every level ride along in the
/// flattened maps so a rewrite never drops user content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartbeatFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Defaults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeats: Option<Vec<Heartbeat>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub heartbeats_completed: Vec<CompletedHeartbeat>,
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Heartbeat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        rename = "sessionTarget",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub session_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(
        rename = "deleteAfterRun",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub delete_after_run: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

impl Heartbeat {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    pub fn schedule_str(&self) -> &str {
        self.schedule.as_deref().unwrap_or("")
    }

    /// One-shots are declared with the `at <datetime>` schedule marker.
    pub fn is_one_shot(&self) -> bool {
        self.schedule_str().starts_with("at ")
    }
}

/// A heartbeat moved to the completed ledger once its one-shot fired.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletedHeartbeat {
    #[serde(flatten)]
    pub heartbeat: Heartbeat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// ~/.pacekeeper/pacekeeper.yaml
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pacekeeper")
        .join(DEFAULT_CONFIG_ARG)
}

/// Paths probed by [`find_config_path`], for error reporting.
pub fn config_search_paths(explicit: &str) -> Vec<PathBuf> {
    vec![PathBuf::from(explicit), default_config_path()]
}

/// The explicit argument wins when that file exists (the CLI default is
/// ./pacekeeper.yaml, so the working directory is covered); otherwise fall
/// back to the home config.
pub fn find_config_path(explicit: &str) -> Option<PathBuf> {
    let candidate = PathBuf::from(explicit);
    if candidate.exists() {
        return Some(candidate);
    }
    let home = default_config_path();
    if home.exists() {
        return Some(home);
    }
    None
}

/// find_config_path, but fatal with the full checked list when nothing is
/// found. Used by commands that cannot proceed without a file.
pub fn require_config_path(explicit: &str) -> Result<PathBuf> {
    find_config_path(explicit)
        .ok_or_else(|| PacekeeperError::ConfigNotFound(config_search_paths(explicit)))
}

/// Where a writing command (import) should put the file. A non-default
/// explicit argument always wins, even when the file does not exist yet;
/// otherwise an existing working-directory file, then the home config.
pub fn resolve_write_path(explicit: &str) -> PathBuf {
    if explicit != DEFAULT_CONFIG_ARG {
        return PathBuf::from(explicit);
    }
    let cwd = PathBuf::from(DEFAULT_CONFIG_ARG);
    if cwd.exists() {
        return cwd;
    }
    default_config_path()
}

pub fn load(path: &Path) -> Result<HeartbeatFile> {
    let raw = fs::read_to_string(path).map_err(|source| PacekeeperError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| PacekeeperError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save(path: &Path, file: &HeartbeatFile) -> Result<()> {
    let rendered = render(path, file)?;
    write_raw(path, &rendered)
}

/// Serialize the document body. Import prepends a provenance header before
/// writing, so this is separate from [`save`].
pub fn render(path: &Path, file: &HeartbeatFile) -> Result<String> {
    serde_yaml::to_string(file).map_err(|source| PacekeeperError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write file content verbatim (import/init prepend provenance headers).
pub fn write_raw(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| PacekeeperError::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, content).map_err(|source| PacekeeperError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"# my heartbeats
defaults:
  timezone: America/New_York

heartbeats:
  - name: Morning Briefing
    schedule: "0 8 * * *"
    prompt: Run the morning briefing
    delivery: telegram
    labels:
      team: ops
  - name: Reminder
    schedule: at 2026-03-01 09:00
    message: Ship the release
    sessionTarget: main

notes: keep this
"#;

    #[test]
    fn parses_heartbeats_and_defaults() {
        let file: HeartbeatFile = serde_yaml::from_str(SAMPLE).unwrap();
        let beats = file.heartbeats.as_ref().unwrap();
        assert_eq!(beats.len(), 2);
        assert_eq!(beats[0].name.as_deref(), Some("Morning Briefing"));
        assert_eq!(beats[0].schedule.as_deref(), Some("0 8 * * *"));
        assert!(!beats[0].is_one_shot());
        assert!(beats[1].is_one_shot());
        assert_eq!(beats[1].session_target.as_deref(), Some("main"));
        assert_eq!(
            file.defaults.as_ref().unwrap().timezone.as_deref(),
            Some("America/New_York")
        );
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let file: HeartbeatFile = serde_yaml::from_str(SAMPLE).unwrap();
        let rendered = serde_yaml::to_string(&file).unwrap();
        let reparsed: HeartbeatFile = serde_yaml::from_str(&rendered).unwrap();

        assert!(rendered.contains("notes: keep this"));
        assert!(rendered.contains("team: ops"));
        assert_eq!(reparsed.heartbeats.unwrap().len(), 2);
    }

    #[test]
    fn completed_entries_keep_heartbeat_fields_and_outcome() {
        let yaml = r#"
heartbeats: []
heartbeats_completed:
  - name: One shot
    schedule: at 2026-01-01 09:00
    prompt: do the thing
    executed_at: "2026-01-01T14:00:00Z"
    status: ok
"#;
        let file: HeartbeatFile = serde_yaml::from_str(yaml).unwrap();
        let entry = &file.heartbeats_completed[0];
        assert_eq!(entry.heartbeat.name.as_deref(), Some("One shot"));
        assert_eq!(entry.status.as_deref(), Some("ok"));
        assert_eq!(entry.executed_at.as_deref(), Some("2026-01-01T14:00:00Z"));
    }

    #[test]
    fn find_config_path_prefers_the_explicit_file() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("custom.yaml");
        std::fs::write(&explicit, "heartbeats: []\n").unwrap();

        let found = find_config_path(explicit.to_str().unwrap()).unwrap();
        assert_eq!(found, explicit);
    }

    #[test]
    fn load_reports_parse_failures_with_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "heartbeats: [unterminated\n").unwrap();

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }
}
