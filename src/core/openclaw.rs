use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::core::error::{PacekeeperError, Result};

/// A cron job as the OpenClaw CLI reports it. Every field is optional on
/// the wire except the id; unmodeled schedule keys ride along in `extra`
/// so the cached snapshot stays byte-faithful.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalJob {
    pub id: String,
    pub name: Option<String>,
    pub enabled: bool,
    pub schedule: Option<JobSchedule>,
    pub payload: Option<JobPayload>,
    pub state: Option<JobState>,
    pub delivery: Option<JobDelivery>,
    pub session_target: Option<String>,
    pub created_at_ms: Option<i64>,
    pub updated_at_ms: Option<i64>,
}

impl ExternalJob {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Schedule serialized back to JSON for cache storage. `{}` when the
    /// job carries none.
    pub fn schedule_json(&self) -> String {
        self.schedule
            .as_ref()
            .and_then(|s| serde_json::to_string(s).ok())
            .unwrap_or_else(|| "{}".to_string())
    }

    /// Newest-wins ordering key for duplicate resolution.
    pub fn created_ms(&self) -> i64 {
        self.created_at_ms.or(self.updated_at_ms).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    /// One-shot instant. The CLI emits either an RFC 3339 string or epoch
    /// milliseconds here depending on version, so it stays untyped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub every_ms: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl JobSchedule {
    /// The one-shot instant as a concrete UTC time, whichever wire shape
    /// the CLI used.
    pub fn at_instant(&self) -> Option<DateTime<Utc>> {
        match self.at.as_ref()? {
            serde_json::Value::String(raw) => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            serde_json::Value::Number(ms) => ms
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobPayload {
    pub kind: Option<String>,
    pub message: Option<String>,
    pub text: Option<String>,
    pub agent_id: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobState {
    pub next_run_at_ms: Option<i64>,
    pub last_run_at_ms: Option<i64>,
    pub last_run_status: Option<String>,
    pub last_run_error: Option<String>,
    pub last_duration_ms: Option<i64>,
    pub last_session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobDelivery {
    pub mode: Option<String>,
    pub channel: Option<String>,
}

/// Seam between pacekeeper and the external scheduler. Everything that
/// talks to OpenClaw goes through this trait so the sync, discovery, and
/// dashboard paths can run against a stub in tests.
#[async_trait]
pub trait CronGateway: Send + Sync {
    async fn list(&self) -> Result<Vec<ExternalJob>>;
    async fn create(&self, args: &[String]) -> Result<()>;
    async fn remove(&self, id: &str) -> Result<()>;
}

/// Shells out to the `openclaw` binary on PATH.
pub struct OpenClawGateway {
    binary: String,
}

impl OpenClawGateway {
    pub fn new() -> Self {
        Self {
            binary: "openclaw".to_string(),
        }
    }
}

impl Default for OpenClawGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CronGateway for OpenClawGateway {
    async fn list(&self) -> Result<Vec<ExternalJob>> {
        debug!("querying {} cron list", self.binary);
        let output = Command::new(&self.binary)
            .args(["cron", "list", "--json"])
            .output()
            .await
            .map_err(|e| {
                PacekeeperError::ExternalQuery(format!("could not run {}: {e}", self.binary))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PacekeeperError::ExternalQuery(format!(
                "{} cron list exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        parse_job_listing(&String::from_utf8_lossy(&output.stdout))
    }

    async fn create(&self, args: &[String]) -> Result<()> {
        debug!("running {} {}", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                PacekeeperError::CreateFailed(format!("could not run {}: {e}", self.binary))
            })?;

        if !output.status.success() {
            return Err(PacekeeperError::CreateFailed(failure_detail(&output)));
        }
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        debug!("running {} cron remove {id}", self.binary);
        let output = Command::new(&self.binary)
            .args(["cron", "remove", id])
            .output()
            .await
            .map_err(|e| PacekeeperError::RemoveFailed {
                id: id.to_string(),
                reason: format!("could not run {}: {e}", self.binary),
            })?;

        if !output.status.success() {
            return Err(PacekeeperError::RemoveFailed {
                id: id.to_string(),
                reason: failure_detail(&output),
            });
        }
        Ok(())
    }
}

fn failure_detail(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    "unknown error".to_string()
}

#[derive(Deserialize)]
struct Listing {
    #[serde(default)]
    jobs: Vec<ExternalJob>,
}

/// The CLI prints banner noise before the JSON document, so scan forward
/// to the first `{` before parsing.
fn parse_job_listing(raw: &str) -> Result<Vec<ExternalJob>> {
    let start = raw.find('{').ok_or_else(|| {
        PacekeeperError::ExternalQuery("no JSON object in cron list output".to_string())
    })?;
    let listing: Listing = serde_json::from_str(&raw[start..]).map_err(|e| {
        PacekeeperError::ExternalQuery(format!("could not parse cron list output: {e}"))
    })?;
    Ok(listing.jobs)
}
