use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, TimeZone, Utc};
use tracing::debug;

use crate::core::command::resolve_at_instant;
use crate::core::config::{self, CompletedHeartbeat};
use crate::core::error::{PacekeeperError, Result};
use crate::core::openclaw::{CronGateway, ExternalJob};
use crate::core::timezone::resolve_timezone;

#[derive(Debug, Default)]
pub struct ArchiveOutcome {
    pub archived: usize,
    pub warnings: Vec<String>,
}

/// Move fired one-shots from the active list to the completed ledger.
///
/// A one-shot counts as fired only when its scheduled instant has passed
/// AND the scheduler reports the job disabled (OpenClaw disables one-shots
/// after execution). Past-due but still-enabled entries stay visible as
/// missed; entries whose job vanished stay put until the next pass
/// confirms either way.
pub async fn archive_completed_one_shots(
    gateway: &dyn CronGateway,
    path: &Path,
) -> Result<ArchiveOutcome> {
    if !path.exists() {
        return Ok(ArchiveOutcome::default());
    }
    let mut file = config::load(path)?;
    let Some(heartbeats) = file.heartbeats.take() else {
        return Ok(ArchiveOutcome::default());
    };

    let jobs = match gateway.list().await {
        Ok(jobs) => jobs,
        Err(err) => {
            return Ok(ArchiveOutcome {
                archived: 0,
                warnings: vec![format!("failed to query scheduler: {err}")],
            });
        }
    };
    let by_name: HashMap<&str, &ExternalJob> = jobs
        .iter()
        .filter_map(|j| j.name.as_deref().map(|n| (n, j)))
        .collect();

    let default_tz = file.defaults.as_ref().and_then(|d| d.timezone.clone());
    let now = Utc::now();
    let mut active = Vec::with_capacity(heartbeats.len());
    let mut archived = Vec::new();

    for hb in heartbeats {
        if !hb.is_one_shot() {
            active.push(hb);
            continue;
        }
        let Some(job) = hb.name.as_deref().and_then(|n| by_name.get(n).copied()) else {
            active.push(hb);
            continue;
        };

        let zone = resolve_timezone(hb.tz.as_deref(), default_tz.as_deref()).zone;
        let Ok(scheduled_at) = resolve_at_instant(hb.schedule_str(), &zone) else {
            // Unreadable at-time: leave it where the user can see it.
            active.push(hb);
            continue;
        };

        if !(scheduled_at < now && !job.enabled) {
            active.push(hb);
            continue;
        }

        let state = job.state.as_ref();
        let executed_at = state
            .and_then(|s| s.last_run_at_ms)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or(scheduled_at)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let status = if state.and_then(|s| s.last_run_status.as_deref()) == Some("error") {
            "error"
        } else {
            "ok"
        };

        archived.push(CompletedHeartbeat {
            executed_at: Some(executed_at),
            status: Some(status.to_string()),
            error: state.and_then(|s| s.last_run_error.clone()),
            heartbeat: hb,
        });
    }

    let count = archived.len();
    if count == 0 {
        return Ok(ArchiveOutcome::default());
    }

    file.heartbeats = Some(active);
    file.heartbeats_completed.extend(archived);
    config::save(path, &file)?;

    debug!(archived = count, "archived completed one-shots");
    Ok(ArchiveOutcome {
        archived: count,
        warnings: Vec::new(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct PruneOptions {
    pub days: Option<i64>,
    pub before: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct PruneOutcome {
    pub cutoff: DateTime<Utc>,
    pub removed: Vec<CompletedHeartbeat>,
    pub kept: usize,
    pub total_before: usize,
    pub dry_run: bool,
}

/// Drop completed-ledger entries executed strictly before the cutoff.
/// Entries without an executed_at cannot be aged and are always kept.
pub fn prune(path: &Path, options: &PruneOptions) -> Result<PruneOutcome> {
    let cutoff = cutoff_instant(options)?;
    let mut file = config::load(path)?;

    let completed = std::mem::take(&mut file.heartbeats_completed);
    let total_before = completed.len();

    let mut kept = Vec::new();
    let mut removed = Vec::new();
    for entry in completed {
        let executed = entry
            .executed_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
        match executed {
            Some(at) if at.with_timezone(&Utc) < cutoff => removed.push(entry),
            _ => kept.push(entry),
        }
    }

    let kept_count = kept.len();
    if !options.dry_run && !removed.is_empty() {
        file.heartbeats_completed = kept;
        config::save(path, &file)?;
    }

    Ok(PruneOutcome {
        cutoff,
        removed,
        kept: kept_count,
        total_before,
        dry_run: options.dry_run,
    })
}

fn cutoff_instant(options: &PruneOptions) -> Result<DateTime<Utc>> {
    match (options.days, options.before.as_deref()) {
        (Some(_), Some(_)) => Err(PacekeeperError::Usage(
            "use either --days or --before, not both".to_string(),
        )),
        (None, None) => Err(PacekeeperError::Usage(
            "must provide either --days or --before".to_string(),
        )),
        (Some(days), None) => {
            let delta = Duration::try_days(days).filter(|_| days >= 0).ok_or_else(|| {
                PacekeeperError::Usage("--days must be a positive number".to_string())
            })?;
            Ok(Utc::now() - delta)
        }
        (None, Some(before)) => parse_before(before),
    }
}

fn parse_before(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| {
            PacekeeperError::Usage("invalid date for --before (use YYYY-MM-DD)".to_string())
        })
}
