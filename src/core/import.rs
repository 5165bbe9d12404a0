use std::collections::HashSet;

use chrono::{SecondsFormat, Utc};
use chrono_tz::Tz;

use crate::core::config::{self, Heartbeat, HeartbeatFile};
use crate::core::error::Result;
use crate::core::openclaw::{CronGateway, ExternalJob};
use crate::core::terminal::{
    BOOK, CHART, CLIPBOARD, LOOKING_GLASS, MEMO, SUCCESS_ICON, ellipsize, print_warn,
};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub config: String,
    pub dry_run: bool,
}

#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: usize,
    pub dry_run: bool,
}

/// Reverse sync: pull live scheduler jobs into the YAML file as heartbeat
/// entries, skipping names that are already declared. Existing file
/// content (defaults, completed ledger, unknown keys) is preserved.
pub async fn run_import(
    gateway: &dyn CronGateway,
    options: ImportOptions,
) -> Result<ImportOutcome> {
    let path = config::resolve_write_path(&options.config);

    println!();
    println!("{}Fetching scheduler jobs...", LOOKING_GLASS);
    let jobs = gateway.list().await?;

    let mut outcome = ImportOutcome {
        dry_run: options.dry_run,
        ..Default::default()
    };
    if jobs.is_empty() {
        println!("   No cron jobs found.\n");
        return Ok(outcome);
    }
    println!("   Found {} job(s)\n", jobs.len());

    let creating = !path.exists();
    let mut file = if creating {
        HeartbeatFile::default()
    } else {
        let file = config::load(&path)?;
        if let Some(active) = &file.heartbeats {
            println!("{}Existing config: {} heartbeat(s)", BOOK, active.len());
        }
        file
    };

    let declared: HashSet<&str> = file
        .heartbeats
        .iter()
        .flatten()
        .filter_map(|h| h.name.as_deref())
        .collect();

    let mut fresh: Vec<Heartbeat> = Vec::new();
    for job in &jobs {
        match &job.name {
            Some(name) if declared.contains(name.as_str()) => {
                outcome.skipped += 1;
                continue;
            }
            Some(_) => {}
            None => {
                print_warn(&format!("Skipping unnamed job: {}", job.id));
                continue;
            }
        }
        if let Some(hb) = job_to_heartbeat(job) {
            fresh.push(hb);
        }
    }

    println!("{}Import summary:", CHART);
    println!("   → {} new heartbeat(s) to add", fresh.len());
    if outcome.skipped > 0 {
        println!("   → {} skipped (already in YAML)", outcome.skipped);
    }
    println!();

    if fresh.is_empty() {
        println!(
            "{}Nothing to import - YAML is already up to date.\n",
            SUCCESS_ICON
        );
        return Ok(outcome);
    }

    println!("{}New heartbeats:", MEMO);
    for hb in &fresh {
        println!("   • {}", hb.display_name());
        println!("     Schedule: {}", ellipsize(hb.schedule_str(), 30));
    }
    println!();

    outcome.imported = fresh.len();

    if options.dry_run {
        println!("{}Dry run - no changes made.", CLIPBOARD);
        println!("   Would write to: {}\n", path.display());
        return Ok(outcome);
    }

    let mut active = file.heartbeats.take().unwrap_or_default();
    active.extend(fresh);
    file.heartbeats = Some(active);

    if creating {
        let header = format!(
            "# Pacekeeper heartbeats\n# Imported: {}\n\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let body = config::render(&path, &file)?;
        config::write_raw(&path, &format!("{header}{body}"))?;
    } else {
        config::save(&path, &file)?;
    }

    println!("{}Imported {} heartbeat(s)", SUCCESS_ICON, outcome.imported);
    println!("   Written to: {}\n", path.display());
    println!("Next steps:");
    println!("   1. Review: nano {}", path.display());
    println!("   2. Check status: pacekeeper status\n");

    Ok(outcome)
}

/// Best-effort mapping from a scheduler job back to a declarable
/// heartbeat. None when the job has no schedule or no payload the YAML
/// schema can express.
fn job_to_heartbeat(job: &ExternalJob) -> Option<Heartbeat> {
    let mut hb = Heartbeat {
        name: job.name.clone(),
        ..Default::default()
    };

    if let Some(schedule) = &job.schedule {
        match schedule.kind.as_deref() {
            Some("cron") => {
                hb.schedule = schedule.expr.clone();
                hb.tz = schedule.tz.clone();
            }
            Some("at") => {
                if let Some(instant) = schedule.at_instant() {
                    let zone: Option<Tz> = schedule.tz.as_deref().and_then(|t| t.parse().ok());
                    match zone {
                        Some(tz) => {
                            hb.schedule = Some(format!(
                                "at {}",
                                instant.with_timezone(&tz).format("%Y-%m-%d %H:%M")
                            ));
                            hb.tz = schedule.tz.clone();
                        }
                        // No zone on the job: pin the wall time to UTC so a
                        // later sync resolves the same instant.
                        None => {
                            hb.schedule =
                                Some(format!("at {} UTC", instant.format("%Y-%m-%d %H:%M")));
                        }
                    }
                }
            }
            Some("every") => {
                if let Some(ms) = schedule.every_ms {
                    hb.schedule = Some(every_to_cron(ms));
                }
            }
            _ => {}
        }
    }

    if let Some(payload) = &job.payload {
        match payload.kind.as_deref() {
            Some("agentTurn") => {
                hb.prompt = payload.message.clone();
                hb.model = payload.model.clone();
            }
            Some("systemEvent") => {
                hb.message = payload.text.clone();
                hb.session_target = Some("main".to_string());
            }
            _ => {}
        }
    }

    if let Some(delivery) = &job.delivery {
        if delivery.mode.as_deref() == Some("announce") {
            hb.delivery = Some(
                delivery
                    .channel
                    .clone()
                    .unwrap_or_else(|| "telegram".to_string()),
            );
        }
    }

    if job.session_target.as_deref() == Some("main") {
        hb.session_target = Some("main".to_string());
    }

    if hb.schedule.is_some() && (hb.prompt.is_some() || hb.message.is_some()) {
        Some(hb)
    } else {
        None
    }
}

/// Interval schedules have no YAML form, so approximate with cron: a
/// minute step below an hour, an hour step otherwise.
fn every_to_cron(every_ms: i64) -> String {
    let minutes = (every_ms as f64 / 60_000.0).round().max(1.0) as i64;
    if minutes >= 60 {
        let hours = (every_ms as f64 / 3_600_000.0).round() as i64;
        format!("0 */{hours} * * *")
    } else {
        format!("*/{minutes} * * * *")
    }
}
