use std::collections::HashMap;
use std::path::Path;

use console::style;
use tracing::warn;

use crate::core::command;
use crate::core::config::{self, Heartbeat};
use crate::core::discovery;
use crate::core::error::{PacekeeperError, Result};
use crate::core::lifecycle;
use crate::core::openclaw::{CronGateway, ExternalJob};
use crate::core::store::CacheStore;
use crate::core::terminal::{self, BOOK, CLIPBOARD, HEARTBEAT, LOOKING_GLASS, PACKAGE, SUCCESS_ICON};
use crate::core::timezone::resolve_timezone;

/// Run history retention applied silently after every real sync.
const PRUNE_MAX_AGE_DAYS: i64 = 90;
const PRUNE_KEEP_PER_JOB: i64 = 100;

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub config: String,
    pub dry_run: bool,
    pub force: bool,
}

/// Per-item tallies for one sync pass. Errors carry the heartbeat name so
/// the summary can point at the offending entry; warnings collect the
/// non-fatal housekeeping noise.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub created: usize,
    pub skipped: usize,
    pub replaced: usize,
    pub errors: Vec<(String, String)>,
    pub warnings: Vec<String>,
    pub dry_run: bool,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Reconcile the heartbeat file against the scheduler: create what is
/// missing, skip what exists (or replace it under --force), then run the
/// post-sync housekeeping. Item failures are tallied, not fatal; only an
/// unreadable file or an unreachable scheduler aborts.
pub async fn run_sync(
    gateway: &dyn CronGateway,
    store: &CacheStore,
    options: &SyncOptions,
) -> Result<SyncOutcome> {
    let config_path = config::require_config_path(&options.config)?;
    println!("{}Reading: {}", BOOK, config_path.display());

    let file = config::load(&config_path)?;
    let Some(heartbeats) = file.heartbeats.clone() else {
        return Err(PacekeeperError::ConfigInvalid {
            path: config_path,
            reason: "no heartbeats list".to_string(),
        });
    };

    println!("\n{}Found {} heartbeat(s)\n", HEARTBEAT, heartbeats.len());

    let existing = gateway.list().await?;
    let mut by_name: HashMap<&str, &ExternalJob> = HashMap::new();
    for job in &existing {
        if let Some(name) = job.name.as_deref() {
            by_name.entry(name).or_insert(job);
        }
    }

    let default_tz = file.defaults.as_ref().and_then(|d| d.timezone.clone());
    let mut outcome = SyncOutcome {
        dry_run: options.dry_run,
        ..Default::default()
    };

    for hb in &heartbeats {
        if let Err(err) =
            sync_one(gateway, hb, default_tz.as_deref(), &by_name, options, &mut outcome).await
        {
            let name = hb.display_name().to_string();
            terminal::print_error(&format!("Failed: {name}"));
            eprintln!("  {}", style(err.to_string()).red());
            outcome.errors.push((name, err.to_string()));
        }
    }

    print_summary(&outcome);

    if !options.dry_run {
        housekeeping(gateway, store, &config_path, &mut outcome).await;
    }

    Ok(outcome)
}

async fn sync_one(
    gateway: &dyn CronGateway,
    hb: &Heartbeat,
    default_tz: Option<&str>,
    existing: &HashMap<&str, &ExternalJob>,
    options: &SyncOptions,
    outcome: &mut SyncOutcome,
) -> Result<()> {
    let name = hb
        .name
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            PacekeeperError::Validation("missing required field: name".to_string())
        })?;
    if hb.schedule.as_deref().filter(|s| !s.is_empty()).is_none() {
        return Err(PacekeeperError::InvalidSchedule(format!(
            "heartbeat \"{name}\" has no schedule"
        )));
    }
    let prompt = hb.prompt.as_deref().filter(|s| !s.is_empty());
    let message = hb.message.as_deref().filter(|s| !s.is_empty());
    if matches!((prompt, message), (Some(_), Some(_)) | (None, None)) {
        return Err(PacekeeperError::MissingPayload(name.to_string()));
    }

    let mut replacing = false;
    if let Some(job) = existing.get(name) {
        if !options.force {
            println!("{} Exists: {name}", style("⊘").dim());
            outcome.skipped += 1;
            return Ok(());
        }
        if !options.dry_run {
            gateway.remove(&job.id).await?;
        }
        println!("{} Replacing: {name}", style("↻").cyan());
        replacing = true;
    }

    let resolved = resolve_timezone(hb.tz.as_deref(), default_tz);
    if let Some(warning) = resolved.fallback_warning() {
        if !outcome.warnings.contains(&warning) {
            terminal::print_warn(&warning);
            outcome.warnings.push(warning);
        }
    }

    let args = command::build_cron_args(hb, &resolved.zone)?;

    if options.dry_run {
        println!("{} {name}", style("[DRY RUN]").yellow());
        println!("  Command: openclaw {}\n", args.join(" "));
    } else {
        gateway.create(&args).await?;
        println!("{} Created: {name}", style("✓").green());
    }

    if replacing {
        outcome.replaced += 1;
    } else {
        outcome.created += 1;
    }
    Ok(())
}

fn print_summary(outcome: &SyncOutcome) {
    println!();
    if outcome.dry_run {
        println!("{}Summary (dry run):", CLIPBOARD);
    } else {
        println!("{}Summary:", SUCCESS_ICON);
    }
    if outcome.created > 0 {
        let verb = if outcome.dry_run {
            "would be created"
        } else {
            "created"
        };
        println!("  {} {} job(s) {verb}", style("✓").green(), outcome.created);
    }
    if outcome.replaced > 0 {
        println!(
            "  {} {} job(s) replaced",
            style("↻").cyan(),
            outcome.replaced
        );
    }
    if outcome.skipped > 0 {
        println!(
            "  {} {} job(s) skipped (already exist)",
            style("⊘").dim(),
            outcome.skipped
        );
    }
    if !outcome.errors.is_empty() {
        println!(
            "  {} {} error(s)",
            style("✗").red(),
            outcome.errors.len()
        );
    }
}

/// Post-sync housekeeping: refresh the cache when anything was created,
/// archive fired one-shots, age out run history. Never aborts the sync.
async fn housekeeping(
    gateway: &dyn CronGateway,
    store: &CacheStore,
    config_path: &Path,
    outcome: &mut SyncOutcome,
) {
    if outcome.created + outcome.replaced > 0 {
        println!();
        match discovery::discover(gateway, store, Some(config_path)).await {
            Ok(d) => println!(
                "{}Discovered {} job(s), recorded {} run(s)",
                LOOKING_GLASS, d.jobs_seen, d.runs_recorded
            ),
            Err(err) => {
                let warning = format!("post-sync discovery failed: {err}");
                terminal::print_warn(&warning);
                outcome.warnings.push(warning);
            }
        }
    }

    match lifecycle::archive_completed_one_shots(gateway, config_path).await {
        Ok(archive) => {
            if archive.archived > 0 {
                println!(
                    "\n{}Archived {} completed one-shot(s) to heartbeats_completed",
                    PACKAGE, archive.archived
                );
            }
            for warning in archive.warnings {
                terminal::print_warn(&warning);
                outcome.warnings.push(warning);
            }
        }
        Err(err) => {
            let warning = format!("archiving failed: {err}");
            terminal::print_warn(&warning);
            outcome.warnings.push(warning);
        }
    }

    if let Err(err) = store.prune_runs(PRUNE_MAX_AGE_DAYS, PRUNE_KEEP_PER_JOB) {
        let warning = format!("run pruning failed: {err}");
        warn!("{warning}");
        outcome.warnings.push(warning);
    }
}
