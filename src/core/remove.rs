use console::style;

use crate::core::config;
use crate::core::error::Result;
use crate::core::openclaw::CronGateway;
use crate::core::terminal::WASTEBASKET;

#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    pub config: String,
    pub dry_run: bool,
}

#[derive(Debug, Default)]
pub struct RemoveOutcome {
    pub jobs_removed: usize,
    pub yaml_removed: bool,
    pub failed: Vec<(String, String)>,
    pub dry_run: bool,
}

impl RemoveOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Remove a heartbeat everywhere it lives: every scheduler job carrying
/// the exact name, then the matching YAML entries. Each side reports its
/// own not-found case and neither aborts the other; only an unreachable
/// scheduler or an unwritable file is fatal.
pub async fn run_remove(
    gateway: &dyn CronGateway,
    name: &str,
    options: &RemoveOptions,
) -> Result<RemoveOutcome> {
    println!("\n{}Removing: \"{name}\"\n", WASTEBASKET);

    let mut outcome = RemoveOutcome {
        dry_run: options.dry_run,
        ..Default::default()
    };

    let jobs = gateway.list().await?;
    let matching: Vec<_> = jobs
        .iter()
        .filter(|j| j.name.as_deref() == Some(name))
        .collect();

    if matching.is_empty() {
        println!("  {} Not found in OpenClaw cron jobs", style("⊘").dim());
    } else {
        for job in matching {
            if options.dry_run {
                println!(
                    "  {} Would remove from OpenClaw: {}",
                    style("[DRY RUN]").yellow(),
                    job.id
                );
                outcome.jobs_removed += 1;
                continue;
            }
            match gateway.remove(&job.id).await {
                Ok(()) => {
                    println!("  {} Removed from OpenClaw: {}", style("✓").green(), job.id);
                    outcome.jobs_removed += 1;
                }
                Err(err) => {
                    println!(
                        "  {} Failed to remove from OpenClaw: {}",
                        style("✗").red(),
                        job.id
                    );
                    outcome.failed.push((job.id.clone(), err.to_string()));
                }
            }
        }
    }

    remove_from_yaml(name, options, &mut outcome)?;

    println!();
    Ok(outcome)
}

fn remove_from_yaml(
    name: &str,
    options: &RemoveOptions,
    outcome: &mut RemoveOutcome,
) -> Result<()> {
    let Some(path) = config::find_config_path(&options.config) else {
        println!("  {} No pacekeeper.yaml found", style("⊘").dim());
        return Ok(());
    };
    let mut file = config::load(&path)?;
    let Some(heartbeats) = file.heartbeats.take() else {
        println!("  {} No heartbeats in YAML", style("⊘").dim());
        return Ok(());
    };

    let before = heartbeats.len();
    let kept: Vec<_> = heartbeats
        .into_iter()
        .filter(|hb| hb.name.as_deref() != Some(name))
        .collect();
    let removed_any = kept.len() < before;
    file.heartbeats = Some(kept);

    if !removed_any {
        println!("  {} Not found in YAML", style("⊘").dim());
        return Ok(());
    }
    if options.dry_run {
        println!("  {} Would remove from YAML", style("[DRY RUN]").yellow());
        outcome.yaml_removed = true;
        return Ok(());
    }
    config::save(&path, &file)?;
    println!("  {} Removed from YAML", style("✓").green());
    outcome.yaml_removed = true;
    Ok(())
}
