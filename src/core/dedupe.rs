use std::cmp::Reverse;
use std::collections::HashMap;

use console::style;

use crate::core::error::Result;
use crate::core::openclaw::{CronGateway, ExternalJob};
use crate::core::terminal::{CLIPBOARD, LOOKING_GLASS, SUCCESS_ICON};

#[derive(Debug, Default)]
pub struct DedupeOutcome {
    pub kept: usize,
    pub removed: usize,
    pub failed: Vec<(String, String)>,
    pub dry_run: bool,
}

impl DedupeOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Collapse same-named scheduler jobs down to the newest copy. Sorting is
/// stable, so jobs with no usable creation timestamp keep their listing
/// order and the first listed wins.
pub async fn run_dedupe(gateway: &dyn CronGateway, dry_run: bool) -> Result<DedupeOutcome> {
    println!("{}Scanning for duplicate heartbeats...\n", LOOKING_GLASS);
    let jobs = gateway.list().await?;

    let mut outcome = DedupeOutcome {
        dry_run,
        ..Default::default()
    };
    if jobs.is_empty() {
        println!("No cron jobs found.\n");
        return Ok(outcome);
    }

    // First-seen name order keeps the report deterministic.
    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, Vec<ExternalJob>> = HashMap::new();
    for job in jobs {
        let name = job.name.clone().unwrap_or_else(|| "unnamed".to_string());
        if !by_name.contains_key(&name) {
            order.push(name.clone());
        }
        by_name.entry(name).or_default().push(job);
    }

    let duplicate_count = order
        .iter()
        .filter(|n| by_name.get(*n).is_some_and(|g| g.len() > 1))
        .count();
    if duplicate_count == 0 {
        println!("{} No duplicates found!\n", style("✓").green());
        return Ok(outcome);
    }

    println!("Found {duplicate_count} name(s) with duplicates:\n");

    for name in order {
        let mut group = by_name.remove(&name).unwrap_or_default();
        if group.len() < 2 {
            continue;
        }

        println!("  \"{name}\" ({} copies)", group.len());
        group.sort_by_key(|j| Reverse(j.created_ms()));
        println!("    Keeping: {} (newest)", group[0].id);

        for job in &group[1..] {
            if dry_run {
                println!(
                    "    {} Would remove: {}",
                    style("[DRY RUN]").yellow(),
                    job.id
                );
                outcome.removed += 1;
                continue;
            }
            match gateway.remove(&job.id).await {
                Ok(()) => {
                    println!("    {} Removed: {}", style("✓").green(), job.id);
                    outcome.removed += 1;
                }
                Err(err) => {
                    println!("    {} Failed to remove: {}", style("✗").red(), job.id);
                    outcome.failed.push((job.id.clone(), err.to_string()));
                }
            }
        }
        outcome.kept += 1;
    }

    println!();
    if dry_run {
        println!("{}Summary (dry run):", CLIPBOARD);
    } else {
        println!("{}Summary:", SUCCESS_ICON);
    }
    println!(
        "  {} {} unique name(s) kept",
        style("✓").green(),
        outcome.kept
    );
    let verb = if dry_run { "would be removed" } else { "removed" };
    println!(
        "  {} {} duplicate(s) {verb}",
        style("✗").red(),
        outcome.removed
    );
    if !outcome.failed.is_empty() {
        println!(
            "  {} {} removal(s) failed",
            style("✗").red(),
            outcome.failed.len()
        );
    }
    println!();

    Ok(outcome)
}
