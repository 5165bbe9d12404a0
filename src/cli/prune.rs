use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;

use super::parse_prune_flags;
use crate::core::config;
use crate::core::error::PacekeeperError;
use crate::core::lifecycle::{self, PruneOptions};
use crate::core::terminal::{RUNNER, SUCCESS_ICON, WASTEBASKET};

pub fn run_prune_command(args: &[String]) -> Result<()> {
    let flags = parse_prune_flags(args, 2);
    let days = flags
        .days
        .as_deref()
        .map(|raw| {
            raw.parse::<i64>().map_err(|_| {
                PacekeeperError::Usage("--days must be a positive number".to_string())
            })
        })
        .transpose()?;

    let path = config::require_config_path(&flags.config)?;
    let outcome = lifecycle::prune(
        &path,
        &PruneOptions {
            days,
            before: flags.before,
            dry_run: flags.dry_run,
        },
    )?;

    if outcome.total_before == 0 {
        println!("No completed one-shots to prune.\n");
        return Ok(());
    }

    println!(
        "\n{}Pruning completed one-shots older than {}\n",
        WASTEBASKET,
        outcome.cutoff.format("%Y-%m-%d")
    );

    if outcome.removed.is_empty() {
        println!("No completed one-shots older than cutoff date.\n");
        return Ok(());
    }

    println!(
        "Found {} completed one-shot(s) to remove:\n",
        outcome.removed.len()
    );
    for entry in &outcome.removed {
        let icon = if entry.status.as_deref() == Some("error") {
            style("✗").red()
        } else {
            style("✓").green()
        };
        println!(
            "  {icon} {} (executed {})",
            entry.heartbeat.display_name(),
            executed_date(entry.executed_at.as_deref())
        );
    }
    println!();

    if outcome.dry_run {
        println!("{}Dry run - no changes made\n", RUNNER);
        return Ok(());
    }

    println!(
        "{}Removed {} completed one-shot(s) from {}",
        SUCCESS_ICON,
        outcome.removed.len(),
        path.display()
    );
    println!("   Remaining: {}\n", outcome.kept);
    Ok(())
}

fn executed_date(raw: Option<&str>) -> String {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|at| at.with_timezone(&Utc).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
