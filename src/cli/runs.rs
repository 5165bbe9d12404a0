use anyhow::Result;
use chrono::{Local, TimeZone};
use console::{StyledObject, style};

use super::parse_runs_flags;
use crate::core::config;
use crate::core::discovery;
use crate::core::openclaw::OpenClawGateway;
use crate::core::store::CacheStore;
use crate::core::terminal::{HEARTBEAT, LOOKING_GLASS, ellipsize, print_error, print_warn};

pub async fn run_runs_command(args: &[String]) -> Result<()> {
    let flags = parse_runs_flags(args, 2);

    if flags.name.is_none() && !flags.all {
        print_error("Must provide a job name or use --all");
        println!("Examples:");
        println!("  pacekeeper runs \"Morning Briefing\"");
        println!("  pacekeeper runs --all --limit 10\n");
        std::process::exit(1);
    }

    let store = CacheStore::open_default()?;
    if flags.refresh {
        println!("{}Refreshing run history...\n", LOOKING_GLASS);
        let gateway = OpenClawGateway::new();
        let config_path = config::find_config_path(&flags.config);
        if let Err(err) = discovery::discover(&gateway, &store, config_path.as_deref()).await {
            print_warn(&format!("Refresh failed, showing cached history: {err}"));
        }
    }

    let (runs, heading) = if let Some(name) = flags.name.as_deref() {
        let runs = store.runs_by_name(name, flags.limit)?;
        if runs.is_empty() {
            println!("\nNo execution history found for \"{name}\"\n");
            return Ok(());
        }
        (runs, format!("{}Execution History: {name}", HEARTBEAT))
    } else {
        let runs = store.recent_runs(flags.limit)?;
        if runs.is_empty() {
            println!("\nNo execution history found.\n");
            return Ok(());
        }
        (runs, format!("{}Recent Executions (All Jobs)", HEARTBEAT))
    };

    println!("\n{heading}\n");
    let plural = if runs.len() == 1 { "" } else { "s" };
    println!("Last {} run{plural}:\n", runs.len());

    for run in &runs {
        let date = Local
            .timestamp_millis_opt(run.started_at)
            .single()
            .map(|d| d.format("%b %-d, %-I:%M %p").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let status = run.status.as_deref().unwrap_or("unknown");
        let icon = status_icon(status);
        let duration = format_duration(run.duration_ms);

        if flags.all {
            let name: String = run
                .job_name
                .as_deref()
                .unwrap_or("(unnamed)")
                .chars()
                .take(25)
                .collect();
            println!("  {name:<27} {date:<20} {icon} {status:<7} {duration}");
        } else {
            println!("  {date:<20} {icon} {status:<7} {duration}");
        }

        if flags.verbose && let Some(error) = run.error.as_deref() {
            println!("      Error: {}", ellipsize(error, 70));
        }
    }

    if flags.name.is_some() {
        let ok = runs
            .iter()
            .filter(|r| r.status.as_deref() == Some("ok"))
            .count();
        let rate = (ok as f64 / runs.len() as f64 * 100.0).round() as i64;
        println!("\n{}", "─".repeat(60));
        println!("  Success rate: {rate}% ({ok}/{})", runs.len());

        let durations: Vec<i64> = runs.iter().filter_map(|r| r.duration_ms).collect();
        if !durations.is_empty() {
            let avg = durations.iter().sum::<i64>() / durations.len() as i64;
            println!("  Avg duration: {}", format_duration(Some(avg)));
        }
    }
    println!();
    Ok(())
}

fn status_icon(status: &str) -> StyledObject<&'static str> {
    match status {
        "ok" => style("✓").green(),
        "error" => style("✗").red(),
        _ => style("⚠").yellow(),
    }
}

fn format_duration(ms: Option<i64>) -> String {
    let Some(ms) = ms.filter(|&v| v > 0) else {
        return "N/A".to_string();
    };
    let seconds = ms / 1000;
    let minutes = seconds / 60;
    if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}
