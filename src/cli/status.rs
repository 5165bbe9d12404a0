use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use console::style;

use super::parse_status_flags;
use crate::core::config;
use crate::core::discovery;
use crate::core::openclaw::OpenClawGateway;
use crate::core::store::{CacheStore, JobRow};
use crate::core::terminal::{CHART, HEARTBEAT, WARN_ICON, ellipsize, print_warn};

pub async fn run_status_command(args: &[String]) -> Result<()> {
    let flags = parse_status_flags(args, 2);
    let store = CacheStore::open_default()?;

    if flags.refresh {
        let gateway = OpenClawGateway::new();
        let config_path = config::find_config_path(&flags.config);
        if let Err(err) = discovery::discover(&gateway, &store, config_path.as_deref()).await {
            print_warn(&format!("Refresh failed, showing cached state: {err}"));
        }
    }

    let jobs = store.list_jobs()?;
    println!("\n{}Pacekeeper Status\n", HEARTBEAT);

    if jobs.is_empty() {
        println!("  No heartbeats found. Run `pacekeeper sync` to create some!\n");
        return Ok(());
    }

    let now = Local::now();
    let active: Vec<&JobRow> = jobs.iter().filter(|j| j.status == "active").collect();
    let plural = if active.len() == 1 { "" } else { "s" };
    println!("{}Active ({} job{plural}):\n", CHART, active.len());

    for job in active.iter().take(10) {
        let marker = if job.managed { "📋" } else { "  " };
        let agent = job
            .agent
            .as_deref()
            .map(|a| format!(" ({a})"))
            .unwrap_or_default();
        println!("  {marker} {} {}{agent}", style("✓").green(), job.name);
        println!("      Next: {}", format_next_run(job.next_run_at, now));
    }
    if active.len() > 10 {
        println!("  ... and {} more", active.len() - 10);
    }

    let failing = store.failing_jobs()?;
    if !failing.is_empty() {
        let plural = if failing.len() == 1 { "" } else { "s" };
        println!("\n{}Failing ({} job{plural}):\n", WARN_ICON, failing.len());
        for job in &failing {
            println!("  {} {}", style("✗").red(), job.name);
            if let Some(error) = job.last_error.as_deref() {
                println!("    Error: {}", ellipsize(error, 80));
            }
        }
    }

    let counts = store.status_counts()?;
    println!("\n{}", "─".repeat(60));
    println!(
        "  Managed: {} | Unmanaged: {} | Failing: {}",
        counts.managed, counts.unmanaged, counts.failing
    );

    if let Some(next) = store.next_job()?
        && let Some(at) = next.next_run_at
    {
        let until = format_time_until(at - Utc::now().timestamp_millis());
        println!("  Next run: {} in {until}", next.name);
    }
    println!();
    Ok(())
}

/// Human rendering of the next scheduled instant, relative to `now`.
fn format_next_run(ts: Option<i64>, now: DateTime<Local>) -> String {
    let Some(at) = ts.and_then(|ms| Local.timestamp_millis_opt(ms).single()) else {
        return "Not scheduled".to_string();
    };
    if at < now {
        return "Overdue".to_string();
    }
    let time = at.format("%-I:%M %p");
    if at.date_naive() == now.date_naive() {
        format!("Today {time}")
    } else if Some(at.date_naive()) == now.date_naive().succ_opt() {
        format!("Tomorrow {time}")
    } else {
        at.format("%b %-d, %-I:%M %p").to_string()
    }
}

fn format_time_until(diff_ms: i64) -> String {
    if diff_ms < 0 {
        return "overdue".to_string();
    }
    let minutes = diff_ms / 60_000;
    let hours = minutes / 60;
    let days = hours / 24;
    if days > 0 {
        format!("{days}d {}h", hours % 24)
    } else if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn next_run_handles_missing_and_overdue() {
        let now = local(2026, 6, 15, 8, 0);
        assert_eq!(format_next_run(None, now), "Not scheduled");
        let past = local(2026, 6, 15, 7, 0).timestamp_millis();
        assert_eq!(format_next_run(Some(past), now), "Overdue");
    }

    #[test]
    fn next_run_renders_today_tomorrow_and_dates() {
        let now = local(2026, 6, 15, 8, 0);
        let today = local(2026, 6, 15, 17, 30).timestamp_millis();
        assert_eq!(format_next_run(Some(today), now), "Today 5:30 PM");
        let tomorrow = local(2026, 6, 16, 9, 5).timestamp_millis();
        assert_eq!(format_next_run(Some(tomorrow), now), "Tomorrow 9:05 AM");
        let later = local(2026, 6, 18, 9, 5).timestamp_millis();
        assert_eq!(format_next_run(Some(later), now), "Jun 18, 9:05 AM");
    }

    #[test]
    fn time_until_picks_the_two_biggest_units() {
        assert_eq!(format_time_until(-5), "overdue");
        assert_eq!(format_time_until(30_000), "0m");
        assert_eq!(format_time_until(125 * 60_000), "2h 5m");
        assert_eq!(format_time_until((3 * 24 + 4) * 3_600_000), "3d 4h");
    }
}
