use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

use crate::core::config::Heartbeat;
use crate::core::error::{PacekeeperError, Result};

/// Translate one heartbeat into the `openclaw cron add` argv. Cron
/// expressions pass through verbatim (the scheduler owns their grammar);
/// `at` schedules are resolved to a UTC instant here.
pub fn build_cron_args(hb: &Heartbeat, zone: &str) -> Result<Vec<String>> {
    let name = hb
        .name
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PacekeeperError::Validation("heartbeat is missing a name".to_string()))?;
    let schedule = hb
        .schedule
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            PacekeeperError::InvalidSchedule(format!("heartbeat \"{name}\" has no schedule"))
        })?;

    let prompt = hb.prompt.as_deref().filter(|s| !s.is_empty());
    let message = hb.message.as_deref().filter(|s| !s.is_empty());
    if matches!((prompt, message), (Some(_), Some(_)) | (None, None)) {
        return Err(PacekeeperError::MissingPayload(name.to_string()));
    }

    let mut args = vec![
        "cron".to_string(),
        "add".to_string(),
        "--name".to_string(),
        name.to_string(),
    ];

    let one_shot = schedule.starts_with("at ");
    if one_shot {
        args.push("--at".to_string());
        args.push(resolve_at_time(schedule, zone)?);
    } else {
        args.push("--cron".to_string());
        args.push(schedule.to_string());
        args.push("--tz".to_string());
        args.push(zone.to_string());
    }

    if let Some(p) = prompt {
        args.push("--message".to_string());
        args.push(p.to_string());
    } else if let Some(m) = message {
        args.push("--system-event".to_string());
        args.push(m.to_string());
    }

    // Prompts get their own session unless the heartbeat says otherwise;
    // system events land in the main session.
    let default_target = if prompt.is_some() { "isolated" } else { "main" };
    let target = hb
        .session_target
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(default_target);
    args.push("--session".to_string());
    args.push(target.to_string());

    if target == "isolated" {
        match hb.delivery.as_deref().filter(|s| !s.is_empty()) {
            Some(channel) => {
                args.push("--announce".to_string());
                args.push("--channel".to_string());
                args.push(channel.to_string());
            }
            None => args.push("--no-deliver".to_string()),
        }
    }

    if let Some(model) = hb.model.as_deref().filter(|s| !s.is_empty()) {
        args.push("--model".to_string());
        args.push(model.to_string());
    }

    if hb.delete_after_run.unwrap_or(false) || one_shot {
        args.push("--delete-after-run".to_string());
    }

    Ok(args)
}

/// Resolve an `at <datetime>` schedule to a UTC RFC 3339 string for the
/// scheduler argv.
pub fn resolve_at_time(schedule: &str, default_zone: &str) -> Result<String> {
    Ok(to_utc_iso(&resolve_at_instant(schedule, default_zone)?))
}

/// Resolve an `at <datetime>` schedule to a UTC instant. The datetime may
/// carry its own zone suffix (`... UTC`, `... EST`, `... America/Chicago`);
/// otherwise it is read in `default_zone`.
pub fn resolve_at_instant(schedule: &str, default_zone: &str) -> Result<DateTime<Utc>> {
    let raw = schedule.trim();
    let raw = raw.strip_prefix("at ").map(str::trim).unwrap_or(raw);

    // A full RFC 3339 timestamp already pins the offset.
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let (time_part, zone_name) = split_zone_suffix(raw, default_zone);
    let tz: Tz = zone_name.parse().map_err(|_| {
        PacekeeperError::InvalidSchedule(format!(
            "unknown timezone \"{zone_name}\" in \"{schedule}\""
        ))
    })?;

    let naive = parse_local(time_part).ok_or_else(|| {
        PacekeeperError::InvalidSchedule(format!("could not parse time from \"{schedule}\""))
    })?;
    let local = tz.from_local_datetime(&naive).earliest().ok_or_else(|| {
        PacekeeperError::InvalidSchedule(format!(
            "\"{schedule}\" is not a valid local time in {zone_name}"
        ))
    })?;

    Ok(local.with_timezone(&Utc))
}

fn to_utc_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn split_zone_suffix<'a>(raw: &'a str, default_zone: &'a str) -> (&'a str, &'a str) {
    if raw.len() > 4 {
        if let Some(tail) = raw.get(raw.len() - 4..) {
            if tail.eq_ignore_ascii_case(" utc") {
                return (raw[..raw.len() - 4].trim_end(), "UTC");
            }
        }
    }
    if let Some((head, tail)) = raw.rsplit_once(' ') {
        if looks_like_zone(tail) {
            return (head.trim_end(), tail);
        }
    }
    (raw, default_zone)
}

/// IANA names carry a slash; bare abbreviations are 2-4 capitals (EST,
/// GMT). Anything else is part of the datetime.
fn looks_like_zone(token: &str) -> bool {
    token.contains('/')
        || ((2..=4).contains(&token.len()) && token.chars().all(|c| c.is_ascii_uppercase()))
}

fn parse_local(time: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(time, f).ok())
}
