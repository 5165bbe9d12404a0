use std::fs;
use std::path::PathBuf;

use chrono_tz::Tz;

/// Where the effective timezone came from. Callers use this to decide
/// whether a fallback warning should be surfaced for the current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimezoneSource {
    Heartbeat,
    FileDefault,
    OpenClawConfig,
    System,
    UtcFallback,
}

#[derive(Debug, Clone)]
pub struct ResolvedTimezone {
    pub zone: String,
    pub source: TimezoneSource,
}

impl ResolvedTimezone {
    /// A warning for the caller to print or collect when no timezone was
    /// configured anywhere and the resolver guessed from the environment.
    pub fn fallback_warning(&self) -> Option<String> {
        match self.source {
            TimezoneSource::System | TimezoneSource::UtcFallback => Some(format!(
                "no timezone configured, falling back to {}. Set defaults.timezone in pacekeeper.yaml to silence this.",
                self.zone
            )),
            _ => None,
        }
    }
}

/// Resolve the effective timezone for a heartbeat, in priority order:
/// per-heartbeat `tz`, the file's `defaults.timezone`, OpenClaw's own
/// config, the system zone, UTC. Zone strings are not validated here;
/// one-shot parsing and occurrence expansion validate where they parse.
pub fn resolve_timezone(hb_tz: Option<&str>, default_tz: Option<&str>) -> ResolvedTimezone {
    if let Some(tz) = non_empty(hb_tz) {
        return ResolvedTimezone {
            zone: tz,
            source: TimezoneSource::Heartbeat,
        };
    }
    if let Some(tz) = non_empty(default_tz) {
        return ResolvedTimezone {
            zone: tz,
            source: TimezoneSource::FileDefault,
        };
    }
    if let Some(tz) = openclaw_config_timezone() {
        return ResolvedTimezone {
            zone: tz,
            source: TimezoneSource::OpenClawConfig,
        };
    }
    if let Some(tz) = system_timezone() {
        return ResolvedTimezone {
            zone: tz,
            source: TimezoneSource::System,
        };
    }
    ResolvedTimezone {
        zone: "UTC".to_string(),
        source: TimezoneSource::UtcFallback,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// OpenClaw keeps its zone in ~/.openclaw/openclaw.json, either top-level
/// or under gateway.timezone.
fn openclaw_config_timezone() -> Option<String> {
    let raw = fs::read_to_string(openclaw_config_path()?).ok()?;
    let cfg: serde_json::Value = serde_json::from_str(&raw).ok()?;
    cfg.get("timezone")
        .and_then(|v| v.as_str())
        .or_else(|| {
            cfg.get("gateway")
                .and_then(|g| g.get("timezone"))
                .and_then(|v| v.as_str())
        })
        .map(str::to_string)
}

fn openclaw_config_path() -> Option<PathBuf> {
    Some(dirs::home_dir()?.join(".openclaw").join("openclaw.json"))
}

/// Best-effort system zone detection: TZ env var, /etc/timezone, then the
/// /etc/localtime symlink target. Only names that parse as IANA zones are
/// accepted.
fn system_timezone() -> Option<String> {
    if let Ok(tz) = std::env::var("TZ") {
        let tz = tz.trim().to_string();
        if !tz.is_empty() && tz.parse::<Tz>().is_ok() {
            return Some(tz);
        }
    }

    if let Ok(contents) = fs::read_to_string("/etc/timezone") {
        let tz = contents.trim().to_string();
        if !tz.is_empty() && tz.parse::<Tz>().is_ok() {
            return Some(tz);
        }
    }

    if let Ok(target) = fs::read_link("/etc/localtime") {
        let target = target.to_string_lossy().to_string();
        if let Some(idx) = target.find("zoneinfo/") {
            let tz = target[idx + "zoneinfo/".len()..].to_string();
            if tz.parse::<Tz>().is_ok() {
                return Some(tz);
            }
        }
    }

    None
}
