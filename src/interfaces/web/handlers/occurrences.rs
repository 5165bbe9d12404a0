use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use serde::{Deserialize, Serialize};

use super::super::AppState;
use super::{bad_request, internal_error};
use crate::core::openclaw::JobSchedule;
use crate::core::store::JobRow;

const DEFAULT_RANGE_DAYS: i64 = 7;
const MAX_RANGE_DAYS: i64 = 35;
/// Minutes in the widest allowed range. A minute-resolution expression can
/// never exceed this; seconds-level expressions get truncated to it.
const MAX_PER_JOB: usize = 50_400;

#[derive(Deserialize)]
pub struct OccurrencesQuery {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Occurrence {
    job_id: String,
    job_name: String,
    agent: Option<String>,
    timestamp: i64,
    schedule: String,
}

/// Expand every active job's schedule into the concrete instants that fall
/// inside the requested window. Jobs whose cached schedule cannot be
/// parsed are skipped rather than failing the whole response.
pub async fn list_occurrences(
    State(state): State<AppState>,
    Query(query): Query<OccurrencesQuery>,
) -> Response {
    let start = match query.start.as_deref() {
        Some(raw) => match parse_instant(raw) {
            Some(dt) => dt,
            None => return bad_request("invalid start (use ISO 8601)").into_response(),
        },
        None => Utc::now(),
    };
    let end = match query.end.as_deref() {
        Some(raw) => match parse_instant(raw) {
            Some(dt) => dt,
            None => return bad_request("invalid end (use ISO 8601)").into_response(),
        },
        None => start + Duration::days(DEFAULT_RANGE_DAYS),
    };
    let end = end.min(start + Duration::days(MAX_RANGE_DAYS));

    let jobs = match state.store().and_then(|store| store.list_jobs()) {
        Ok(jobs) => jobs,
        Err(err) => return internal_error(err).into_response(),
    };

    let mut occurrences = Vec::new();
    for job in jobs.iter().filter(|j| j.status == "active") {
        expand_job(job, start, end, &mut occurrences);
    }
    occurrences.sort_by_key(|o| o.timestamp);

    Json(serde_json::json!({ "occurrences": occurrences })).into_response()
}

fn expand_job(job: &JobRow, start: DateTime<Utc>, end: DateTime<Utc>, out: &mut Vec<Occurrence>) {
    let Ok(schedule) = serde_json::from_str::<JobSchedule>(&job.schedule) else {
        return;
    };

    match schedule.kind.as_deref() {
        Some("cron") => {
            let Some(expr) = schedule.expr.as_deref() else {
                return;
            };
            let Ok(parsed) = normalize_cron(expr).parse::<CronSchedule>() else {
                return;
            };
            let tz: Tz = schedule
                .tz
                .as_deref()
                .and_then(|t| t.parse().ok())
                .unwrap_or(Tz::UTC);
            let end_ms = end.timestamp_millis();
            for next in parsed.after(&start.with_timezone(&tz)).take(MAX_PER_JOB) {
                let ts = next.timestamp_millis();
                if ts > end_ms {
                    break;
                }
                out.push(Occurrence {
                    job_id: job.id.clone(),
                    job_name: job.name.clone(),
                    agent: job.agent.clone(),
                    timestamp: ts,
                    schedule: expr.to_string(),
                });
            }
        }
        Some("at") => {
            if let Some(instant) = schedule.at_instant()
                && instant >= start
                && instant <= end
            {
                out.push(Occurrence {
                    job_id: job.id.clone(),
                    job_name: job.name.clone(),
                    agent: job.agent.clone(),
                    timestamp: instant.timestamp_millis(),
                    schedule: "one-shot".to_string(),
                });
            }
        }
        // "every" intervals have no expansion anchor, so they are skipped.
        _ => {}
    }
}

/// Scheduler expressions are standard five-field cron; the parser wants a
/// seconds column.
fn normalize_cron(expr: &str) -> String {
    if expr.split_whitespace().count() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(schedule: &str) -> JobRow {
        JobRow {
            id: "j1".to_string(),
            name: "Daily".to_string(),
            schedule: schedule.to_string(),
            agent: None,
            status: "active".to_string(),
            next_run_at: None,
            last_run_at: None,
            last_status: None,
            last_error: None,
            managed: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn cron_expansion_respects_the_job_zone() {
        let job = row(r#"{"kind":"cron","expr":"0 9 * * *","tz":"America/New_York"}"#);
        let mut out = Vec::new();
        expand_job(
            &job,
            utc("2026-03-02T00:00:00Z"),
            utc("2026-03-04T00:00:00Z"),
            &mut out,
        );
        // 09:00 New York is 14:00 UTC in March (EST).
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].timestamp, utc("2026-03-02T14:00:00Z").timestamp_millis());
        assert_eq!(out[1].timestamp, utc("2026-03-03T14:00:00Z").timestamp_millis());
        assert_eq!(out[0].schedule, "0 9 * * *");
    }

    #[test]
    fn zoneless_cron_expands_in_utc() {
        let job = row(r#"{"kind":"cron","expr":"30 6 * * *"}"#);
        let mut out = Vec::new();
        expand_job(
            &job,
            utc("2026-03-02T00:00:00Z"),
            utc("2026-03-03T00:00:00Z"),
            &mut out,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].timestamp, utc("2026-03-02T06:30:00Z").timestamp_millis());
    }

    #[test]
    fn one_shots_inside_the_window_are_included() {
        let job = row(r#"{"kind":"at","at":"2026-03-02T12:00:00Z"}"#);
        let mut out = Vec::new();
        expand_job(
            &job,
            utc("2026-03-01T00:00:00Z"),
            utc("2026-03-05T00:00:00Z"),
            &mut out,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].schedule, "one-shot");

        let mut out = Vec::new();
        expand_job(
            &job,
            utc("2026-03-03T00:00:00Z"),
            utc("2026-03-05T00:00:00Z"),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn unparseable_schedules_are_skipped() {
        let mut out = Vec::new();
        expand_job(
            &row("not json"),
            utc("2026-03-01T00:00:00Z"),
            utc("2026-03-05T00:00:00Z"),
            &mut out,
        );
        expand_job(
            &row(r#"{"kind":"cron","expr":"definitely not cron"}"#),
            utc("2026-03-01T00:00:00Z"),
            utc("2026-03-05T00:00:00Z"),
            &mut out,
        );
        expand_job(
            &row(r#"{"kind":"every","everyMs":60000}"#),
            utc("2026-03-01T00:00:00Z"),
            utc("2026-03-05T00:00:00Z"),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn five_field_expressions_gain_a_seconds_column() {
        assert_eq!(normalize_cron("0 9 * * *"), "0 0 9 * * *");
        assert_eq!(normalize_cron("0 0 9 * * *"), "0 0 9 * * *");
    }

    #[test]
    fn instants_parse_from_rfc3339_or_bare_dates() {
        assert_eq!(
            parse_instant("2026-03-01T09:00:00-05:00").unwrap(),
            utc("2026-03-01T14:00:00Z")
        );
        assert_eq!(
            parse_instant("2026-03-01").unwrap(),
            utc("2026-03-01T00:00:00Z")
        );
        assert!(parse_instant("yesterday").is_none());
    }
}
