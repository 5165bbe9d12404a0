use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::core::config;
use crate::core::error::Result;
use crate::core::openclaw::{CronGateway, ExternalJob};
use crate::core::store::{CacheStore, JobUpsert, NewRun};

#[derive(Debug, Default, Clone, Copy)]
pub struct DiscoveryOutcome {
    pub jobs_seen: usize,
    pub runs_recorded: usize,
    pub evicted: usize,
}

/// One reconciliation pass: list the scheduler, detect runs that happened
/// since the last pass, refresh every cached row, evict what disappeared.
/// The cache is only a projection, so a failed listing leaves it untouched.
pub async fn discover(
    gateway: &dyn CronGateway,
    store: &CacheStore,
    config_path: Option<&Path>,
) -> Result<DiscoveryOutcome> {
    let jobs = gateway.list().await?;
    let managed_names = managed_names(config_path);

    let mut outcome = DiscoveryOutcome {
        jobs_seen: jobs.len(),
        ..Default::default()
    };

    for job in &jobs {
        // Run detection compares against the cached row, so it has to
        // happen before the upsert advances last_run_at.
        if let Some(run) = detect_run(store, job)? {
            store.record_run(&run)?;
            outcome.runs_recorded += 1;
        }

        store.upsert_job(&to_upsert(job, &managed_names))?;
    }

    let active_ids: Vec<String> = jobs.iter().map(|j| j.id.clone()).collect();
    outcome.evicted = store.evict_stale(&active_ids)?;

    debug!(
        jobs = outcome.jobs_seen,
        runs = outcome.runs_recorded,
        evicted = outcome.evicted,
        "discovery pass complete"
    );
    Ok(outcome)
}

/// A run is inferred when a job we already track reports a newer
/// last_run_at than the cache holds. Brand-new jobs set the baseline
/// without back-filling history.
fn detect_run(store: &CacheStore, job: &ExternalJob) -> Result<Option<NewRun>> {
    let Some(existing) = store.get_job(&job.id)? else {
        return Ok(None);
    };
    let state = job.state.as_ref();
    let Some(last_run_at) = state.and_then(|s| s.last_run_at_ms) else {
        return Ok(None);
    };
    if last_run_at <= existing.last_run_at.unwrap_or(0) {
        return Ok(None);
    }

    let duration = state.and_then(|s| s.last_duration_ms);
    Ok(Some(NewRun {
        job_id: job.id.clone(),
        job_name: Some(job.display_name().to_string()),
        started_at: last_run_at,
        ended_at: Some(last_run_at + duration.unwrap_or(0)),
        duration_ms: duration,
        status: Some(
            state
                .and_then(|s| s.last_run_status.clone())
                .unwrap_or_else(|| "ok".to_string()),
        ),
        error: state.and_then(|s| s.last_run_error.clone()),
        session_id: state.and_then(|s| s.last_session_id.clone()),
    }))
}

fn to_upsert(job: &ExternalJob, managed_names: &HashSet<String>) -> JobUpsert {
    let state = job.state.as_ref();
    let name = job.display_name().to_string();
    JobUpsert {
        managed: managed_names.contains(&name),
        id: job.id.clone(),
        schedule: job.schedule_json(),
        agent: job.payload.as_ref().and_then(|p| p.agent_id.clone()),
        status: job_status(job).to_string(),
        next_run_at: state.and_then(|s| s.next_run_at_ms),
        last_run_at: state.and_then(|s| s.last_run_at_ms),
        last_status: state.and_then(|s| s.last_run_status.clone()),
        last_error: state.and_then(|s| s.last_run_error.clone()),
        name,
    }
}

fn job_status(job: &ExternalJob) -> &'static str {
    if !job.enabled {
        return "disabled";
    }
    let failing = job
        .state
        .as_ref()
        .and_then(|s| s.last_run_status.as_deref())
        == Some("error");
    if failing { "failing" } else { "active" }
}

/// Names declared in the heartbeat file mark cached jobs as managed. A
/// missing or unreadable file just means nothing is managed.
fn managed_names(config_path: Option<&Path>) -> HashSet<String> {
    let Some(path) = config_path else {
        return HashSet::new();
    };
    let Ok(file) = config::load(path) else {
        return HashSet::new();
    };
    file.heartbeats
        .unwrap_or_default()
        .into_iter()
        .filter_map(|hb| hb.name)
        .collect()
}
