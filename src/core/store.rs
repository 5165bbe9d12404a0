use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::core::error::{PacekeeperError, Result};

const JOB_COLUMNS: &str = "id, name, schedule, agent, status, next_run_at, last_run_at, \
                           last_status, last_error, managed, created_at, updated_at";
const RUN_COLUMNS: &str =
    "id, job_id, job_name, started_at, ended_at, duration_ms, status, error, session_id";

/// Read model of the scheduler, projected into SQLite by discovery. One
/// short-lived connection per logical operation; SQLite serializes the
/// writers, and a rebuild is one discovery pass away.
pub struct CacheStore {
    conn: Connection,
}

/// A cached job row. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct JobRow {
    pub id: String,
    pub name: String,
    pub schedule: String,
    pub agent: Option<String>,
    pub status: String,
    pub next_run_at: Option<i64>,
    pub last_run_at: Option<i64>,
    pub last_status: Option<String>,
    pub last_error: Option<String>,
    pub managed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Everything discovery learns about a job in one listing pass.
#[derive(Debug, Clone, Default)]
pub struct JobUpsert {
    pub id: String,
    pub name: String,
    pub schedule: String,
    pub agent: Option<String>,
    pub status: String,
    pub next_run_at: Option<i64>,
    pub last_run_at: Option<i64>,
    pub last_status: Option<String>,
    pub last_error: Option<String>,
    pub managed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRow {
    pub id: i64,
    pub job_id: String,
    pub job_name: Option<String>,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub duration_ms: Option<i64>,
    pub status: Option<String>,
    pub error: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewRun {
    pub job_id: String,
    pub job_name: Option<String>,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub duration_ms: Option<i64>,
    pub status: Option<String>,
    pub error: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCounts {
    pub active: i64,
    pub failing: i64,
    pub managed: i64,
    pub unmanaged: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummaryRow {
    pub job_name: Option<String>,
    pub total: i64,
    pub ok: i64,
    pub avg_duration_ms: Option<f64>,
}

impl CacheStore {
    /// ~/.pacekeeper/state.db
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pacekeeper")
            .join("state.db")
    }

    pub fn open_default() -> Result<Self> {
        Self::open(&Self::default_path())
    }

    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| PacekeeperError::FileWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        Self::from_conn(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::from_conn(Connection::open_in_memory()?)
    }

    fn from_conn(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Insert or refresh a job snapshot. `created_at` is set once;
    /// `updated_at` moves on every upsert.
    pub fn upsert_job(&self, job: &JobUpsert) -> Result<()> {
        self.conn.execute(
            "INSERT INTO jobs (id, name, schedule, agent, status, next_run_at, last_run_at, \
             last_status, last_error, managed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 schedule = excluded.schedule,
                 agent = excluded.agent,
                 status = excluded.status,
                 next_run_at = excluded.next_run_at,
                 last_run_at = excluded.last_run_at,
                 last_status = excluded.last_status,
                 last_error = excluded.last_error,
                 managed = excluded.managed,
                 updated_at = strftime('%s', 'now') * 1000",
            params![
                job.id,
                job.name,
                job.schedule,
                job.agent,
                job.status,
                job.next_run_at,
                job.last_run_at,
                job.last_status,
                job.last_error,
                job.managed,
            ],
        )?;
        Ok(())
    }

    pub fn get_job(&self, id: &str) -> Result<Option<JobRow>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1 LIMIT 1");
        Ok(self
            .conn
            .query_row(&sql, params![id], job_from_row)
            .optional()?)
    }

    pub fn get_job_by_name(&self, name: &str) -> Result<Option<JobRow>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE name = ?1 LIMIT 1");
        Ok(self
            .conn
            .query_row(&sql, params![name], job_from_row)
            .optional()?)
    }

    pub fn list_jobs(&self) -> Result<Vec<JobRow>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY next_run_at ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], job_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn failing_jobs(&self) -> Result<Vec<JobRow>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'failing' ORDER BY name");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], job_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// The soonest upcoming run among active jobs.
    pub fn next_job(&self) -> Result<Option<JobRow>> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs
             WHERE status = 'active' AND next_run_at IS NOT NULL
             ORDER BY next_run_at ASC LIMIT 1"
        );
        Ok(self.conn.query_row(&sql, [], job_from_row).optional()?)
    }

    pub fn status_counts(&self) -> Result<StatusCounts> {
        Ok(self.conn.query_row(
            "SELECT
                 COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0),
                 COALESCE(SUM(CASE WHEN status = 'failing' THEN 1 ELSE 0 END), 0),
                 COALESCE(SUM(CASE WHEN managed = 1 THEN 1 ELSE 0 END), 0),
                 COALESCE(SUM(CASE WHEN managed = 0 THEN 1 ELSE 0 END), 0)
             FROM jobs",
            [],
            |row| {
                Ok(StatusCounts {
                    active: row.get(0)?,
                    failing: row.get(1)?,
                    managed: row.get(2)?,
                    unmanaged: row.get(3)?,
                })
            },
        )?)
    }

    /// Drop cached jobs the scheduler no longer reports. An empty listing
    /// is treated as a failed read, not a mass deletion.
    pub fn evict_stale(&self, active_ids: &[String]) -> Result<usize> {
        if active_ids.is_empty() {
            return Ok(0);
        }
        let placeholders = active_ids
            .iter()
            .map(|_| "?")
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("DELETE FROM jobs WHERE id NOT IN ({placeholders})");
        Ok(self
            .conn
            .execute(&sql, rusqlite::params_from_iter(active_ids))?)
    }

    pub fn record_run(&self, run: &NewRun) -> Result<()> {
        self.conn.execute(
            "INSERT INTO runs (job_id, job_name, started_at, ended_at, duration_ms, status, \
             error, session_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run.job_id,
                run.job_name,
                run.started_at,
                run.ended_at,
                run.duration_ms,
                run.status,
                run.error,
                run.session_id,
            ],
        )?;
        Ok(())
    }

    pub fn runs_for_job(&self, job_id: &str, limit: i64) -> Result<Vec<RunRow>> {
        let sql = format!(
            "SELECT {RUN_COLUMNS} FROM runs WHERE job_id = ?1 ORDER BY started_at DESC LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![job_id, limit], run_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Run history keyed by the recorded job name. Names are stamped onto
    /// runs at record time, so history survives a job id change.
    pub fn runs_by_name(&self, job_name: &str, limit: i64) -> Result<Vec<RunRow>> {
        let sql = format!(
            "SELECT {RUN_COLUMNS} FROM runs WHERE job_name = ?1 ORDER BY started_at DESC LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![job_name, limit], run_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn recent_runs(&self, limit: i64) -> Result<Vec<RunRow>> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM runs ORDER BY started_at DESC LIMIT ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit], run_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Per-job success tallies over the trailing window.
    pub fn run_summary(&self, days: i64) -> Result<Vec<RunSummaryRow>> {
        let cutoff = Utc::now().timestamp_millis() - days * 86_400_000;
        let mut stmt = self.conn.prepare(
            "SELECT job_name,
                    COUNT(*) AS total,
                    SUM(CASE WHEN status = 'ok' THEN 1 ELSE 0 END) AS ok,
                    AVG(duration_ms) AS avg_duration_ms
             FROM runs
             WHERE started_at > ?1
             GROUP BY job_name
             ORDER BY job_name",
        )?;
        let rows = stmt.query_map(params![cutoff], |row| {
            Ok(RunSummaryRow {
                job_name: row.get(0)?,
                total: row.get(1)?,
                ok: row.get(2)?,
                avg_duration_ms: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Age out old run history and cap the per-job backlog. Returns
    /// (removed by age, removed by cap).
    pub fn prune_runs(&self, max_age_days: i64, keep_per_job: i64) -> Result<(usize, usize)> {
        let cutoff = Utc::now().timestamp_millis() - max_age_days * 86_400_000;
        let by_age = self
            .conn
            .execute("DELETE FROM runs WHERE started_at < ?1", params![cutoff])?;

        let mut stmt = self.conn.prepare("SELECT DISTINCT job_id FROM runs")?;
        let ids = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut job_ids = Vec::new();
        for id in ids {
            job_ids.push(id?);
        }
        drop(stmt);

        let mut by_cap = 0usize;
        for job_id in job_ids {
            by_cap += self.conn.execute(
                "DELETE FROM runs WHERE id IN (
                     SELECT id FROM runs WHERE job_id = ?1
                     ORDER BY started_at DESC LIMIT -1 OFFSET ?2
                 )",
                params![job_id, keep_per_job],
            )?;
        }
        Ok((by_age, by_cap))
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS jobs (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            schedule    TEXT,
            agent       TEXT,
            status      TEXT NOT NULL DEFAULT 'active',
            next_run_at INTEGER,
            last_run_at INTEGER,
            last_status TEXT,
            last_error  TEXT,
            managed     INTEGER NOT NULL DEFAULT 0,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_name ON jobs(name);
        CREATE INDEX IF NOT EXISTS idx_jobs_managed ON jobs(managed);
        CREATE INDEX IF NOT EXISTS idx_jobs_next_run ON jobs(next_run_at);

        CREATE TABLE IF NOT EXISTS runs (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id      TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            job_name    TEXT,
            started_at  INTEGER NOT NULL,
            ended_at    INTEGER,
            duration_ms INTEGER,
            status      TEXT,
            error       TEXT,
            session_id  TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_runs_job_id ON runs(job_id);
        CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs(started_at);",
    )?;
    ensure_run_columns(conn)
}

/// duration_ms and session_id arrived after the first release; add them
/// to databases created before that.
fn ensure_run_columns(conn: &Connection) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(runs)")?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut cols = Vec::new();
    for name in names {
        cols.push(name?);
    }
    drop(stmt);

    if !cols.iter().any(|c| c == "duration_ms") {
        conn.execute_batch("ALTER TABLE runs ADD COLUMN duration_ms INTEGER;")?;
    }
    if !cols.iter().any(|c| c == "session_id") {
        conn.execute_batch("ALTER TABLE runs ADD COLUMN session_id TEXT;")?;
    }
    Ok(())
}

fn job_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        name: row.get(1)?,
        schedule: row.get(2)?,
        agent: row.get(3)?,
        status: row.get(4)?,
        next_run_at: row.get(5)?,
        last_run_at: row.get(6)?,
        last_status: row.get(7)?,
        last_error: row.get(8)?,
        managed: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn run_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRow> {
    Ok(RunRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        job_name: row.get(2)?,
        started_at: row.get(3)?,
        ended_at: row.get(4)?,
        duration_ms: row.get(5)?,
        status: row.get(6)?,
        error: row.get(7)?,
        session_id: row.get(8)?,
    })
}
