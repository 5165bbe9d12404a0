#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Stand-in for the OpenClaw CLI. It answers `cron list --json` from a
/// canned document, appends every argv line to `calls.log` so tests can
/// assert exactly what reached the scheduler, and flips a verb to a
/// nonzero exit when the matching marker file exists.
const STUB_SCHEDULER: &str = r#"#!/bin/sh
dir="$(cd "$(dirname "$0")" && pwd)"
echo "$@" >> "$dir/calls.log"
if [ "$1" = "cron" ] && [ "$2" = "list" ]; then
  if [ -f "$dir/fail_list" ]; then
    echo "scheduler offline" >&2
    exit 1
  fi
  cat "$dir/list.json"
  exit 0
fi
if [ "$1" = "cron" ] && [ "$2" = "add" ]; then
  if [ -f "$dir/fail_add" ]; then
    echo "add rejected by scheduler" >&2
    exit 1
  fi
  exit 0
fi
if [ "$1" = "cron" ] && [ "$2" = "remove" ]; then
  if [ -f "$dir/fail_remove" ]; then
    echo "remove rejected by scheduler" >&2
    exit 1
  fi
  exit 0
fi
exit 0
"#;

/// One isolated pacekeeper install: a throwaway HOME (the cache database
/// and home config land under `$HOME/.pacekeeper`) with the stub
/// scheduler first on PATH.
pub struct CliHarness {
    home: TempDir,
}

impl CliHarness {
    pub fn new() -> TestResult<Self> {
        let home = TempDir::new()?;
        let bin_dir = home.path().join("bin");
        fs::create_dir_all(&bin_dir)?;
        let stub = bin_dir.join("openclaw");
        fs::write(&stub, STUB_SCHEDULER)?;
        make_executable(&stub)?;
        let harness = Self { home };
        harness.set_listing(&[])?;
        Ok(harness)
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }

    fn bin_dir(&self) -> PathBuf {
        self.home.path().join("bin")
    }

    /// The explicit heartbeat file tests hand to `-c`.
    pub fn config_path(&self) -> PathBuf {
        self.home.path().join("pacekeeper.yaml")
    }

    pub fn config_arg(&self) -> String {
        self.config_path().display().to_string()
    }

    pub fn write_config(&self, yaml: &str) -> TestResult<PathBuf> {
        let path = self.config_path();
        fs::write(&path, yaml)?;
        Ok(path)
    }

    pub fn read_config(&self) -> TestResult<String> {
        Ok(fs::read_to_string(self.config_path())?)
    }

    /// Replace the canned `cron list --json` document.
    pub fn set_listing(&self, jobs: &[serde_json::Value]) -> TestResult<()> {
        let doc = serde_json::json!({ "jobs": jobs });
        let path = self.bin_dir().join("list.json");
        fs::write(path, serde_json::to_string(&doc)?)?;
        Ok(())
    }

    /// Make the stub reject a verb (`list`, `add`, or `remove`) from now on.
    pub fn fail_verb(&self, verb: &str) -> TestResult<()> {
        fs::write(self.bin_dir().join(format!("fail_{verb}")), "")?;
        Ok(())
    }

    /// Every argv line the stub scheduler has received.
    pub fn scheduler_calls(&self) -> TestResult<Vec<String>> {
        let path = self.bin_dir().join("calls.log");
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_to_string(path)?
            .lines()
            .map(str::to_string)
            .collect())
    }

    pub fn run(&self, args: &[&str]) -> TestResult<Output> {
        let path = format!(
            "{}:{}",
            self.bin_dir().display(),
            std::env::var("PATH").unwrap_or_default()
        );
        let output = Command::new(env!("CARGO_BIN_EXE_pacekeeper"))
            .args(args)
            .current_dir(self.home.path())
            .env("HOME", self.home.path())
            .env("PATH", path)
            .output()?;
        Ok(output)
    }
}

/// Stdout and stderr merged. User-facing text is split across both
/// streams, so assertions search the pair.
pub fn combined_output(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn make_executable(path: &Path) -> TestResult<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}
