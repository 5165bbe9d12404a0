mod dashboard;
mod dedupe;
mod import;
mod init;
mod prune;
mod remove;
mod runs;
mod status;
mod sync;

use anyhow::Result;
use console::style;

use crate::core::config::DEFAULT_CONFIG_ARG;
use crate::core::terminal::{self, HelpSection, print_error};

fn print_help() {
    terminal::print_banner();

    HelpSection::new("Sync")
        .command("sync", "Create OpenClaw cron jobs from pacekeeper.yaml")
        .command("import", "Pull unmanaged scheduler jobs back into YAML")
        .command("dedupe", "Collapse duplicate jobs down to the newest copy")
        .command("remove", "Remove a heartbeat from the scheduler and YAML")
        .print();

    HelpSection::new("Inspect")
        .command("status", "Show the cached scheduler state")
        .command("runs", "Show execution history for a heartbeat")
        .command("dashboard", "Serve the JSON dashboard API")
        .print();

    HelpSection::new("Housekeeping")
        .command("init", "Scaffold ~/.pacekeeper/pacekeeper.yaml")
        .command("prune", "Drop old entries from the completed ledger")
        .print();

    println!(
        "\n {} {} <command> [options]\n",
        style("Usage:").bold(),
        style("pacekeeper").green()
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyncFlags {
    pub config: String,
    pub dry_run: bool,
    pub force: bool,
}

pub(crate) fn parse_sync_flags(args: &[String], start: usize) -> SyncFlags {
    let mut flags = SyncFlags {
        config: DEFAULT_CONFIG_ARG.to_string(),
        dry_run: false,
        force: false,
    };
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    flags.config = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--dry-run" => {
                flags.dry_run = true;
                i += 1;
            }
            "--force" => {
                flags.force = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    flags
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatusFlags {
    pub config: String,
    pub refresh: bool,
}

pub(crate) fn parse_status_flags(args: &[String], start: usize) -> StatusFlags {
    let mut flags = StatusFlags {
        config: DEFAULT_CONFIG_ARG.to_string(),
        refresh: true,
    };
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    flags.config = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--no-refresh" => {
                flags.refresh = false;
                i += 1;
            }
            _ => i += 1,
        }
    }
    flags
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunsFlags {
    pub name: Option<String>,
    pub all: bool,
    pub limit: i64,
    pub verbose: bool,
    pub config: String,
    pub refresh: bool,
}

pub(crate) fn parse_runs_flags(args: &[String], start: usize) -> RunsFlags {
    let mut flags = RunsFlags {
        name: None,
        all: false,
        limit: 20,
        verbose: false,
        config: DEFAULT_CONFIG_ARG.to_string(),
        refresh: true,
    };
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--all" => {
                flags.all = true;
                i += 1;
            }
            "--limit" | "-n" => {
                if i + 1 < args.len() {
                    flags.limit = args[i + 1].parse().unwrap_or(20);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                flags.verbose = true;
                i += 1;
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    flags.config = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--no-refresh" => {
                flags.refresh = false;
                i += 1;
            }
            other => {
                if flags.name.is_none() && !other.starts_with('-') {
                    flags.name = Some(other.to_string());
                }
                i += 1;
            }
        }
    }
    flags
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PruneFlags {
    pub config: String,
    pub days: Option<String>,
    pub before: Option<String>,
    pub dry_run: bool,
}

pub(crate) fn parse_prune_flags(args: &[String], start: usize) -> PruneFlags {
    let mut flags = PruneFlags {
        config: DEFAULT_CONFIG_ARG.to_string(),
        days: None,
        before: None,
        dry_run: false,
    };
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--days" => {
                if i + 1 < args.len() {
                    flags.days = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--before" => {
                if i + 1 < args.len() {
                    flags.before = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--dry-run" => {
                flags.dry_run = true;
                i += 1;
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    flags.config = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    flags
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoveArgs {
    pub name: Option<String>,
    pub config: String,
    pub dry_run: bool,
}

pub(crate) fn parse_remove_args(args: &[String], start: usize) -> RemoveArgs {
    let mut parsed = RemoveArgs {
        name: None,
        config: DEFAULT_CONFIG_ARG.to_string(),
        dry_run: false,
    };
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--dry-run" => {
                parsed.dry_run = true;
                i += 1;
            }
            other => {
                if parsed.name.is_none() && !other.starts_with('-') {
                    parsed.name = Some(other.to_string());
                }
                i += 1;
            }
        }
    }
    parsed
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportFlags {
    pub config: String,
    pub dry_run: bool,
}

pub(crate) fn parse_import_flags(args: &[String], start: usize) -> ImportFlags {
    let mut flags = ImportFlags {
        config: DEFAULT_CONFIG_ARG.to_string(),
        dry_run: false,
    };
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    flags.config = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--dry-run" => {
                flags.dry_run = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    flags
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DashboardFlags {
    pub host: String,
    pub port: u16,
    pub token: Option<String>,
    pub config: String,
    pub remote: bool,
}

pub(crate) fn parse_dashboard_flags(args: &[String], start: usize) -> DashboardFlags {
    let mut flags = DashboardFlags {
        host: "127.0.0.1".to_string(),
        port: 4311,
        token: None,
        config: DEFAULT_CONFIG_ARG.to_string(),
        remote: false,
    };
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                if i + 1 < args.len() {
                    flags.host = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    flags.port = args[i + 1].parse().unwrap_or(4311);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--token" => {
                if i + 1 < args.len() {
                    flags.token = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    flags.config = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--remote" => {
                flags.remote = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    flags
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "sync" => sync::run_sync_command(&args).await?,
        "status" => status::run_status_command(&args).await?,
        "runs" => runs::run_runs_command(&args).await?,
        "import" => import::run_import_command(&args).await?,
        "dedupe" => dedupe::run_dedupe_command(&args).await?,
        "remove" => remove::run_remove_command(&args).await?,
        "prune" => prune::run_prune_command(&args)?,
        "init" => init::run_init_command()?,
        "dashboard" => dashboard::run_dashboard_command(&args).await?,
        "--version" | "-V" => println!("pacekeeper {}", env!("CARGO_PKG_VERSION")),
        "help" | "--help" | "-h" => print_help(),
        other => {
            print_error(&format!("Unknown command: {other}"));
            print_help();
            std::process::exit(1);
        }
    }
    Ok(())
}
