use anyhow::Result;

use super::parse_remove_args;
use crate::core::openclaw::OpenClawGateway;
use crate::core::remove::{RemoveOptions, run_remove};
use crate::core::terminal::print_error;

pub async fn run_remove_command(args: &[String]) -> Result<()> {
    let parsed = parse_remove_args(args, 2);
    let Some(name) = parsed.name else {
        print_error("Please provide a heartbeat name to remove");
        println!("Example: pacekeeper remove \"Morning Briefing\"\n");
        std::process::exit(1);
    };

    let gateway = OpenClawGateway::new();
    let outcome = run_remove(
        &gateway,
        &name,
        &RemoveOptions {
            config: parsed.config,
            dry_run: parsed.dry_run,
        },
    )
    .await?;

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
