use anyhow::Result;

use crate::core::dedupe::run_dedupe;
use crate::core::openclaw::OpenClawGateway;

pub async fn run_dedupe_command(args: &[String]) -> Result<()> {
    let dry_run = args.iter().skip(2).any(|a| a == "--dry-run");
    let gateway = OpenClawGateway::new();

    let outcome = run_dedupe(&gateway, dry_run).await?;
    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
