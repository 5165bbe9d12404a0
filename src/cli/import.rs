use anyhow::Result;

use super::parse_import_flags;
use crate::core::import::{ImportOptions, run_import};
use crate::core::openclaw::OpenClawGateway;

pub async fn run_import_command(args: &[String]) -> Result<()> {
    let flags = parse_import_flags(args, 2);
    let gateway = OpenClawGateway::new();

    run_import(
        &gateway,
        ImportOptions {
            config: flags.config,
            dry_run: flags.dry_run,
        },
    )
    .await?;
    Ok(())
}
