use anyhow::Result;

use super::parse_sync_flags;
use crate::core::openclaw::OpenClawGateway;
use crate::core::store::CacheStore;
use crate::core::sync::{SyncOptions, run_sync};

pub async fn run_sync_command(args: &[String]) -> Result<()> {
    let flags = parse_sync_flags(args, 2);
    let gateway = OpenClawGateway::new();
    let store = CacheStore::open_default()?;

    let outcome = run_sync(
        &gateway,
        &store,
        &SyncOptions {
            config: flags.config,
            dry_run: flags.dry_run,
            force: flags.force,
        },
    )
    .await?;

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
