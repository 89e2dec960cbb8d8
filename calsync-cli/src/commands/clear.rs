use anyhow::Result;
use calsync_core::sync::SyncCoordinator;
use owo_colors::OwoColorize;

pub async fn run(sync: &SyncCoordinator) -> Result<()> {
    sync.clear_cache().await?;
    println!("{}", "Cleared cached events".green());
    Ok(())
}
