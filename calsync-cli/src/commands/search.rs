use anyhow::Result;
use calsync_core::sync::SyncCoordinator;
use calsync_core::window::SyncWindow;
use owo_colors::OwoColorize;

use crate::render::{Render, describe_failure};

pub async fn run(sync: &SyncCoordinator, keyword: Option<&str>, window: SyncWindow) -> Result<()> {
    let hits = sync
        .search(keyword, &window)
        .await
        .map_err(|f| anyhow::anyhow!("Search failed: {}", describe_failure(&f)))?;

    if hits.is_empty() {
        println!("{}", "No matching events".dimmed());
        return Ok(());
    }

    for hit in &hits {
        println!("  {}", hit.render());
    }

    Ok(())
}
