use anyhow::Result;
use calsync_core::sync::SyncCoordinator;
use calsync_core::window::SyncWindow;
use owo_colors::OwoColorize;

use crate::render::{Render, format_date_label, local_date, stale_notice};
use crate::utils::tui::create_spinner;

pub async fn run(sync: &SyncCoordinator, window: SyncWindow) -> Result<()> {
    let spinner = create_spinner("Syncing events...");
    let reconciled = sync.reconcile_with_report(&window).await;
    spinner.finish_and_clear();
    let reconciled = reconciled?;

    if let Some(notice) = stale_notice(&reconciled.outcome) {
        eprintln!("{}", notice.yellow());
    }

    if reconciled.events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    // Events arrive ordered by start, so one pass groups them by local day.
    let mut current_date = None;

    for event in &reconciled.events {
        let date = local_date(event.start);

        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", format_date_label(date).bold());
            current_date = Some(date);
        }

        println!("  {}", event.render());
    }

    Ok(())
}
