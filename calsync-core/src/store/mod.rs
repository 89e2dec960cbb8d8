//! Local event cache.
//!
//! The cache is keyed by event id and queried by window. Reconciliation needs exactly one
//! write primitive, [`LocalEventStore::replace_range`], which must be atomic: a reader, a crash or
//! a cancelled task observes the cache either before or after it, never in between.

mod file;
mod memory;

pub use file::JsonFileEventStore;
pub use memory::MemoryEventStore;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::CalSyncResult;
use crate::event::Event;
use crate::window::SyncWindow;

#[async_trait]
pub trait LocalEventStore: Send + Sync {
    /// Events whose start lies in `window`, ordered by start then id.
    async fn read(&self, window: &SyncWindow) -> CalSyncResult<Vec<Event>>;

    /// Delete every event whose start lies in `window`, then insert `events` (replacing any
    /// stored event with the same id), as one transaction.
    async fn replace_range(&self, window: &SyncWindow, events: Vec<Event>) -> CalSyncResult<()>;

    /// Drop every cached event.
    async fn delete_all(&self) -> CalSyncResult<()>;
}

/// Apply an overwrite to an in-memory event list. Shared by the store implementations.
fn overwrite(stored: &mut Vec<Event>, window: &SyncWindow, events: Vec<Event>) {
    let incoming: HashSet<&str> = events.iter().map(|e| e.id.as_str()).collect();
    stored.retain(|e| !window.contains(e.start) && !incoming.contains(e.id.as_str()));

    // Last one wins when the batch repeats an id.
    let mut seen = HashSet::new();
    let mut batch: Vec<Event> = events
        .into_iter()
        .rev()
        .filter(|e| seen.insert(e.id.clone()))
        .collect();
    batch.reverse();
    stored.extend(batch);
}

fn select(stored: &[Event], window: &SyncWindow) -> Vec<Event> {
    let mut events: Vec<Event> = stored
        .iter()
        .filter(|e| window.contains(e.start))
        .cloned()
        .collect();
    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    events
}
