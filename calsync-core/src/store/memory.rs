use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CalSyncError, CalSyncResult};
use crate::event::Event;
use crate::store::{LocalEventStore, overwrite, select};
use crate::window::SyncWindow;

/// Process-local cache.
///
/// Every operation runs under one lock with no await inside it, so the delete+insert pair of
/// an overwrite cannot be observed or cancelled halfway.
#[derive(Default)]
pub struct MemoryEventStore {
    events: Mutex<Vec<Event>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<Event>) -> Self {
        MemoryEventStore {
            events: Mutex::new(events),
        }
    }

    /// Number of cached events, regardless of window.
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn locked<T>(&self, f: impl FnOnce(&mut Vec<Event>) -> T) -> CalSyncResult<T> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| CalSyncError::Store("event cache lock poisoned".into()))?;
        Ok(f(&mut events))
    }
}

#[async_trait]
impl LocalEventStore for MemoryEventStore {
    async fn read(&self, window: &SyncWindow) -> CalSyncResult<Vec<Event>> {
        self.locked(|events| select(events, window))
    }

    async fn replace_range(&self, window: &SyncWindow, events: Vec<Event>) -> CalSyncResult<()> {
        self.locked(|stored| overwrite(stored, window, events))
    }

    async fn delete_all(&self) -> CalSyncResult<()> {
        self.locked(|stored| stored.clear())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::event;
    use chrono::{TimeZone, Utc};

    fn window() -> SyncWindow {
        SyncWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn read_returns_only_events_starting_in_window_sorted() {
        let store = MemoryEventStore::with_events(vec![
            event("b", Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap()),
            event("a", Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()),
            event("late", Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap()),
        ]);

        let ids: Vec<String> = store
            .read(&window())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();

        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn replace_range_overwrites_window_and_keeps_outside_rows() {
        let outside = event("outside", Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap());
        let store = MemoryEventStore::with_events(vec![
            event("stale", Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()),
            outside.clone(),
        ]);

        store
            .replace_range(
                &window(),
                vec![event("fresh", Utc.with_ymd_and_hms(2024, 1, 4, 9, 0, 0).unwrap())],
            )
            .await
            .unwrap();

        let in_window: Vec<String> = store
            .read(&window())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(in_window, vec!["fresh"]);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn replace_range_moves_an_event_that_changed_day() {
        // Same id cached outside the window; the remote now places it inside.
        let store = MemoryEventStore::with_events(vec![event(
            "moved",
            Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(),
        )]);

        store
            .replace_range(
                &window(),
                vec![event("moved", Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap())],
            )
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.read(&window()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_all_empties_the_cache() {
        let store = MemoryEventStore::with_events(vec![event(
            "a",
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
        )]);

        store.delete_all().await.unwrap();

        assert!(store.is_empty());
    }
}
