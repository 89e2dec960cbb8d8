use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::CalSyncResult;
use crate::event::Event;
use crate::store::{LocalEventStore, overwrite, select};
use crate::window::SyncWindow;

/// Cache persisted as a JSON array of events.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the cache, so an interrupted
/// write leaves the previous cache in place. The mutex serializes read-modify-write cycles
/// within this process.
pub struct JsonFileEventStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileEventStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> CalSyncResult<Vec<Event>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, events: &[Event]) -> CalSyncResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(events)?;

        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl LocalEventStore for JsonFileEventStore {
    async fn read(&self, window: &SyncWindow) -> CalSyncResult<Vec<Event>> {
        let _guard = self.lock.lock().await;
        let events = self.load().await?;
        Ok(select(&events, window))
    }

    async fn replace_range(&self, window: &SyncWindow, events: Vec<Event>) -> CalSyncResult<()> {
        let _guard = self.lock.lock().await;
        let mut stored = self.load().await?;
        overwrite(&mut stored, window, events);
        self.save(&stored).await
    }

    async fn delete_all(&self) -> CalSyncResult<()> {
        let _guard = self.lock.lock().await;
        self.save(&[]).await
    }
}
