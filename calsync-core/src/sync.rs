//! Fetch-then-overwrite reconciliation of the local cache.
//!
//! [`SyncCoordinator::reconcile`] always answers from the cache. The remote attempt only decides
//! whether the cache was refreshed first; remote failures are logged and otherwise invisible.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::CalSyncResult;
use crate::event::{Event, EventSummary};
use crate::failure::{DomainFailure, TransportFailure, translate};
use crate::remote::RemoteEventSource;
use crate::store::LocalEventStore;
use crate::window::SyncWindow;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened to the cache during one reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The window was overwritten with `fetched` remote events.
    Refreshed { fetched: usize },
    /// The remote call failed; the cache was left as it was.
    RemoteFailed(DomainFailure),
    /// The remote answered but the overwrite could not be written.
    StoreWriteFailed(String),
}

impl SyncOutcome {
    pub fn is_fresh(&self) -> bool {
        matches!(self, SyncOutcome::Refreshed { .. })
    }
}

/// Result of [`SyncCoordinator::reconcile_with_report`].
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub events: Vec<Event>,
    pub outcome: SyncOutcome,
}

pub struct SyncCoordinator {
    store: Arc<dyn LocalEventStore>,
    remote: Arc<dyn RemoteEventSource>,
    fetch_timeout: Duration,
}

impl SyncCoordinator {
    pub fn new(store: Arc<dyn LocalEventStore>, remote: Arc<dyn RemoteEventSource>) -> Self {
        SyncCoordinator {
            store,
            remote,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Best-known events for `window`.
    ///
    /// Only a failure to read the cache is returned as an error.
    pub async fn reconcile(&self, window: &SyncWindow) -> CalSyncResult<Vec<Event>> {
        Ok(self.reconcile_with_report(window).await?.events)
    }

    /// Like [`Self::reconcile`], also reporting whether the answer is fresh.
    pub async fn reconcile_with_report(&self, window: &SyncWindow) -> CalSyncResult<Reconciled> {
        let outcome = self.refresh(window).await;
        let events = self.store.read(window).await?;

        debug!(%window, count = events.len(), ?outcome, "reconciled window");
        Ok(Reconciled { events, outcome })
    }

    /// Keyword search against the remote. Not cached; failures are surfaced.
    pub async fn search(
        &self,
        keyword: Option<&str>,
        window: &SyncWindow,
    ) -> Result<Vec<EventSummary>, DomainFailure> {
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
        self.remote.search(keyword, window).await.map_err(translate)
    }

    /// Drop the whole cache, e.g. on sign-out.
    pub async fn clear_cache(&self) -> CalSyncResult<()> {
        self.store.delete_all().await?;
        info!("cleared local event cache");
        Ok(())
    }

    async fn refresh(&self, window: &SyncWindow) -> SyncOutcome {
        let fetched = match self.fetch(window).await {
            Ok(events) => events,
            Err(failure) => {
                warn!(%window, error = %failure, "remote fetch failed, serving cached events");
                return SyncOutcome::RemoteFailed(failure);
            }
        };

        let total = fetched.len();
        let in_window: Vec<Event> = fetched
            .into_iter()
            .filter(|e| window.contains(e.start))
            .collect();
        if in_window.len() < total {
            debug!(
                %window,
                dropped = total - in_window.len(),
                "ignoring fetched events that start outside the window"
            );
        }

        let count = in_window.len();
        match self.store.replace_range(window, in_window).await {
            Ok(()) => {
                info!(%window, count, "replaced cached events");
                SyncOutcome::Refreshed { fetched: count }
            }
            Err(e) => {
                warn!(%window, error = %e, "could not write fetched events, serving cached events");
                SyncOutcome::StoreWriteFailed(e.to_string())
            }
        }
    }

    async fn fetch(&self, window: &SyncWindow) -> Result<Vec<Event>, DomainFailure> {
        debug!(
            start = %window.server_start_date(),
            end = %window.server_end_date(),
            "fetching remote events"
        );

        match tokio::time::timeout(self.fetch_timeout, self.remote.fetch(window)).await {
            Ok(result) => result.map_err(translate),
            Err(_) => Err(translate(TransportFailure::Timeout {
                secs: self.fetch_timeout.as_secs(),
            })),
        }
    }
}
