//! The authoritative event source.
//!
//! Implementations speak to the server and report failures as raw [`TransportFailure`]s;
//! translating them is the caller's job. The core treats a source as stateless.

pub mod protocol;

use async_trait::async_trait;

use crate::event::{Event, EventSummary};
use crate::failure::TransportResult;
use crate::remote::protocol::CreateEventRequest;
use crate::window::SyncWindow;

#[async_trait]
pub trait RemoteEventSource: Send + Sync {
    /// Every event whose start lies in `window`. The response is treated as complete.
    async fn fetch(&self, window: &SyncWindow) -> TransportResult<Vec<Event>>;

    async fn create(&self, request: &CreateEventRequest) -> TransportResult<()>;

    async fn search(
        &self,
        keyword: Option<&str>,
        window: &SyncWindow,
    ) -> TransportResult<Vec<EventSummary>>;
}
