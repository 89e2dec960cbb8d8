#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use calsync_core::failure::{TransportFailure, TransportResult};
use calsync_core::remote::RemoteEventSource;
use calsync_core::remote::protocol::CreateEventRequest;
use calsync_core::window::SyncWindow;
use calsync_core::{Event, EventColor, EventNotification, EventSummary};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn window(from: DateTime<Utc>, to: DateTime<Utc>) -> SyncWindow {
    SyncWindow::new(from, to).unwrap()
}

pub fn event(id: &str, start: DateTime<Utc>) -> Event {
    Event {
        id: id.to_string(),
        calendar_id: None,
        title: format!("Event {id}"),
        start,
        end: start + ChronoDuration::hours(1),
        is_joinable: false,
        is_visible: true,
        memo: None,
        color: EventColor::Green,
        recurrence: None,
        notification: EventNotification::None,
    }
}

pub fn ids(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}

/// Scripted remote: serves a fixed event list or a fixed failure, and records calls.
#[derive(Default)]
pub struct FakeRemote {
    events: Mutex<Vec<Event>>,
    failure: Mutex<Option<TransportFailure>>,
    delay: Option<Duration>,
    /// Answer fetches with every scripted event, ignoring the requested window.
    ignores_window: bool,
    pub fetches: AtomicUsize,
    pub created: Mutex<Vec<CreateEventRequest>>,
    pub searches: Mutex<Vec<Option<String>>>,
}

impl FakeRemote {
    pub fn serving(events: Vec<Event>) -> Self {
        FakeRemote {
            events: Mutex::new(events),
            ..Default::default()
        }
    }

    pub fn serving_regardless_of_window(events: Vec<Event>) -> Self {
        FakeRemote {
            events: Mutex::new(events),
            ignores_window: true,
            ..Default::default()
        }
    }

    pub fn slow_serving(delay: Duration, events: Vec<Event>) -> Self {
        FakeRemote {
            events: Mutex::new(events),
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn failing(failure: TransportFailure) -> Self {
        FakeRemote {
            failure: Mutex::new(Some(failure)),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        FakeRemote {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn set_events(&self, events: Vec<Event>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    fn scripted_failure(&self) -> Option<TransportFailure> {
        self.failure.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteEventSource for FakeRemote {
    async fn fetch(&self, window: &SyncWindow) -> TransportResult<Vec<Event>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = self.scripted_failure() {
            return Err(failure);
        }
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| self.ignores_window || window.contains(e.start))
            .cloned()
            .collect())
    }

    async fn create(&self, request: &CreateEventRequest) -> TransportResult<()> {
        self.created.lock().unwrap().push(request.clone());
        match self.scripted_failure() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    async fn search(
        &self,
        keyword: Option<&str>,
        window: &SyncWindow,
    ) -> TransportResult<Vec<EventSummary>> {
        self.searches
            .lock()
            .unwrap()
            .push(keyword.map(str::to_string));
        if let Some(failure) = self.scripted_failure() {
            return Err(failure);
        }
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| window.contains(e.start))
            .filter(|e| keyword.is_none_or(|k| e.title.contains(k)))
            .map(|e| EventSummary {
                id: e.id.clone(),
                title: e.title.clone(),
                start: e.start,
                end: e.end,
                is_joinable: e.is_joinable,
            })
            .collect())
    }
}
