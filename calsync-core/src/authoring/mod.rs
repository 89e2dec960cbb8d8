//! Building and submitting new events.
//!
//! [`EventAuthoringFlow::submit`] validates a draft, normalizes it into the server's create
//! request and sends it. It never writes to the local cache: a created event shows up locally
//! only after the next reconcile that covers its start.

mod session;

pub use session::{AuthoringNotice, AuthoringSession, FailureNotice};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::event::{EventColor, EventNotification};
use crate::failure::{DomainFailure, translate};
use crate::recurrence::{Occurrence, RecurrencePolicy, RepeatTerm};
use crate::remote::RemoteEventSource;
use crate::remote::protocol::{CreateEventRequest, wire_instant};
use crate::window::SyncWindow;

/// Input problems caught before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Event must start before it ends")]
    EndNotAfterStart,

    #[error("Repeat frequency must be positive for {term} events, got {frequency}")]
    NonPositiveFrequency { term: RepeatTerm, frequency: i32 },

    #[error("Could not expand recurrence: {0}")]
    Recurrence(String),
}

/// Why a submit did not go through.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthoringError {
    #[error(transparent)]
    Invalid(#[from] DraftError),

    #[error(transparent)]
    Failed(#[from] DomainFailure),
}

impl AuthoringError {
    pub fn requires_reauth(&self) -> bool {
        matches!(self, AuthoringError::Failed(f) if f.requires_reauth())
    }

    /// True when resubmitting the same draft may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthoringError::Failed(f) if f.is_retryable())
    }
}

/// A new event as entered by the user, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_joinable: bool,
    pub is_visible: bool,
    pub memo: String,
    pub color: EventColor,
    pub notification: EventNotification,
    pub repeat_term: RepeatTerm,
    /// Raw user input; only checked when the term repeats.
    pub repeat_frequency: i32,
    pub repeat_end: DateTime<Utc>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        EventDraft {
            title: title.into(),
            start,
            end,
            is_joinable: true,
            is_visible: true,
            memo: String::new(),
            color: EventColor::default(),
            notification: EventNotification::default(),
            repeat_term: RepeatTerm::None,
            repeat_frequency: 1,
            repeat_end: end,
        }
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::EmptyTitle);
        }
        if self.start >= self.end {
            return Err(DraftError::EndNotAfterStart);
        }
        if self.repeat_term != RepeatTerm::None && self.repeat_frequency <= 0 {
            return Err(DraftError::NonPositiveFrequency {
                term: self.repeat_term,
                frequency: self.repeat_frequency,
            });
        }
        Ok(())
    }

    /// Memo as sent to the server: blank becomes absent.
    pub fn normalized_memo(&self) -> Option<String> {
        let memo = self.memo.trim();
        (!memo.is_empty()).then(|| memo.to_string())
    }

    /// The repeat rule this draft describes, with its end date clamped to the event end.
    pub fn recurrence(&self) -> Result<Option<RecurrencePolicy>, DraftError> {
        self.validate()?;
        if self.repeat_term == RepeatTerm::None {
            return Ok(None);
        }
        // validate() guarantees a positive frequency here.
        let frequency = self.repeat_frequency.unsigned_abs();
        Ok(Some(RecurrencePolicy::new(
            self.repeat_term,
            frequency,
            self.repeat_end,
            self.end,
        )))
    }

    pub fn to_request(&self) -> Result<CreateEventRequest, DraftError> {
        self.validate()?;
        let repeat_end = RecurrencePolicy::validate(self.repeat_end, self.end);

        Ok(CreateEventRequest {
            title: self.title.trim().to_string(),
            start_date: wire_instant(self.start),
            end_date: wire_instant(self.end),
            is_joinable: self.is_joinable,
            is_visible: self.is_visible,
            memo: self.normalized_memo(),
            color: self.color.code(),
            alarm_minutes: self.notification.minutes(),
            repeat_term: self.repeat_term.wire_name().map(str::to_string),
            repeat_frequency: self.repeat_frequency,
            repeat_end_date: wire_instant(repeat_end),
        })
    }

    /// The instances the server will materialize for this draft, limited to `window`.
    pub fn preview(&self, window: &SyncWindow) -> Result<Vec<Occurrence>, DraftError> {
        let policy = match self.recurrence()? {
            Some(policy) => policy,
            None => RecurrencePolicy::new(RepeatTerm::None, 0, self.end, self.end),
        };
        policy
            .occurrences(self.start, self.end, window)
            .map_err(|e| DraftError::Recurrence(e.to_string()))
    }
}

/// Submits drafts to the remote source.
pub struct EventAuthoringFlow {
    remote: Arc<dyn RemoteEventSource>,
}

impl EventAuthoringFlow {
    pub fn new(remote: Arc<dyn RemoteEventSource>) -> Self {
        EventAuthoringFlow { remote }
    }

    /// Validate, normalize and create the event. Nothing is retried.
    pub async fn submit(&self, draft: &EventDraft) -> Result<(), AuthoringError> {
        let request = draft.to_request().inspect_err(|e| {
            debug!(error = %e, "rejected draft before submitting");
        })?;

        debug!(
            title = %request.title,
            start = %request.start_date,
            repeat = ?request.repeat_term,
            "creating event"
        );

        if let Err(failure) = self.remote.create(&request).await {
            let failure = translate(failure);
            warn!(error = %failure, "event creation failed");
            return Err(failure.into());
        }

        info!(title = %request.title, "event created");
        Ok(())
    }
}
