use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, watch};
use tracing::debug;

use crate::authoring::{AuthoringError, DraftError, EventAuthoringFlow, EventDraft};
use crate::event::{EventColor, EventNotification};
use crate::failure::DomainFailure;
use crate::recurrence::{RecurrencePolicy, RepeatTerm};

/// How a failed save should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureNotice {
    /// The user can try again as is.
    Retryable(DomainFailure),
    /// The session is gone; the user has to sign in again.
    ReauthRequired,
    /// The draft needs fixing first.
    Invalid(DraftError),
}

impl From<AuthoringError> for FailureNotice {
    fn from(error: AuthoringError) -> Self {
        match error {
            AuthoringError::Invalid(e) => FailureNotice::Invalid(e),
            AuthoringError::Failed(f) if f.requires_reauth() => FailureNotice::ReauthRequired,
            AuthoringError::Failed(f) => FailureNotice::Retryable(f),
        }
    }
}

/// One-shot notice produced by [`AuthoringSession::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthoringNotice {
    Saved,
    Failed(FailureNotice),
}

/// Holds at most one pending notice. Posting replaces whatever was not yet taken.
#[derive(Default)]
struct NoticeSlot {
    pending: Mutex<Option<AuthoringNotice>>,
    notify: Notify,
}

impl NoticeSlot {
    fn post(&self, notice: AuthoringNotice) {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(dropped) = pending.replace(notice) {
            debug!(?dropped, "replaced unconsumed notice");
        }
        drop(pending);
        self.notify.notify_one();
    }

    fn take(&self) -> Option<AuthoringNotice> {
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
    }

    async fn next(&self) -> AuthoringNotice {
        loop {
            let notified = self.notify.notified();
            if let Some(notice) = self.take() {
                return notice;
            }
            notified.await;
        }
    }
}

/// Observable state of one "new event" form.
///
/// The draft lives in a [`watch`] channel so any number of views can follow it; notices are
/// delivered once, newest wins.
pub struct AuthoringSession {
    draft: watch::Sender<EventDraft>,
    notices: NoticeSlot,
}

impl AuthoringSession {
    pub fn new(draft: EventDraft) -> Self {
        AuthoringSession {
            draft: watch::Sender::new(draft),
            notices: NoticeSlot::default(),
        }
    }

    /// Current draft.
    pub fn draft(&self) -> EventDraft {
        self.draft.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EventDraft> {
        self.draft.subscribe()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.draft.send_modify(|d| d.title = title);
    }

    /// Move the event. The repeat end is raised to the new end if it would fall before it.
    pub fn set_schedule(&self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.draft.send_modify(|d| {
            d.start = start;
            d.end = end;
            d.repeat_end = RecurrencePolicy::validate(d.repeat_end, end);
        });
    }

    pub fn set_memo(&self, memo: impl Into<String>) {
        let memo = memo.into();
        self.draft.send_modify(|d| d.memo = memo);
    }

    pub fn set_visible(&self, visible: bool) {
        self.draft.send_modify(|d| d.is_visible = visible);
    }

    pub fn set_joinable(&self, joinable: bool) {
        self.draft.send_modify(|d| d.is_joinable = joinable);
    }

    pub fn set_color(&self, color: EventColor) {
        self.draft.send_modify(|d| d.color = color);
    }

    pub fn set_notification(&self, notification: EventNotification) {
        self.draft.send_modify(|d| d.notification = notification);
    }

    pub fn set_repeat_term(&self, term: RepeatTerm) {
        self.draft.send_modify(|d| d.repeat_term = term);
    }

    pub fn set_repeat_frequency(&self, frequency: i32) {
        self.draft.send_modify(|d| d.repeat_frequency = frequency);
    }

    /// Clamped to the event end.
    pub fn set_repeat_end(&self, repeat_end: DateTime<Utc>) {
        self.draft
            .send_modify(|d| d.repeat_end = RecurrencePolicy::validate(repeat_end, d.end));
    }

    /// Submit the current draft and post the result as a notice.
    pub async fn save(&self, flow: &EventAuthoringFlow) -> Result<(), AuthoringError> {
        let draft = self.draft();
        let result = flow.submit(&draft).await;

        let notice = match &result {
            Ok(()) => AuthoringNotice::Saved,
            Err(e) => AuthoringNotice::Failed(e.clone().into()),
        };
        self.notices.post(notice);
        result
    }

    /// Wait for the next notice.
    pub async fn next_notice(&self) -> AuthoringNotice {
        self.notices.next().await
    }

    pub fn try_next_notice(&self) -> Option<AuthoringNotice> {
        self.notices.take()
    }
}
