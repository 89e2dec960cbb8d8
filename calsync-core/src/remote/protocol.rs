//! JSON shapes exchanged with the calendar server.
//!
//! Field names and date encodings here are part of the server contract: camelCase keys,
//! instants as RFC 3339 UTC strings with a `Z` suffix, colors as integer codes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{Event, EventColor, EventNotification, EventSummary};
use crate::failure::{TransportFailure, TransportResult};
use crate::recurrence::{RecurrencePolicy, RepeatTerm};

/// Format an instant the way the server expects in request bodies.
pub fn wire_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Body of a create-event request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub is_joinable: bool,
    pub is_visible: bool,
    pub memo: Option<String>,
    pub color: i32,
    pub alarm_minutes: Option<u32>,
    pub repeat_term: Option<String>,
    pub repeat_frequency: i32,
    pub repeat_end_date: String,
}

/// Ids arrive as numbers from some endpoints and strings from others.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Number(n) => n.to_string(),
            WireId::Text(s) => s,
        }
    }
}

fn default_visible() -> bool {
    true
}

/// One event in a range response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: WireId,
    #[serde(default)]
    pub calendar_id: Option<WireId>,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub is_joinable: bool,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub color: Option<i32>,
    #[serde(default)]
    pub alarm_minutes: Option<u32>,
    #[serde(default)]
    pub repeat_term: Option<String>,
    #[serde(default)]
    pub repeat_frequency: Option<u32>,
    #[serde(default)]
    pub repeat_end_date: Option<DateTime<Utc>>,
}

impl TryFrom<EventResponse> for Event {
    type Error = TransportFailure;

    fn try_from(response: EventResponse) -> TransportResult<Self> {
        let id = String::from(response.id);

        if response.title.trim().is_empty() {
            return Err(TransportFailure::Decode(format!("event {id} has no title")));
        }
        if response.start_date >= response.end_date {
            return Err(TransportFailure::Decode(format!(
                "event {id} does not start before it ends"
            )));
        }

        let color = match response.color {
            None => EventColor::default(),
            Some(code) => EventColor::from_code(code).unwrap_or_else(|| {
                debug!("event {} has unknown color code {}", id, code);
                EventColor::default()
            }),
        };

        let notification = match response.alarm_minutes {
            None => EventNotification::None,
            Some(minutes) => EventNotification::from_minutes(minutes).unwrap_or_else(|| {
                debug!("event {} has unsupported alarm offset {}m", id, minutes);
                EventNotification::None
            }),
        };

        let recurrence = match response.repeat_term.as_deref() {
            None => None,
            Some(name) => {
                let term = RepeatTerm::from_name(name).ok_or_else(|| {
                    TransportFailure::Decode(format!("event {id} has unknown repeat term '{name}'"))
                })?;
                Some(RecurrencePolicy::new(
                    term,
                    response.repeat_frequency.unwrap_or(1),
                    response.repeat_end_date.unwrap_or(response.end_date),
                    response.end_date,
                ))
            }
        };

        Ok(Event {
            id,
            calendar_id: response.calendar_id.map(String::from),
            title: response.title,
            start: response.start_date,
            end: response.end_date,
            is_joinable: response.is_joinable,
            is_visible: response.is_visible,
            memo: response.memo.filter(|m| !m.is_empty()),
            color,
            recurrence,
            notification,
        })
    }
}

/// Decode a whole range response. One malformed event rejects the response, since a partial
/// range must never be written over the cache.
pub fn decode_events(responses: Vec<EventResponse>) -> TransportResult<Vec<Event>> {
    responses.into_iter().map(Event::try_from).collect()
}

/// One hit in a search response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummaryResponse {
    pub id: WireId,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub is_joinable: bool,
}

impl From<EventSummaryResponse> for EventSummary {
    fn from(response: EventSummaryResponse) -> Self {
        EventSummary {
            id: response.id.into(),
            title: response.title,
            start: response.start_date,
            end: response.end_date,
            is_joinable: response.is_joinable,
        }
    }
}
