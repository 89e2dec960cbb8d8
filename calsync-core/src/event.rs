//! Event types shared by the cache, the remote source and the authoring flow.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrencePolicy;

/// One calendar occurrence, owned by the calendar it belongs to.
///
/// `start < end` holds for every event built by this crate; remote payloads that break it are
/// rejected while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub calendar_id: Option<String>,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_joinable: bool,
    pub is_visible: bool,
    /// Free text; `None` rather than empty.
    pub memo: Option<String>,
    pub color: EventColor,
    pub recurrence: Option<RecurrencePolicy>,
    pub notification: EventNotification,
}

impl Event {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.as_ref().is_some_and(|p| p.is_recurring())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Color tag, chosen by variant. The integer code is only a wire detail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    #[default]
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Gray,
}

impl EventColor {
    pub const ALL: [EventColor; 7] = [
        EventColor::Red,
        EventColor::Orange,
        EventColor::Yellow,
        EventColor::Green,
        EventColor::Blue,
        EventColor::Purple,
        EventColor::Gray,
    ];

    pub fn code(self) -> i32 {
        match self {
            EventColor::Red => 0,
            EventColor::Orange => 1,
            EventColor::Yellow => 2,
            EventColor::Green => 3,
            EventColor::Blue => 4,
            EventColor::Purple => 5,
            EventColor::Gray => 6,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            EventColor::Red => "red",
            EventColor::Orange => "orange",
            EventColor::Yellow => "yellow",
            EventColor::Green => "green",
            EventColor::Blue => "blue",
            EventColor::Purple => "purple",
            EventColor::Gray => "gray",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// How long before the start a reminder fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventNotification {
    #[default]
    None,
    AtStart,
    FiveMinutes,
    TenMinutes,
    ThirtyMinutes,
    OneHour,
    OneDay,
}

impl EventNotification {
    pub const ALL: [EventNotification; 7] = [
        EventNotification::None,
        EventNotification::AtStart,
        EventNotification::FiveMinutes,
        EventNotification::TenMinutes,
        EventNotification::ThirtyMinutes,
        EventNotification::OneHour,
        EventNotification::OneDay,
    ];

    /// Minutes before the start, or `None` when no reminder is set.
    pub fn minutes(self) -> Option<u32> {
        match self {
            EventNotification::None => None,
            EventNotification::AtStart => Some(0),
            EventNotification::FiveMinutes => Some(5),
            EventNotification::TenMinutes => Some(10),
            EventNotification::ThirtyMinutes => Some(30),
            EventNotification::OneHour => Some(60),
            EventNotification::OneDay => Some(1440),
        }
    }

    /// Exact match only; offsets with no variant yield `None`.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|n| n.minutes() == Some(minutes))
    }
}

/// Search hit returned by the remote source. Not cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_joinable: bool,
}
