//! Repeat rules for recurring events.
//!
//! A [`RecurrencePolicy`] is shared by every instance of a recurring event. The server stores one
//! event per instance, so cached events are never expanded here. [`RecurrencePolicy::occurrences`]
//! exists to preview what a policy will produce, expanded lazily and bounded by a query window.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::error::{CalSyncError, CalSyncResult};
use crate::window::SyncWindow;

/// Upper bound on instances produced by one expansion.
const MAX_OCCURRENCES: u16 = 366;

const ICS_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Unit the repeat frequency is counted in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatTerm {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RepeatTerm {
    /// Name sent to the server; `None` is sent as null.
    pub fn wire_name(self) -> Option<&'static str> {
        match self {
            RepeatTerm::None => None,
            RepeatTerm::Daily => Some("daily"),
            RepeatTerm::Weekly => Some("weekly"),
            RepeatTerm::Monthly => Some("monthly"),
            RepeatTerm::Yearly => Some("yearly"),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(RepeatTerm::None),
            "daily" => Some(RepeatTerm::Daily),
            "weekly" => Some(RepeatTerm::Weekly),
            "monthly" => Some(RepeatTerm::Monthly),
            "yearly" => Some(RepeatTerm::Yearly),
            _ => None,
        }
    }

    fn rrule_freq(self) -> Option<&'static str> {
        match self {
            RepeatTerm::None => None,
            RepeatTerm::Daily => Some("DAILY"),
            RepeatTerm::Weekly => Some("WEEKLY"),
            RepeatTerm::Monthly => Some("MONTHLY"),
            RepeatTerm::Yearly => Some("YEARLY"),
        }
    }
}

impl fmt::Display for RepeatTerm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.wire_name().unwrap_or("none"))
    }
}

/// An immutable repeat rule: every `frequency` `term`s, until `end_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePolicy {
    term: RepeatTerm,
    frequency: u32,
    end_date: DateTime<Utc>,
}

/// One concrete instance produced by expanding a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl RecurrencePolicy {
    /// Build a policy for an event ending at `event_end`.
    ///
    /// An `end_date` before `event_end` is raised to `event_end`, never rejected.
    pub fn new(
        term: RepeatTerm,
        frequency: u32,
        end_date: DateTime<Utc>,
        event_end: DateTime<Utc>,
    ) -> Self {
        RecurrencePolicy {
            term,
            frequency,
            end_date: Self::validate(end_date, event_end),
        }
    }

    /// Effective repeat end for an event ending at `event_end`.
    pub fn validate(candidate_end: DateTime<Utc>, event_end: DateTime<Utc>) -> DateTime<Utc> {
        if candidate_end < event_end {
            event_end
        } else {
            candidate_end
        }
    }

    /// Same rule, re-tied to an event that now ends at `event_end`.
    pub fn retied(&self, event_end: DateTime<Utc>) -> Self {
        Self::new(self.term, self.frequency, self.end_date, event_end)
    }

    pub fn term(&self) -> RepeatTerm {
        self.term
    }

    /// Multiplier of [`Self::term`]. Unused when the term is `None`.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    pub fn is_recurring(&self) -> bool {
        self.term != RepeatTerm::None
    }

    /// Instances of an event spanning `start..end` whose start lies in `window`.
    pub fn occurrences(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        window: &SyncWindow,
    ) -> CalSyncResult<Vec<Occurrence>> {
        let Some(freq) = self.term.rrule_freq() else {
            return Ok(if window.contains(start) {
                vec![Occurrence { start, end }]
            } else {
                Vec::new()
            });
        };

        let rrule_str = format!(
            "DTSTART:{}\nRRULE:FREQ={};INTERVAL={};UNTIL={}",
            start.format(ICS_UTC_FORMAT),
            freq,
            self.frequency,
            self.end_date.format(ICS_UTC_FORMAT)
        );

        let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
            CalSyncError::Recurrence(format!("Failed to parse RRULE '{}': {}", rrule_str, e))
        })?;

        // Widen by a second on the left so an instance exactly at window start is kept
        // whichever way the bounds are interpreted; the window filter below is authoritative.
        let tz: rrule::Tz = Utc.into();
        let after = (window.start() - Duration::seconds(1)).with_timezone(&tz);
        let before = window.end().with_timezone(&tz);

        let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);

        let duration = end - start;
        Ok(result
            .dates
            .iter()
            .map(|dt| dt.with_timezone(&Utc))
            .filter(|s| window.contains(*s))
            .map(|s| Occurrence {
                start: s,
                end: s + duration,
            })
            .collect())
    }
}
