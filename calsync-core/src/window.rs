//! Half-open date windows used to scope a reconciliation pass or a query.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::error::{CalSyncError, CalSyncResult};

/// Date format the remote server expects for range queries.
pub const SERVER_DATE_FORMAT: &str = "%Y-%m-%d";

/// A half-open range `[start, end)`.
///
/// Windows carry no identity: two windows with the same bounds are interchangeable, and nothing
/// locks one window against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl SyncWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CalSyncResult<Self> {
        if start >= end {
            return Err(CalSyncError::InvalidWindow(format!(
                "start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(SyncWindow { start, end })
    }

    /// Whole days `[from, until)` in UTC.
    pub fn from_dates(from: NaiveDate, until: NaiveDate) -> CalSyncResult<Self> {
        Self::new(start_of_day(from), start_of_day(until))
    }

    /// `days` whole days either side of `today`, including `today` itself.
    pub fn days_around(today: NaiveDate, days: i64) -> CalSyncResult<Self> {
        Self::from_dates(
            shift(today, days.checked_neg())?,
            shift(today, days.checked_add(1))?,
        )
    }

    /// Parse CLI-style bounds.
    /// - `from`: YYYY-MM-DD, defaults to `days` before today
    /// - `to`: YYYY-MM-DD (inclusive), defaults to `days` after today
    pub fn from_args(from: Option<&str>, to: Option<&str>, days: i64) -> CalSyncResult<Self> {
        let today = Utc::now().date_naive();

        let from = match from {
            Some(s) => parse_date(s)?,
            None => shift(today, days.checked_neg())?,
        };
        let to = match to {
            Some(s) => parse_date(s)?,
            None => shift(today, Some(days))?,
        };

        Self::from_dates(from, shift(to, Some(1))?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// True if `other` lies entirely inside this window.
    pub fn covers(&self, other: &SyncWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn server_start_date(&self) -> String {
        self.start.format(SERVER_DATE_FORMAT).to_string()
    }

    pub fn server_end_date(&self) -> String {
        self.end.format(SERVER_DATE_FORMAT).to_string()
    }
}

impl fmt::Display for SyncWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Move `date` by a whole number of days. `None` stands for an offset that already overflowed.
fn shift(date: NaiveDate, days: Option<i64>) -> CalSyncResult<NaiveDate> {
    days.and_then(TimeDelta::try_days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| CalSyncError::InvalidWindow(format!("day offset from {} is out of range", date)))
}

fn parse_date(s: &str) -> CalSyncResult<NaiveDate> {
    NaiveDate::parse_from_str(s, SERVER_DATE_FORMAT).map_err(|_| {
        CalSyncError::InvalidWindow(format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
    })
}
