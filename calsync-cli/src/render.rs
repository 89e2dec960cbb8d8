//! Terminal rendering for calsync types.
//!
//! Extension traits that add colored output to calsync-core types using owo_colors.

use calsync_core::authoring::FailureNotice;
use calsync_core::failure::DomainFailure;
use calsync_core::recurrence::Occurrence;
use calsync_core::sync::SyncOutcome;
use calsync_core::{Event, EventColor, EventSummary};
use chrono::{DateTime, Local, NaiveDate, Utc};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventColor {
    fn render(&self) -> String {
        let dot = "●";
        match self {
            EventColor::Red => dot.red().to_string(),
            EventColor::Orange => dot.bright_red().to_string(),
            EventColor::Yellow => dot.yellow().to_string(),
            EventColor::Green => dot.green().to_string(),
            EventColor::Blue => dot.blue().to_string(),
            EventColor::Purple => dot.magenta().to_string(),
            EventColor::Gray => dot.bright_black().to_string(),
        }
    }
}

impl Render for Event {
    fn render(&self) -> String {
        let mut line = format!(
            "{} {} {}",
            format_time(self.start),
            self.color.render(),
            self.title
        );
        if self.is_recurring() {
            line.push_str(&format!(" {}", "↻".dimmed()));
        }
        if !self.is_visible {
            line.push_str(&format!(" {}", "(private)".dimmed()));
        }
        if let Some(minutes) = self.notification.minutes() {
            line.push_str(&format!(" {}", format!("[alarm -{}m]", minutes).dimmed()));
        }
        line
    }
}

impl Render for EventSummary {
    fn render(&self) -> String {
        let day = local_date(self.start).format("%a %b %-d");
        let joinable = if self.is_joinable { " (joinable)" } else { "" };
        format!(
            "{} {} {}{}",
            day.to_string().bold(),
            format_time(self.start),
            self.title,
            joinable.dimmed()
        )
    }
}

impl Render for Occurrence {
    fn render(&self) -> String {
        format!(
            "{} {} - {}",
            local_date(self.start).format("%a %b %-d").to_string().bold(),
            format_time(self.start).trim_start(),
            format_time(self.end).trim_start()
        )
    }
}

/// Explain why an outcome is not fresh. `None` when it is.
pub fn stale_notice(outcome: &SyncOutcome) -> Option<String> {
    match outcome {
        SyncOutcome::Refreshed { .. } => None,
        SyncOutcome::RemoteFailed(failure) => Some(format!(
            "Showing cached events: {}",
            describe_failure(failure)
        )),
        SyncOutcome::StoreWriteFailed(e) => Some(format!(
            "Showing cached events: could not update the cache ({})",
            e
        )),
    }
}

pub fn describe_failure(failure: &DomainFailure) -> String {
    match failure {
        DomainFailure::RefreshTokenExpired => {
            "your session has expired, sign in again and update access_token".to_string()
        }
        DomainFailure::AccessTokenExpired => {
            "the access token expired, try again in a moment".to_string()
        }
        DomainFailure::NoData => "the server sent no data".to_string(),
        DomainFailure::Unclassified(e) => e.to_string(),
    }
}

impl Render for FailureNotice {
    fn render(&self) -> String {
        match self {
            FailureNotice::Retryable(f) => format!("Could not save event: {}", describe_failure(f)),
            FailureNotice::ReauthRequired => {
                "Could not save event: your session has expired. Sign in again and update access_token"
                    .to_string()
            }
            FailureNotice::Invalid(e) => format!("Invalid event: {}", e),
        }
    }
}

/// Human-readable day label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn format_date_label(date: NaiveDate) -> String {
    let today = Local::now().date_naive();

    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

fn format_time(instant: DateTime<Utc>) -> String {
    format!("{:>7}", instant.with_timezone(&Local).format("%H:%M"))
}
