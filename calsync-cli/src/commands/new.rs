use anyhow::{Context, Result};
use calsync_core::authoring::{AuthoringSession, EventAuthoringFlow, EventDraft, FailureNotice};
use calsync_core::recurrence::RepeatTerm;
use calsync_core::window::SyncWindow;
use calsync_core::{EventColor, EventNotification};
use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use clap::Args;
use owo_colors::OwoColorize;

use crate::render::Render;

#[derive(Args)]
pub struct NewArgs {
    title: String,

    /// Start date/time (e.g. "tomorrow 3pm", "fri 9:30", "march 20")
    #[arg(short, long)]
    start: String,

    /// End date/time
    #[arg(short, long, conflicts_with = "duration")]
    end: Option<String>,

    /// Duration (e.g. "30m", "2h")
    #[arg(short, long)]
    duration: Option<String>,

    /// Repeat daily, weekly, monthly or yearly
    #[arg(long, requires = "until")]
    repeat: Option<String>,

    /// Repeat every N days/weeks/months/years
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    every: i32,

    /// Last day the event repeats
    #[arg(long)]
    until: Option<String>,

    /// red, orange, yellow, green, blue, purple or gray
    #[arg(long)]
    color: Option<String>,

    /// Reminder before the start: none, 0, 5m, 10m, 30m, 1h or 1d
    #[arg(long)]
    alarm: Option<String>,

    #[arg(long)]
    memo: Option<String>,

    /// Hide the event from other members
    #[arg(long)]
    private: bool,

    /// Do not let others join
    #[arg(long)]
    not_joinable: bool,

    /// Show the instances that would be created without contacting the server
    #[arg(long)]
    dry_run: bool,
}

pub async fn run(args: NewArgs, flow: &EventAuthoringFlow) -> Result<()> {
    let start = parse_datetime(&args.start)?;
    let end = match (&args.end, &args.duration) {
        (Some(end), _) => parse_end(end, &start)?,
        (None, Some(duration)) => apply_duration(&start, duration)?,
        (None, None) => default_end(&start),
    };

    let session = AuthoringSession::new(EventDraft::new(args.title, start.at, end));

    if let Some(color) = &args.color {
        session.set_color(parse_color(color)?);
    }
    if let Some(alarm) = &args.alarm {
        session.set_notification(parse_alarm(alarm)?);
    }
    if let Some(memo) = args.memo {
        session.set_memo(memo);
    }
    session.set_visible(!args.private);
    session.set_joinable(!args.not_joinable);

    if let Some(repeat) = &args.repeat {
        session.set_repeat_term(parse_repeat(repeat)?);
        session.set_repeat_frequency(args.every);
    }
    if let Some(until) = &args.until {
        let until = parse_datetime(until)?;
        session.set_repeat_end(default_end(&until));
    }

    if args.dry_run {
        return preview(&session.draft());
    }

    match session.save(flow).await {
        Ok(()) => {
            println!("{}", format!("  Created: {}", session.draft().title.trim()).green());
            Ok(())
        }
        Err(e) => anyhow::bail!("{}", FailureNotice::from(e).render()),
    }
}

fn preview(draft: &EventDraft) -> Result<()> {
    let window = SyncWindow::new(draft.start, draft.repeat_end.max(draft.end) + Duration::days(1))?;
    let occurrences = draft
        .preview(&window)
        .map_err(|e| anyhow::anyhow!("Invalid event: {}", e))?;

    println!("{}", format!("  Would create: {}", draft.title.trim()).bold());
    for occurrence in &occurrences {
        println!("    {}", occurrence.render());
    }
    if occurrences.len() > 1 {
        println!("{}", format!("  {} instances", occurrences.len()).dimmed());
    }

    Ok(())
}

/// A parsed instant, remembering whether the user gave a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ParsedTime {
    at: DateTime<Utc>,
    all_day: bool,
}

/// Expand common abbreviations that fuzzydate doesn't handle.
fn expand_abbreviations(input: &str) -> String {
    const ABBREVIATIONS: [(&str, &str); 22] = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thur", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map_or(word.to_string(), |(_, full)| full.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse natural language input in local time. Input without a time of day is all-day and
/// starts at local midnight.
fn parse_datetime(input: &str) -> Result<ParsedTime> {
    let expanded = expand_abbreviations(input);
    let parsed = fuzzydate::parse(&expanded)
        .map_err(|_| anyhow::anyhow!("Could not parse date/time: \"{}\"", input))?;

    let all_day = !has_time_component(input);
    let naive = if all_day {
        parsed.date().and_time(NaiveTime::MIN)
    } else {
        parsed
    };

    Ok(ParsedTime {
        at: local_to_utc(naive, input)?,
        all_day,
    })
}

fn local_to_utc(naive: NaiveDateTime, input: &str) -> Result<DateTime<Utc>> {
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| anyhow::anyhow!("\"{}\" does not exist in the local time zone", input))?;
    Ok(local.with_timezone(&Utc))
}

/// Check if the user's input string contains time-related tokens.
fn has_time_component(input: &str) -> bool {
    let lower = input.to_lowercase();

    if lower.contains("noon") || lower.contains("midnight") {
        return true;
    }

    // "6pm", "6 pm", "11am"
    let bytes = lower.as_bytes();
    let meridiem = bytes.windows(2).enumerate().any(|(i, pair)| {
        (pair == b"am" || pair == b"pm")
            && ((i > 0 && bytes[i - 1].is_ascii_digit())
                || (i > 1 && bytes[i - 1] == b' ' && bytes[i - 2].is_ascii_digit()))
    });
    if meridiem {
        return true;
    }

    // "15:00"
    let clock = bytes
        .windows(3)
        .any(|w| w[0].is_ascii_digit() && w[1] == b':' && w[2].is_ascii_digit());
    if clock {
        return true;
    }

    // "at 3", "friday at 15"
    lower
        .strip_prefix("at ")
        .into_iter()
        .chain(lower.split_once(" at ").map(|(_, after)| after))
        .any(|after| after.starts_with(|c: char| c.is_ascii_digit()))
}

/// Parse an end input: a duration first (humantime), then a date/time (fuzzydate).
fn parse_end(input: &str, start: &ParsedTime) -> Result<DateTime<Utc>> {
    if let Ok(end) = try_apply_duration(start, input) {
        return Ok(end);
    }

    let cleaned = input
        .strip_prefix("until ")
        .or_else(|| input.strip_prefix("to "))
        .unwrap_or(input);

    let end = parse_datetime(cleaned)?;
    Ok(if end.all_day { default_end(&end) } else { end.at })
}

fn apply_duration(start: &ParsedTime, input: &str) -> Result<DateTime<Utc>> {
    try_apply_duration(start, input)
        .with_context(|| format!("Could not parse duration: \"{}\"", input))
}

fn try_apply_duration(start: &ParsedTime, input: &str) -> Result<DateTime<Utc>> {
    let std_duration = humantime::parse_duration(input).map_err(|e| anyhow::anyhow!("{}", e))?;
    let duration = Duration::from_std(std_duration).context("Duration too large")?;
    Ok(start.at + duration)
}

/// +1 hour for timed events, +1 day for all-day events.
fn default_end(start: &ParsedTime) -> DateTime<Utc> {
    if start.all_day {
        start.at + Duration::days(1)
    } else {
        start.at + Duration::hours(1)
    }
}

fn parse_color(input: &str) -> Result<EventColor> {
    EventColor::from_name(input.trim()).ok_or_else(|| {
        let names: Vec<_> = EventColor::ALL.iter().map(|c| c.name()).collect();
        anyhow::anyhow!("Unknown color '{}'. Available: {}", input, names.join(", "))
    })
}

fn parse_repeat(input: &str) -> Result<RepeatTerm> {
    RepeatTerm::from_name(input.trim()).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown repeat '{}'. Use daily, weekly, monthly or yearly",
            input
        )
    })
}

fn parse_alarm(input: &str) -> Result<EventNotification> {
    let unsupported = || {
        anyhow::anyhow!(
            "Unsupported alarm '{}'. Use one of: none, 0, 5m, 10m, 30m, 1h, 1d",
            input
        )
    };

    match input.trim().to_lowercase().as_str() {
        "none" | "off" => Ok(EventNotification::None),
        "0" | "start" => Ok(EventNotification::AtStart),
        other => {
            let offset = humantime::parse_duration(other).map_err(|_| unsupported())?;
            let minutes = u32::try_from(offset.as_secs() / 60).map_err(|_| unsupported())?;
            EventNotification::from_minutes(minutes).ok_or_else(unsupported)
        }
    }
}
