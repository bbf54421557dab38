//! RRULE value parsing.
//!
//! Turns the text of an RRULE property (`FREQ=WEEKLY;BYDAY=TU,TH;UNTIL=20250301`)
//! into a structured [`RecurrenceRule`]. Parsing is lenient: unknown parts are
//! ignored, malformed numbers fall back to their defaults, and a missing or unknown
//! `FREQ` survives as [`Frequency::Unsupported`] so the engine can report it and
//! treat the event as non-recurring.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use occurrence_engine::dst::{local_midnight, resolve_local, DstPolicy};
use occurrence_engine::rule::parse_weekday_code;
use occurrence_engine::{Frequency, RecurrenceRule, WeekdayNum};

/// Parse an RRULE value. `zone` is the event's zone, used to read floating and
/// date-valued `UNTIL`.
pub fn parse_rrule(text: &str, zone: Tz) -> RecurrenceRule {
    let mut rule = RecurrenceRule::new(Frequency::Unsupported(String::new()));

    for part in text.trim().split(';').filter(|p| !p.is_empty()) {
        let Some((key, value)) = part.split_once('=') else {
            tracing::debug!(part, "ignoring RRULE part without a value");
            continue;
        };

        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => rule.frequency = Frequency::parse(value),
            "INTERVAL" => match value.parse::<u32>() {
                Ok(n) if n > 0 => rule.interval = n,
                _ => tracing::warn!(value, "invalid INTERVAL, using 1"),
            },
            "COUNT" => rule.count = value.parse().ok(),
            "UNTIL" => {
                rule.until = parse_until(value, zone);
                if rule.until.is_none() {
                    tracing::warn!(value, "unreadable UNTIL, rule left unbounded");
                }
            }
            "BYDAY" => rule.by_weekday = list(value, parse_weekday_num),
            "BYMONTHDAY" => rule.by_month_day = list(value, |v| v.parse().ok()),
            "BYMONTH" => rule.by_month = list(value, |v| v.parse().ok()),
            "BYSETPOS" => rule.by_set_pos = list(value, |v| v.parse().ok()),
            "WKST" => rule.week_start = parse_weekday_code(value),
            other => tracing::debug!(part = other, "ignoring unsupported RRULE part"),
        }
    }

    rule
}

fn list<T>(value: &str, parse: impl Fn(&str) -> Option<T>) -> Vec<T> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .filter_map(|v| {
            let parsed = parse(v);
            if parsed.is_none() {
                tracing::warn!(value = v, "dropping unreadable RRULE list entry");
            }
            parsed
        })
        .collect()
}

/// `TU`, `2TU`, `+1MO`, `-1FR`.
fn parse_weekday_num(value: &str) -> Option<WeekdayNum> {
    let split = value.len().checked_sub(2)?;
    let (ordinal, code) = value.split_at_checked(split)?;
    let weekday = parse_weekday_code(code)?;

    if ordinal.is_empty() {
        return Some(WeekdayNum::every(weekday));
    }
    let n: i16 = ordinal.trim_start_matches('+').parse().ok()?;
    (n != 0).then(|| WeekdayNum::nth(n, weekday))
}

/// A date-valued `UNTIL` includes its whole local day.
fn parse_until(value: &str, zone: Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Some(utc) = value.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .ok()
            .map(|naive| naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return resolve_local(zone, naive, DstPolicy::ShiftForward);
    }

    let day = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
    let next = day.checked_add_days(Days::new(1))?;
    Some(local_midnight(zone, next) - Duration::seconds(1))
}
