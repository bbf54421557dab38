//! Event records (input) and occurrences (output).
//!
//! An [`EventRecord`] is what a feed decoder produces for one VEVENT: the first
//! occurrence's instants plus an optional recurrence rule, exceptions, and
//! per-instance overrides. An [`Occurrence`] is one concrete, windowed instance.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::rule;

/// Title used when an event carries no SUMMARY.
pub const UNTITLED: &str = "(No title)";

/// Recurrence frequency. Only day-or-coarser frequencies are expanded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Missing, garbled, or sub-daily (`HOURLY`, `MINUTELY`, `SECONDLY`).
    Unsupported(String),
}

impl Frequency {
    /// Parse an RRULE `FREQ` value. Anything unrecognized is kept verbatim as
    /// [`Frequency::Unsupported`] so it can be reported.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Frequency::Daily,
            "WEEKLY" => Frequency::Weekly,
            "MONTHLY" => Frequency::Monthly,
            "YEARLY" => Frequency::Yearly,
            _ => Frequency::Unsupported(value.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Frequency::Unsupported(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
            Frequency::Unsupported(raw) => raw,
        }
    }
}

/// A `BYDAY` entry such as `TU`, `2TU` or `-1FR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayNum {
    pub ordinal: Option<i16>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    pub fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    pub fn nth(ordinal: i16, weekday: Weekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

/// Structured recurrence rule, as decoded from an RRULE property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub count: Option<u32>,
    /// Inclusive upper bound on occurrence starts.
    pub until: Option<DateTime<Utc>>,
    pub by_weekday: Vec<WeekdayNum>,
    pub by_month_day: Vec<i8>,
    pub by_month: Vec<u8>,
    pub by_set_pos: Vec<i32>,
    pub week_start: Option<Weekday>,
}

impl RecurrenceRule {
    /// A rule with the given frequency and every other part at its RFC 5545 default.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            count: None,
            until: None,
            by_weekday: Vec::new(),
            by_month_day: Vec::new(),
            by_month: Vec::new(),
            by_set_pos: Vec::new(),
            week_start: None,
        }
    }
}

/// One decoded calendar entry. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub uid: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Start of the first occurrence.
    pub start: DateTime<Utc>,
    /// End of the first occurrence. Exclusive day-after boundary for all-day events.
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    /// Zone in which wall-clock time is authoritative. Required for timed events.
    pub local_timezone: Option<Tz>,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub exception_dates: Vec<DateTime<Utc>>,
    /// Replacement records keyed by the RECURRENCE-ID instant they override.
    pub overrides: BTreeMap<DateTime<Utc>, EventRecord>,
}

/// How an event is materialized. Produced by [`EventRecord::classify`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Single,
    SingleAllDay,
    Recurring(RecurrenceRule),
    RecurringAllDay(RecurrenceRule),
}

impl EventRecord {
    /// A timed, non-recurring record. Remaining fields can be set directly.
    pub fn timed(uid: &str, start: DateTime<Utc>, end: DateTime<Utc>, zone: Tz) -> Self {
        Self {
            uid: uid.to_string(),
            summary: None,
            description: None,
            location: None,
            start,
            end,
            is_all_day: false,
            local_timezone: Some(zone),
            recurrence_rule: None,
            exception_dates: Vec::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// An all-day, non-recurring record. `end` is the exclusive day-after boundary.
    pub fn all_day(uid: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            is_all_day: true,
            local_timezone: None,
            ..Self::timed(uid, start, end, chrono_tz::UTC)
        }
    }

    /// Classify the record, normalizing its rule against `anchor` (the local date of
    /// the first occurrence). Unsupported frequencies degrade to non-recurring.
    pub fn classify(&self, anchor: NaiveDate) -> EventKind {
        let rule = match &self.recurrence_rule {
            Some(rule) if rule.frequency.is_supported() => Some(rule::normalize(rule, anchor)),
            Some(rule) => {
                tracing::warn!(
                    uid = %self.uid,
                    frequency = rule.frequency.as_str(),
                    "unsupported recurrence frequency, treating event as non-recurring"
                );
                None
            }
            None => None,
        };

        match (rule, self.is_all_day) {
            (None, false) => EventKind::Single,
            (None, true) => EventKind::SingleAllDay,
            (Some(rule), false) => EventKind::Recurring(rule),
            (Some(rule), true) => EventKind::RecurringAllDay(rule),
        }
    }

    /// End instant guaranteed to be after `start`.
    pub fn effective_end(&self) -> DateTime<Utc> {
        if self.end > self.start {
            self.end
        } else if self.is_all_day {
            self.start + Duration::days(1)
        } else {
            self.start + Duration::minutes(1)
        }
    }

    pub fn title(&self) -> String {
        self.summary.clone().unwrap_or_else(|| UNTITLED.to_string())
    }
}

/// One concrete occurrence, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    /// Identifier of the feed this occurrence came from. Empty until aggregated.
    pub source_id: String,
}

impl Occurrence {
    /// Build an occurrence carrying `event`'s display text.
    pub fn from_event(
        event: &EventRecord,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        all_day: bool,
    ) -> Self {
        Self {
            title: event.title(),
            description: event.description.clone(),
            location: event.location.clone(),
            start,
            end,
            all_day,
            source_id: String::new(),
        }
    }
}
