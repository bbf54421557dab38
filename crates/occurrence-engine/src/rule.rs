//! Recurrence rule normalization and RRULE rendering.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::event::{Frequency, RecurrenceRule, WeekdayNum};

/// Complete an underspecified rule before iteration.
///
/// Some producers emit yearly rules (birthdays, anniversaries) with only
/// `BYMONTHDAY`. Read literally that fires every month, so a yearly rule without
/// `BYMONTH` is pinned to the anchor's month. Every other part passes through.
pub fn normalize(rule: &RecurrenceRule, anchor: NaiveDate) -> RecurrenceRule {
    let mut normalized = rule.clone();

    if normalized.frequency == Frequency::Yearly && normalized.by_month.is_empty() {
        // month() is 1..=12, always fits a u8
        normalized.by_month = vec![anchor.month() as u8];
        tracing::debug!(month = anchor.month(), "pinned yearly rule to anchor month");
    }

    normalized
}

impl RecurrenceRule {
    /// Render the rule as an RRULE value (`FREQ=WEEKLY;BYDAY=TU`).
    ///
    /// `UNTIL` is never rendered; the materializer applies it in the event's zone.
    pub fn to_rrule_text(&self) -> String {
        let mut parts = vec![format!("FREQ={}", self.frequency.as_str())];

        if self.interval > 1 {
            parts.push(format!("INTERVAL={}", self.interval));
        }
        if let Some(count) = self.count {
            parts.push(format!("COUNT={}", count));
        }
        if !self.by_weekday.is_empty() {
            parts.push(format!("BYDAY={}", join(self.by_weekday.iter().map(weekday_num_text))));
        }
        if !self.by_month_day.is_empty() {
            parts.push(format!("BYMONTHDAY={}", join(self.by_month_day.iter())));
        }
        if !self.by_month.is_empty() {
            parts.push(format!("BYMONTH={}", join(self.by_month.iter())));
        }
        if !self.by_set_pos.is_empty() {
            parts.push(format!("BYSETPOS={}", join(self.by_set_pos.iter())));
        }
        if let Some(wkst) = self.week_start {
            parts.push(format!("WKST={}", weekday_code(wkst)));
        }

        parts.join(";")
    }
}

fn join<T: ToString>(values: impl Iterator<Item = T>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

fn weekday_num_text(day: &WeekdayNum) -> String {
    match day.ordinal {
        Some(n) => format!("{}{}", n, weekday_code(day.weekday)),
        None => weekday_code(day.weekday).to_string(),
    }
}

/// Two-letter RFC 5545 weekday code.
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Inverse of [`weekday_code`], case-insensitive.
pub fn parse_weekday_code(code: &str) -> Option<Weekday> {
    match code.to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

