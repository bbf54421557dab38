//! Agenda rendering.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use clap::ValueEnum;
use occurrence_engine::dst::{local_date, local_datetime};
use occurrence_engine::{Occurrence, QueryWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// One block per local day, the weekly-grid view
    #[default]
    Text,
    /// The occurrence list as JSON
    Json,
}

pub fn render(occurrences: &[Occurrence], window: &QueryWindow, format: Format) -> Result<String> {
    match format {
        Format::Text => Ok(text(occurrences, window)),
        Format::Json => Ok(serde_json::to_string_pretty(occurrences)? + "\n"),
    }
}

/// Every local day of the window, with that day's entries in start order.
fn text(occurrences: &[Occurrence], window: &QueryWindow) -> String {
    let zone = window.timezone;
    let first = local_date(window.range_start, zone);
    let last = local_date(window.range_end - Duration::seconds(1), zone).max(first);

    // A timed entry is listed on every day of the window it overlaps.
    let mut by_day: BTreeMap<NaiveDate, Vec<&Occurrence>> = BTreeMap::new();
    for occ in occurrences {
        let start_day = local_date(occ.start, zone).max(first);
        let end_day = local_date(occ.end - Duration::seconds(1), zone)
            .max(local_date(occ.start, zone))
            .min(last);
        for day in start_day.iter_days().take_while(|day| *day <= end_day) {
            by_day.entry(day).or_default().push(occ);
        }
    }

    let mut out = String::new();
    for day in first.iter_days().take_while(|day| *day <= last) {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", day.format("%a %Y-%m-%d"));

        let Some(entries) = by_day.get(&day) else {
            out.push_str("  -\n");
            continue;
        };
        // All-day entries head the day.
        let (all_day, timed): (Vec<&Occurrence>, Vec<&Occurrence>) =
            entries.iter().copied().partition(|occ| occ.all_day);
        for occ in all_day.into_iter().chain(timed) {
            let when = if occ.all_day {
                "all day".to_string()
            } else {
                format!(
                    "{}-{}",
                    local_datetime(occ.start, zone).format("%H:%M"),
                    local_datetime(occ.end, zone).format("%H:%M")
                )
            };
            let _ = writeln!(out, "  {:<11}  {}", when, describe(occ));
        }
    }
    out
}

fn describe(occ: &Occurrence) -> String {
    let mut line = occ.title.clone();
    if let Some(location) = &occ.location {
        let _ = write!(line, " @ {}", location);
    }
    if !occ.source_id.is_empty() {
        let _ = write!(line, " [{}]", occ.source_id);
    }
    line
}
