//! Occurrence materialization -- turns one event record into the concrete
//! occurrences that fall inside a query window.
//!
//! Events are classified into four shapes (see [`EventKind`]):
//!
//! - **Single, timed** -- one occurrence if it overlaps the window.
//! - **Single, all-day** -- one occurrence per local calendar day of its span.
//! - **Recurring, timed** -- the iterator runs on the anchor's *local* wall-clock time
//!   in the event's zone; each candidate date gets the anchor's hour/minute/second and
//!   resolves its own UTC offset, so wall time is stable across DST transitions.
//! - **Recurring, all-day** -- the iterator runs on floating dates; each instance is
//!   split into per-day occurrences like a single all-day event.
//!
//! Durations of timed instances are wall-clock durations: the end is the start's wall
//! time plus the anchor's wall-clock length, resolved independently. An instance that
//! itself straddles a transition therefore keeps its wall-clock length and its elapsed
//! length shifts by the DST delta.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::dst::{local_date, local_datetime, local_midnight, resolve_local, DstPolicy};
use crate::error::{EngineError, Result};
use crate::event::{EventKind, EventRecord, Occurrence, RecurrenceRule};
use crate::iterator::{DateEnumerator, RRuleEnumerator};
use crate::resolver::{resolve, Resolution};
use crate::window::{clip, iterator_padding, split_days, QueryWindow};

/// Materialize `event` over `window` with the default `rrule`-backed iterator and
/// [`DstPolicy::ShiftForward`].
///
/// # Errors
/// Returns `EngineError::InvalidEventRecord` for a timed event without a zone.
pub fn materialize(event: &EventRecord, window: &QueryWindow) -> Result<Vec<Occurrence>> {
    Materializer::new(RRuleEnumerator).materialize(event, window)
}

/// Materializer over a pluggable recurrence iterator.
#[derive(Debug, Clone, Default)]
pub struct Materializer<E = RRuleEnumerator> {
    enumerator: E,
    dst_policy: DstPolicy,
}

impl<E: DateEnumerator> Materializer<E> {
    pub fn new(enumerator: E) -> Self {
        Self {
            enumerator,
            dst_policy: DstPolicy::default(),
        }
    }

    /// Set how instance starts inside a spring-forward gap are handled.
    pub fn with_dst_policy(mut self, policy: DstPolicy) -> Self {
        self.dst_policy = policy;
        self
    }

    /// Produce the occurrences of `event` inside `window`, ascending by start.
    ///
    /// Data-quality problems inside the event (an unsupported or unparseable rule)
    /// degrade to non-recurring handling and are logged.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidEventRecord` for a timed event without a zone.
    pub fn materialize(&self, event: &EventRecord, window: &QueryWindow) -> Result<Vec<Occurrence>> {
        let zone = event_zone(event, window)?;
        let anchor = local_date(event.start, zone);

        let mut occurrences = match event.classify(anchor) {
            EventKind::Single => single(event, window),
            EventKind::SingleAllDay => single_all_day(event, window),
            EventKind::Recurring(rule) => self.recurring(event, &rule, zone, window),
            EventKind::RecurringAllDay(rule) => self.recurring_all_day(event, &rule, window),
        };

        occurrences.sort_by(|a, b| (a.start, a.end, &a.title).cmp(&(b.start, b.end, &b.title)));
        occurrences.dedup();

        tracing::debug!(uid = %event.uid, count = occurrences.len(), "materialized event");
        Ok(occurrences)
    }

    fn recurring(
        &self,
        event: &EventRecord,
        rule: &RecurrenceRule,
        zone: Tz,
        window: &QueryWindow,
    ) -> Vec<Occurrence> {
        let anchor = local_datetime(event.start, zone);
        let wall_duration = (local_datetime(event.effective_end(), zone) - anchor)
            .max(Duration::minutes(1));

        // Instances starting before the window can still overlap it.
        let (from, to) = window.padded(iterator_padding() + wall_duration, iterator_padding());
        let dates = match self.enumerator.enumerate(rule, anchor, zone, from, to) {
            Ok(dates) => dates,
            Err(err) => {
                tracing::warn!(uid = %event.uid, error = %err, "treating event as non-recurring");
                return single(event, window);
            }
        };

        let enumerated: BTreeSet<NaiveDate> = dates.iter().copied().collect();
        let mut occurrences = Vec::new();
        for date in dates {
            let wall_start = date.and_time(anchor.time());
            let Some(start) = resolve_local(zone, wall_start, self.dst_policy) else {
                continue;
            };
            if rule.until.is_some_and(|until| start > until) {
                continue;
            }
            let end = resolve_local(zone, wall_start + wall_duration, DstPolicy::ShiftForward)
                .filter(|end| *end > start)
                .unwrap_or(start + Duration::minutes(1));

            match resolve(date, &event.exception_dates, &event.overrides, zone) {
                Resolution::Skip => {}
                Resolution::Replace(replacement) => occurrences.extend(admit(replacement, window)),
                Resolution::Keep => {
                    if window.overlaps(start, end) {
                        occurrences.push(Occurrence::from_event(event, start, end, false));
                    }
                }
            }
        }

        occurrences.extend(orphan_overrides(event, zone, &enumerated, window));
        occurrences
    }

    fn recurring_all_day(
        &self,
        event: &EventRecord,
        rule: &RecurrenceRule,
        window: &QueryWindow,
    ) -> Vec<Occurrence> {
        let zone = window.timezone;
        let first_day = local_date(event.start, zone);
        let last_day = local_date(event.effective_end() - Duration::seconds(1), zone).max(first_day);
        let extra_days = (last_day - first_day).num_days();

        // Multi-day instances that start before the window can still cover it.
        let (from, to) = window.padded(iterator_padding() + Duration::days(extra_days), iterator_padding());
        let (from_day, to_day) = (local_date(from, zone), local_date(to, zone));

        // All-day dates float: iterate them as UTC midnights and read the dates back.
        let dates = match self.enumerator.enumerate(
            rule,
            first_day.and_time(NaiveTime::MIN),
            chrono_tz::UTC,
            from_day.and_time(NaiveTime::MIN).and_utc(),
            to_day.and_time(NaiveTime::MIN).and_utc(),
        ) {
            Ok(dates) => dates,
            Err(err) => {
                tracing::warn!(uid = %event.uid, error = %err, "treating all-day event as non-recurring");
                return single_all_day(event, window);
            }
        };

        let until_day = rule.until.map(|until| local_date(until, zone));
        let span = Days::new(u64::try_from(extra_days).unwrap_or(0) + 1);

        let enumerated: BTreeSet<NaiveDate> = dates.iter().copied().collect();
        let mut occurrences = Vec::new();
        for date in dates {
            if until_day.is_some_and(|until| date > until) {
                continue;
            }

            match resolve(date, &event.exception_dates, &event.overrides, zone) {
                Resolution::Skip => {}
                Resolution::Replace(replacement) => occurrences.extend(admit(replacement, window)),
                Resolution::Keep => {
                    let Some(after_last) = date.checked_add_days(span) else {
                        tracing::warn!(uid = %event.uid, year = date.year(), "instance past the end of the calendar");
                        continue;
                    };
                    let instance = Occurrence::from_event(
                        event,
                        local_midnight(zone, date),
                        local_midnight(zone, after_last),
                        true,
                    );
                    occurrences.extend(clip(split_days(&instance, zone), window));
                }
            }
        }

        occurrences.extend(orphan_overrides(event, zone, &enumerated, window));
        occurrences
    }
}

/// Zone in which an event's calendar days are read.
fn event_zone(event: &EventRecord, window: &QueryWindow) -> Result<Tz> {
    if event.is_all_day {
        return Ok(window.timezone);
    }
    event.local_timezone.ok_or_else(|| EngineError::InvalidEventRecord {
        uid: event.uid.clone(),
        reason: "timed event has no local timezone".to_string(),
    })
}

fn single(event: &EventRecord, window: &QueryWindow) -> Vec<Occurrence> {
    let end = event.effective_end();
    if window.overlaps(event.start, end) {
        vec![Occurrence::from_event(event, event.start, end, false)]
    } else {
        Vec::new()
    }
}

fn single_all_day(event: &EventRecord, window: &QueryWindow) -> Vec<Occurrence> {
    let span = Occurrence::from_event(event, event.start, event.effective_end(), true);
    clip(split_days(&span, window.timezone), window)
}

/// Window a replacement occurrence, splitting it into days when it is all-day.
fn admit(occurrence: Occurrence, window: &QueryWindow) -> Vec<Occurrence> {
    if occurrence.all_day {
        clip(split_days(&occurrence, window.timezone), window)
    } else if window.admits(&occurrence) {
        vec![occurrence]
    } else {
        Vec::new()
    }
}

/// Overrides anchored on dates the iterator did not return. They never meet a
/// candidate, but may have been moved into the window.
fn orphan_overrides(
    event: &EventRecord,
    zone: Tz,
    enumerated: &BTreeSet<NaiveDate>,
    window: &QueryWindow,
) -> Vec<Occurrence> {
    event
        .overrides
        .keys()
        .map(|anchor| local_date(*anchor, zone))
        .filter(|date| !enumerated.contains(date))
        .filter_map(|date| match resolve(date, &event.exception_dates, &event.overrides, zone) {
            Resolution::Replace(replacement) => Some(replacement),
            Resolution::Skip | Resolution::Keep => None,
        })
        .flat_map(|replacement| admit(replacement, window))
        .collect()
}
