//! ICS decoding using the icalendar crate's parser.
//!
//! One [`EventRecord`] is produced per recurring series or standalone event.
//! VEVENTs carrying a RECURRENCE-ID are folded into their series as overrides (or
//! as exception dates when the instance was cancelled), so the engine never sees
//! them as events of their own unless the series itself is missing.
//!
//! Every date-time is resolved to an instant here, using:
//!
//! - `Z` values: as written; wall-clock recurrence follows `default_zone`
//! - `TZID=` values: the named IANA zone, or `default_zone` when it is unknown
//! - floating values: `default_zone`
//! - DATE values: local midnight in `default_zone`, and the event is all-day

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use icalendar::parser::{read_calendar, unfold, Component, Property};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use occurrence_engine::dst::{local_midnight, resolve_local, DstPolicy};
use occurrence_engine::EventRecord;

use crate::error::{FeedError, Result};
use crate::recurrence::parse_rrule;

/// A VEVENT reduced to an event record, before series assembly.
struct Decoded {
    record: EventRecord,
    recurrence_id: Option<DateTime<Utc>>,
    cancelled: bool,
}

/// A DTSTART/DTEND/RECURRENCE-ID value resolved to an instant.
struct Resolved {
    instant: DateTime<Utc>,
    zone: Tz,
    /// Set for DATE values.
    date: Option<NaiveDate>,
}

/// Decode an ICS document into event records.
///
/// Malformed VEVENTs are skipped with a warning; only a document that cannot be
/// read as iCalendar at all is an error.
///
/// # Errors
/// Returns `FeedError::Decode` when the input is not an iCalendar stream.
pub fn decode(raw: &str, default_zone: Tz) -> Result<Vec<EventRecord>> {
    let raw = raw.trim_start_matches('\u{feff}').trim_start();
    if !raw
        .get(..15)
        .is_some_and(|head| head.eq_ignore_ascii_case("BEGIN:VCALENDAR"))
    {
        return Err(FeedError::Decode("missing BEGIN:VCALENDAR".to_string()));
    }

    let unfolded = unfold(raw);
    let calendar = read_calendar(&unfolded).map_err(|e| FeedError::Decode(e.to_string()))?;

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    let decoded: Vec<Decoded> = vevents
        .into_iter()
        .filter_map(|vevent| decode_vevent(vevent, default_zone))
        .collect();

    let records = assemble(decoded);
    tracing::debug!(events = records.len(), "decoded ICS document");
    Ok(records)
}

fn collect_vevents<'a>(components: &'a [Component<'a>], out: &mut Vec<&'a Component<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            out.push(component);
        } else {
            collect_vevents(&component.components, out);
        }
    }
}

/// Fold instance overrides into their series.
fn assemble(decoded: Vec<Decoded>) -> Vec<EventRecord> {
    let (instances, series): (Vec<Decoded>, Vec<Decoded>) =
        decoded.into_iter().partition(|d| d.recurrence_id.is_some());

    let mut cancelled_series = HashSet::new();
    let mut records = Vec::new();
    let mut by_uid: HashMap<String, usize> = HashMap::new();

    for base in series {
        if base.cancelled {
            tracing::debug!(uid = %base.record.uid, "dropping cancelled event");
            cancelled_series.insert(base.record.uid);
            continue;
        }
        by_uid.entry(base.record.uid.clone()).or_insert(records.len());
        records.push(base.record);
    }

    let mut orphans = Vec::new();
    for instance in instances {
        let Some(recurrence_id) = instance.recurrence_id else {
            continue;
        };
        let uid = instance.record.uid.clone();

        match by_uid.get(&uid).and_then(|&i| records.get_mut(i)) {
            Some(base) if instance.cancelled => base.exception_dates.push(recurrence_id),
            Some(base) => {
                base.overrides.insert(recurrence_id, instance.record);
            }
            None if instance.cancelled || cancelled_series.contains(&uid) => {}
            None => {
                tracing::debug!(%uid, %recurrence_id, "override without a series, keeping it standalone");
                orphans.push(instance.record);
            }
        }
    }

    records.extend(orphans);
    records
}

fn decode_vevent(vevent: &Component<'_>, default_zone: Tz) -> Option<Decoded> {
    let Some(uid) = vevent.find_prop("UID").map(|p| p.val.to_string()) else {
        tracing::warn!("skipping VEVENT without UID");
        return None;
    };
    let Some(start) = vevent
        .find_prop("DTSTART")
        .and_then(|p| resolve_property(p, default_zone))
    else {
        tracing::warn!(%uid, "skipping VEVENT without a readable DTSTART");
        return None;
    };

    let is_all_day = start.date.is_some();
    let zone = start.zone;
    let end = event_end(vevent, &start, default_zone);

    let mut record = if is_all_day {
        EventRecord::all_day(&uid, start.instant, end)
    } else {
        EventRecord::timed(&uid, start.instant, end, zone)
    };
    record.summary = text_prop(vevent, "SUMMARY");
    record.description = text_prop(vevent, "DESCRIPTION");
    record.location = text_prop(vevent, "LOCATION");
    record.recurrence_rule = vevent
        .find_prop("RRULE")
        .map(|p| parse_rrule(p.val.as_ref(), zone));
    record.exception_dates = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(|p| parse_exdate_property(p, zone))
        .collect();

    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| resolve_property(p, default_zone))
        .map(|r| r.instant);
    let cancelled = vevent
        .find_prop("STATUS")
        .is_some_and(|p| p.val.as_ref().eq_ignore_ascii_case("CANCELLED"));

    Some(Decoded {
        record,
        recurrence_id,
        cancelled,
    })
}

/// End instant from DTEND, else DURATION, else one day (all-day) or the start.
fn event_end(vevent: &Component<'_>, start: &Resolved, default_zone: Tz) -> DateTime<Utc> {
    if let Some(end) = vevent
        .find_prop("DTEND")
        .and_then(|p| resolve_property(p, default_zone))
    {
        return end.instant;
    }

    let duration = vevent
        .find_prop("DURATION")
        .and_then(|p| parse_duration(p.val.as_ref()));

    match (start.date, duration) {
        (Some(day), duration) => {
            let days = duration.map_or(1, |d| d.num_days().max(1));
            u64::try_from(days)
                .ok()
                .and_then(|days| day.checked_add_days(Days::new(days)))
                .map_or(start.instant + Duration::days(1), |after| {
                    local_midnight(start.zone, after)
                })
        }
        (None, Some(duration)) => start.instant + duration,
        (None, None) => start.instant,
    }
}

fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.starts_with('-') {
        tracing::warn!(value, "ignoring negative DURATION");
        return None;
    }
    let parsed = iso8601::duration(value.trim_start_matches('+')).ok()?;
    let std_duration: std::time::Duration = parsed.into();
    Duration::from_std(std_duration).ok()
}

fn resolve_property(prop: &Property<'_>, default_zone: Tz) -> Option<Resolved> {
    let value = DatePerhapsTime::try_from(prop).ok()?;
    resolve_value(value, default_zone)
}

fn resolve_value(value: DatePerhapsTime, default_zone: Tz) -> Option<Resolved> {
    match value {
        DatePerhapsTime::Date(date) => Some(Resolved {
            instant: local_midnight(default_zone, date),
            zone: default_zone,
            date: Some(date),
        }),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(instant)) => Some(Resolved {
            instant,
            zone: default_zone,
            date: None,
        }),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
            wall_time(naive, default_zone)
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            wall_time(date_time, lookup_zone(&tzid, default_zone))
        }
    }
}

fn wall_time(naive: NaiveDateTime, zone: Tz) -> Option<Resolved> {
    Some(Resolved {
        instant: resolve_local(zone, naive, DstPolicy::ShiftForward)?,
        zone,
        date: None,
    })
}

/// IANA zone named by a TZID parameter, falling back to `default_zone`.
pub fn lookup_zone(tzid: &str, default_zone: Tz) -> Tz {
    let name = tzid.trim().trim_matches('"').trim_start_matches('/');
    match name.parse::<Tz>() {
        Ok(zone) => zone,
        Err(_) => {
            tracing::warn!(tzid, fallback = default_zone.name(), "unknown TZID, using default zone");
            default_zone
        }
    }
}

/// Parse an EXDATE property into instants.
///
/// Handles:
/// - TZID parameter: `EXDATE;TZID=America/New_York:20240108T100000`
/// - VALUE=DATE: `EXDATE;VALUE=DATE:20240108` (local midnight in `zone`)
/// - UTC: `EXDATE:20240108T100000Z`
/// - Floating: `EXDATE:20240108T100000` (read in `zone`)
/// - Comma-separated values: `EXDATE;TZID=...:20240108T100000,20240115T100000`
fn parse_exdate_property(prop: &Property<'_>, zone: Tz) -> Vec<DateTime<Utc>> {
    let tzid_zone = param(prop, "TZID").map(|tzid| lookup_zone(&tzid, zone));
    let is_date = param(prop, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            let instant = if is_date || s.len() == 8 {
                NaiveDate::parse_from_str(s, "%Y%m%d")
                    .ok()
                    .map(|date| local_midnight(zone, date))
            } else if let Some(utc) = s.strip_suffix('Z') {
                NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|naive| naive.and_utc())
            } else {
                NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .and_then(|naive| {
                        resolve_local(tzid_zone.unwrap_or(zone), naive, DstPolicy::ShiftForward)
                    })
            };
            if instant.is_none() {
                tracing::warn!(value = s, "dropping unreadable EXDATE value");
            }
            instant
        })
        .collect()
}

fn param(prop: &Property<'_>, key: &str) -> Option<String> {
    prop.params
        .iter()
        .find(|p| p.key == key)
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()))
}

fn text_prop(vevent: &Component<'_>, name: &str) -> Option<String> {
    vevent
        .find_prop(name)
        .map(|p| unescape_text(p.val.as_ref()))
        .filter(|text| !text.trim().is_empty())
}

/// Undo RFC 5545 TEXT escaping (`\n`, `\,`, `\;`, `\\`).
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

