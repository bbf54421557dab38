//! Wall-clock to instant resolution across DST transitions.
//!
//! Every occurrence resolves its own UTC offset from its own local date and time,
//! never from the anchor's. That is what keeps "20:30 every Tuesday" at 20:30 on
//! both sides of a transition.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Policy for wall-clock times that fall inside a spring-forward gap.
///
/// Fall-back folds (the repeated hour) always resolve to the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DstPolicy {
    /// Shift past the gap by its length (02:30 becomes 03:30 on a one-hour gap).
    #[default]
    ShiftForward,
    /// Drop instances that fall in the gap.
    Skip,
}

/// Resolve a local wall-clock time in `zone` to an absolute instant.
///
/// Returns `None` only for a gap time under [`DstPolicy::Skip`].
pub fn resolve_local(zone: Tz, local: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Utc>> {
    if let Some(earliest) = zone.from_local_datetime(&local).earliest() {
        return Some(earliest.with_timezone(&Utc));
    }

    match policy {
        DstPolicy::Skip => {
            tracing::debug!(%local, zone = zone.name(), "skipping wall-clock time inside DST gap");
            None
        }
        DstPolicy::ShiftForward => {
            // Read the gap time with the offset in force just before the transition;
            // the resulting instant is the same wall time shifted by the gap length.
            let before = zone
                .offset_from_utc_datetime(&(local - Duration::days(1)))
                .fix();
            let utc = local - Duration::seconds(i64::from(before.local_minus_utc()));
            Some(utc.and_utc())
        }
    }
}

/// Local midnight of `date` in `zone`, or the first valid instant of that day when
/// midnight itself is skipped by a transition.
pub fn local_midnight(zone: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match resolve_local(zone, midnight, DstPolicy::ShiftForward) {
        Some(instant) => instant,
        // ShiftForward always resolves
        None => midnight.and_utc(),
    }
}

/// Calendar date of `instant` as read on a wall clock in `zone`.
pub fn local_date(instant: DateTime<Utc>, zone: Tz) -> NaiveDate {
    instant.with_timezone(&zone).date_naive()
}

/// Wall-clock reading of `instant` in `zone`.
pub fn local_datetime(instant: DateTime<Utc>, zone: Tz) -> NaiveDateTime {
    instant.with_timezone(&zone).naive_local()
}
