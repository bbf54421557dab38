//! Exception and override resolution for generated candidates.
//!
//! Matching is by local calendar date in the event's zone, not by exact instant.
//! Exception and override instants are computed independently of the candidates,
//! and an override may legitimately move an instance to another time of day; both
//! still land on the candidate's date. The assumption this rests on is that no rule
//! produces two instances on one local day, which holds for every supported
//! frequency (none is sub-daily).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::dst::local_date;
use crate::event::{EventRecord, Occurrence};

/// What to do with one generated candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Cancelled by an exception date.
    Skip,
    /// Replaced by an override's own times and text.
    Replace(Occurrence),
    /// Emit the candidate as generated.
    Keep,
}

/// Resolve the candidate falling on `candidate` (a local date in `zone`).
///
/// Exceptions win over overrides when both name the same date.
pub fn resolve(
    candidate: NaiveDate,
    exception_dates: &[DateTime<Utc>],
    overrides: &BTreeMap<DateTime<Utc>, EventRecord>,
    zone: Tz,
) -> Resolution {
    if exception_dates
        .iter()
        .any(|exdate| local_date(*exdate, zone) == candidate)
    {
        return Resolution::Skip;
    }

    // Later anchors win when several overrides share a date.
    let replacement = overrides
        .iter()
        .rev()
        .find(|(anchor, _)| local_date(**anchor, zone) == candidate);

    match replacement {
        Some((_, record)) => Resolution::Replace(Occurrence::from_event(
            record,
            record.start,
            record.effective_end(),
            record.is_all_day,
        )),
        None => Resolution::Keep,
    }
}
