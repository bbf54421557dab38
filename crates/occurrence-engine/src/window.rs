//! Query windows and range clipping.
//!
//! Timed and all-day occurrences are windowed differently: timed ones by strict
//! instant overlap, all-day ones by whether their local midnight lies inside the
//! window (inclusive on both ends).

use chrono::{DateTime, Days, Duration, Utc};
use chrono_tz::Tz;

use crate::dst::{local_date, local_midnight};
use crate::error::{EngineError, Result};
use crate::event::Occurrence;

/// Days of slack added around a window before asking the iterator for dates.
/// Absorbs any disagreement between the iterator's clock and the local calendar day.
pub const ITERATOR_PADDING_DAYS: i64 = 1;

pub fn iterator_padding() -> Duration {
    Duration::days(ITERATOR_PADDING_DAYS)
}

/// The caller's query range, with the zone used to read calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub timezone: Tz,
    pub range_start: DateTime<Utc>,
    pub range_end: DateTime<Utc>,
}

impl QueryWindow {
    /// # Errors
    /// Returns `EngineError::WindowComputation` when `range_start > range_end`.
    pub fn new(timezone: Tz, range_start: DateTime<Utc>, range_end: DateTime<Utc>) -> Result<Self> {
        if range_start > range_end {
            return Err(EngineError::WindowComputation(format!(
                "range start {} is after range end {}",
                range_start, range_end
            )));
        }
        Ok(Self {
            timezone,
            range_start,
            range_end,
        })
    }

    /// Window covering `days_past` whole local days before today (in `timezone`)
    /// through the last second of the day `days_future` days after today.
    ///
    /// # Errors
    /// Returns `EngineError::WindowComputation` when the day offsets leave the
    /// representable calendar.
    pub fn around(timezone: Tz, now: DateTime<Utc>, days_past: u32, days_future: u32) -> Result<Self> {
        let today = local_date(now, timezone);
        let first = today
            .checked_sub_days(Days::new(u64::from(days_past)))
            .ok_or_else(|| EngineError::WindowComputation(format!("{} days before {}", days_past, today)))?;
        let after_last = today
            .checked_add_days(Days::new(u64::from(days_future) + 1))
            .ok_or_else(|| EngineError::WindowComputation(format!("{} days after {}", days_future, today)))?;

        Self::new(
            timezone,
            local_midnight(timezone, first),
            local_midnight(timezone, after_last) - Duration::seconds(1),
        )
    }

    /// Strict overlap of `[start, end)` with the window.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.range_end && end > self.range_start
    }

    /// Whether a local midnight lies inside the window, both ends inclusive.
    pub fn contains_midnight(&self, midnight: DateTime<Utc>) -> bool {
        midnight >= self.range_start && midnight <= self.range_end
    }

    /// Bounds widened by `before` and `after`, for expand-then-refilter iteration.
    pub fn padded(&self, before: Duration, after: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.range_start - before, self.range_end + after)
    }

    /// Whether `occurrence` belongs in the window.
    pub fn admits(&self, occurrence: &Occurrence) -> bool {
        if occurrence.all_day {
            self.contains_midnight(occurrence.start)
        } else {
            self.overlaps(occurrence.start, occurrence.end)
        }
    }
}

/// Keep only the occurrences that belong in `window`, preserving order.
pub fn clip(occurrences: Vec<Occurrence>, window: &QueryWindow) -> Vec<Occurrence> {
    occurrences
        .into_iter()
        .filter(|occ| window.admits(occ))
        .collect()
}

/// Split an all-day occurrence spanning several local days into one occurrence per
/// day, each running from local midnight to the next local midnight.
pub fn split_days(occurrence: &Occurrence, timezone: Tz) -> Vec<Occurrence> {
    let first = local_date(occurrence.start, timezone);
    let last = local_date(occurrence.end - Duration::seconds(1), timezone).max(first);

    first
        .iter_days()
        .take_while(|day| *day <= last)
        .filter_map(|day| {
            let next = day.succ_opt()?;
            Some(Occurrence {
                start: local_midnight(timezone, day),
                end: local_midnight(timezone, next),
                ..occurrence.clone()
            })
        })
        .collect()
}
