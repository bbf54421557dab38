//! Recurrence iteration -- enumerates the local dates a rule fires on.
//!
//! The iterator is treated as a black box that yields dates. Callers re-derive every
//! instant from those dates themselves (see [`crate::dst`]), so nothing here depends on
//! how the underlying library handles offsets.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::error::{EngineError, Result};
use crate::event::RecurrenceRule;

/// Upper bound on instances returned from one enumeration.
pub const MAX_INSTANCES: u16 = 1000;

/// Enumerates candidate dates for a recurrence rule.
pub trait DateEnumerator {
    /// Dates (ascending, local to `zone`) on which `rule`, anchored at the local
    /// wall-clock `anchor`, has an instance within `[range_start, range_end]`.
    ///
    /// # Errors
    /// Returns `EngineError::UnsupportedRecurrence` if the rule cannot be iterated.
    fn enumerate(
        &self,
        rule: &RecurrenceRule,
        anchor: NaiveDateTime,
        zone: Tz,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<NaiveDate>>;
}

/// [`DateEnumerator`] backed by the `rrule` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RRuleEnumerator;

impl DateEnumerator for RRuleEnumerator {
    fn enumerate(
        &self,
        rule: &RecurrenceRule,
        anchor: NaiveDateTime,
        zone: Tz,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<NaiveDate>> {
        if range_start > range_end {
            return Ok(Vec::new());
        }

        let rrule_text = format!(
            "DTSTART;TZID={}:{}\nRRULE:{}",
            zone.name(),
            anchor.format("%Y%m%dT%H%M%S"),
            rule.to_rrule_text()
        );

        let rrule_set: RRuleSet = rrule_text
            .parse()
            .map_err(|e| EngineError::UnsupportedRecurrence(format!("{}: {}", rrule_text, e)))?;

        // Bounds compare as instants, so UTC works whatever the DTSTART zone is.
        let utc: rrule::Tz = Utc.into();
        let result = rrule_set
            .after(range_start.with_timezone(&utc))
            .before(range_end.with_timezone(&utc))
            .all(MAX_INSTANCES);

        if result.limited {
            tracing::warn!(
                rule = %rule.to_rrule_text(),
                limit = MAX_INSTANCES,
                "recurrence expansion hit the instance cap, later instances dropped"
            );
        }

        let mut dates: Vec<NaiveDate> = result
            .dates
            .into_iter()
            .map(|dt| dt.naive_local().date())
            .collect();
        dates.dedup();

        Ok(dates)
    }
}
