//! Property-based tests for occurrence materialization using proptest.
//!
//! These verify invariants that should hold for *any* event of a given shape, not
//! just the scenarios in `materializer_tests.rs`.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use occurrence_engine::dst::{local_date, local_datetime, local_midnight};
use occurrence_engine::{
    materialize, EventRecord, Frequency, QueryWindow, RecurrenceRule, WeekdayNum,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_timezone() -> impl Strategy<Value = Tz> {
    prop_oneof![
        Just(chrono_tz::UTC),
        Just(chrono_tz::America::New_York),
        Just(chrono_tz::America::Los_Angeles),
        Just(chrono_tz::Europe::London),
        Just(chrono_tz::Europe::Berlin),
        Just(chrono_tz::Australia::Sydney),
        Just(chrono_tz::Asia::Tokyo),
    ]
}

/// A date in 2025-2026. Day is capped at 28 to avoid invalid month/day combos.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2025i32..=2026, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Daytime wall clock, well away from the small-hours DST transitions.
fn arb_daytime() -> impl Strategy<Value = NaiveTime> {
    (7u32..=21, prop_oneof![Just(0u32), Just(15), Just(30), Just(45)])
        .prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

fn arb_weekday() -> impl Strategy<Value = Weekday> {
    prop_oneof![
        Just(Weekday::Mon),
        Just(Weekday::Tue),
        Just(Weekday::Wed),
        Just(Weekday::Thu),
        Just(Weekday::Fri),
        Just(Weekday::Sat),
        Just(Weekday::Sun),
    ]
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn wall(zone: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    occurrence_engine::dst::resolve_local(zone, date.and_time(time), Default::default()).unwrap()
}

/// Weekly event on `weekday` at `time`, anchored on the first such weekday on or
/// after `from`.
fn weekly_event(zone: Tz, from: NaiveDate, weekday: Weekday, time: NaiveTime) -> EventRecord {
    let first = from
        .iter_days()
        .find(|d| chrono::Datelike::weekday(d) == weekday)
        .unwrap();
    let start = wall(zone, first, time);
    let mut event = EventRecord::timed("weekly", start, start + Duration::minutes(45), zone);
    let mut rule = RecurrenceRule::new(Frequency::Weekly);
    rule.by_weekday = vec![WeekdayNum::every(weekday)];
    event.recurrence_rule = Some(rule);
    event
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A non-recurring timed event yields exactly one occurrence iff it overlaps.
    #[test]
    fn single_timed_cardinality_matches_overlap(
        zone in arb_timezone(),
        start_offset in -72i64..=240,
        length in 1i64..=180,
    ) {
        let range_start: DateTime<Utc> = "2025-06-02T00:00:00Z".parse().unwrap();
        let range_end = range_start + Duration::days(7);
        let window = QueryWindow::new(zone, range_start, range_end).unwrap();

        let start = range_start + Duration::hours(start_offset);
        let end = start + Duration::minutes(length);
        let event = EventRecord::timed("single", start, end, zone);

        let result = materialize(&event, &window).unwrap();
        let expected = usize::from(start < range_end && end > range_start);
        prop_assert_eq!(result.len(), expected);
    }

    /// An all-day event spanning N days inside the window yields N consecutive days.
    #[test]
    fn all_day_span_yields_one_occurrence_per_day(
        zone in arb_timezone(),
        first in arb_date(),
        days in 1u64..=10,
    ) {
        let after_last = first.checked_add_days(chrono::Days::new(days)).unwrap();
        let event = EventRecord::all_day(
            "span",
            local_midnight(zone, first),
            local_midnight(zone, after_last),
        );
        let window = QueryWindow::new(
            zone,
            local_midnight(zone, first - Duration::days(3)),
            local_midnight(zone, after_last + Duration::days(3)),
        ).unwrap();

        let result = materialize(&event, &window).unwrap();
        prop_assert_eq!(result.len() as u64, days);
        for (i, occ) in result.iter().enumerate() {
            prop_assert!(occ.all_day);
            prop_assert!(occ.start < occ.end);
            prop_assert_eq!(local_date(occ.start, zone), first + Duration::days(i as i64));
        }
    }

    /// Weekly wall-clock time never moves, whatever the zone's offset does.
    #[test]
    fn weekly_wall_time_is_dst_invariant(
        zone in arb_timezone(),
        from in arb_date(),
        weekday in arb_weekday(),
        time in arb_daytime(),
    ) {
        let event = weekly_event(zone, from, weekday, time);
        let window = QueryWindow::new(
            zone,
            local_midnight(zone, from),
            local_midnight(zone, from + Duration::days(180)),
        ).unwrap();

        let result = materialize(&event, &window).unwrap();
        prop_assert!(result.len() >= 25);

        for occ in &result {
            let local = local_datetime(occ.start, zone);
            prop_assert_eq!((local.hour(), local.minute()), (time.hour(), time.minute()));
            prop_assert_eq!(chrono::Datelike::weekday(&local), weekday);
        }
        for pair in result.windows(2) {
            // Exactly one week apart on the wall clock; the instant gap differs only
            // by the zone's offset change between the two dates.
            let wall_gap = local_datetime(pair[1].start, zone) - local_datetime(pair[0].start, zone);
            prop_assert_eq!(wall_gap, Duration::weeks(1));
            let drift = (pair[1].start - pair[0].start) - Duration::weeks(1);
            prop_assert!(drift.num_minutes().abs() <= 60);
        }
    }

    /// No occurrence ever lands on an excluded local date.
    #[test]
    fn exception_dates_never_appear(
        zone in arb_timezone(),
        from in arb_date(),
        weekday in arb_weekday(),
        time in arb_daytime(),
        skip_week in 0i64..8,
    ) {
        let mut event = weekly_event(zone, from, weekday, time);
        let excluded = event.start + Duration::weeks(skip_week);
        let excluded_day = local_date(excluded, zone);
        event.exception_dates = vec![excluded];

        let window = QueryWindow::new(
            zone,
            local_midnight(zone, from),
            local_midnight(zone, from + Duration::days(70)),
        ).unwrap();

        let result = materialize(&event, &window).unwrap();
        prop_assert!(!result.is_empty());
        prop_assert!(result.iter().all(|occ| local_date(occ.start, zone) != excluded_day));
    }

    /// An override anchored on date D leaves exactly one occurrence on D, its own.
    #[test]
    fn override_owns_its_date(
        zone in arb_timezone(),
        from in arb_date(),
        weekday in arb_weekday(),
        time in arb_daytime(),
        week in 0i64..8,
    ) {
        let mut event = weekly_event(zone, from, weekday, time);
        let anchor = event.start + Duration::weeks(week);
        let anchor_day = local_date(anchor, zone);

        let moved_start = wall(zone, anchor_day, NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        let mut moved = EventRecord::timed("weekly", moved_start, moved_start + Duration::minutes(30), zone);
        moved.summary = Some("moved".to_string());
        event.overrides.insert(anchor, moved);

        let window = QueryWindow::new(
            zone,
            local_midnight(zone, from),
            local_midnight(zone, from + Duration::days(70)),
        ).unwrap();

        let result = materialize(&event, &window).unwrap();
        let on_day: Vec<_> = result
            .iter()
            .filter(|occ| local_date(occ.start, zone) == anchor_day)
            .collect();
        prop_assert_eq!(on_day.len(), 1);
        prop_assert_eq!(on_day[0].title.as_str(), "moved");
        prop_assert_eq!(on_day[0].start, moved_start);
    }

    /// Output is always ordered by start and every occurrence has start < end.
    #[test]
    fn output_is_ordered_and_well_formed(
        zone in arb_timezone(),
        from in arb_date(),
        weekday in arb_weekday(),
        time in arb_daytime(),
    ) {
        let event = weekly_event(zone, from, weekday, time);
        let window = QueryWindow::new(
            zone,
            local_midnight(zone, from),
            local_midnight(zone, from + Duration::days(60)),
        ).unwrap();

        let result = materialize(&event, &window).unwrap();
        for occ in &result {
            prop_assert!(occ.start < occ.end);
        }
        for pair in result.windows(2) {
            prop_assert!(pair[0].start <= pair[1].start);
        }
    }
}
