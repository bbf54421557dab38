//! Tests for RRULE text parsing.

use chrono::{DateTime, Utc, Weekday};
use chrono_tz::America::New_York;
use feed_core::parse_rrule;
use occurrence_engine::{Frequency, WeekdayNum};

fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

#[test]
fn parses_every_supported_part() {
    let rule = parse_rrule(
        "FREQ=MONTHLY;INTERVAL=2;COUNT=10;BYDAY=2TU,-1FR;BYMONTHDAY=1,-1;BYMONTH=3,9;BYSETPOS=-1;WKST=SU",
        New_York,
    );

    assert_eq!(rule.frequency, Frequency::Monthly);
    assert_eq!(rule.interval, 2);
    assert_eq!(rule.count, Some(10));
    assert_eq!(
        rule.by_weekday,
        vec![WeekdayNum::nth(2, Weekday::Tue), WeekdayNum::nth(-1, Weekday::Fri)]
    );
    assert_eq!(rule.by_month_day, vec![1, -1]);
    assert_eq!(rule.by_month, vec![3, 9]);
    assert_eq!(rule.by_set_pos, vec![-1]);
    assert_eq!(rule.week_start, Some(Weekday::Sun));
}

#[test]
fn rendering_round_trips_through_rrule_text() {
    let text = "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE,FR;WKST=MO";
    assert_eq!(parse_rrule(text, New_York).to_rrule_text(), text);
}

#[test]
fn lowercase_and_plus_prefixed_values_are_accepted() {
    let rule = parse_rrule("freq=yearly;byday=+1mo", New_York);
    assert_eq!(rule.frequency, Frequency::Yearly);
    assert_eq!(rule.by_weekday, vec![WeekdayNum::nth(1, Weekday::Mon)]);
}

#[test]
fn unknown_parts_are_ignored() {
    let rule = parse_rrule("FREQ=DAILY;X-NAME=foo;BYHOUR=9", New_York);
    assert_eq!(rule.frequency, Frequency::Daily);
    assert_eq!(rule.interval, 1);
}

#[test]
fn missing_or_subdaily_frequency_is_unsupported() {
    assert!(!parse_rrule("COUNT=3", New_York).frequency.is_supported());
    assert_eq!(
        parse_rrule("FREQ=HOURLY", New_York).frequency,
        Frequency::Unsupported("HOURLY".to_string())
    );
}

#[test]
fn bad_interval_falls_back_to_one() {
    assert_eq!(parse_rrule("FREQ=DAILY;INTERVAL=0", New_York).interval, 1);
    assert_eq!(parse_rrule("FREQ=DAILY;INTERVAL=x", New_York).interval, 1);
}

#[test]
fn until_forms() {
    // UTC as written.
    assert_eq!(
        parse_rrule("FREQ=DAILY;UNTIL=20250301T150000Z", New_York).until,
        Some(utc("2025-03-01T15:00:00Z"))
    );
    // Floating, read in the event zone.
    assert_eq!(
        parse_rrule("FREQ=DAILY;UNTIL=20250301T100000", New_York).until,
        Some(utc("2025-03-01T15:00:00Z"))
    );
    // Date, through the end of that local day.
    assert_eq!(
        parse_rrule("FREQ=DAILY;UNTIL=20250301", New_York).until,
        Some(utc("2025-03-02T04:59:59Z"))
    );
    assert_eq!(parse_rrule("FREQ=DAILY;UNTIL=soon", New_York).until, None);
}

#[test]
fn unreadable_list_entries_are_dropped() {
    let rule = parse_rrule("FREQ=WEEKLY;BYDAY=TU,XX,0MO,TH", New_York);
    assert_eq!(
        rule.by_weekday,
        vec![WeekdayNum::every(Weekday::Tue), WeekdayNum::every(Weekday::Thu)]
    );
}
