//! Tests for recurrence rule normalization, rendering, and event classification.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use occurrence_engine::rule::{parse_weekday_code, weekday_code};
use occurrence_engine::{normalize, EventKind, EventRecord, Frequency, RecurrenceRule, WeekdayNum};

fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 8).unwrap()
}

fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

// ── Normalizer ──────────────────────────────────────────────────────────────

#[test]
fn yearly_without_month_gets_anchor_month() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.by_month_day = vec![8];

    let normalized = normalize(&rule, anchor());
    assert_eq!(normalized.by_month, vec![12]);
    assert_eq!(normalized.by_month_day, vec![8]);
}

#[test]
fn yearly_with_month_is_untouched() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.by_month = vec![6];
    rule.by_month_day = vec![15];

    assert_eq!(normalize(&rule, anchor()), rule);
}

#[test]
fn non_yearly_rules_pass_through() {
    for frequency in [Frequency::Daily, Frequency::Weekly, Frequency::Monthly] {
        let mut rule = RecurrenceRule::new(frequency);
        rule.by_month_day = vec![1];
        rule.count = Some(24);
        rule.until = Some(utc("2026-01-01T00:00:00Z"));

        assert_eq!(normalize(&rule, anchor()), rule);
    }
}

#[test]
fn normalization_is_idempotent() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.by_month_day = vec![8];

    let once = normalize(&rule, anchor());
    assert_eq!(normalize(&once, anchor()), once);
}

// ── Rendering ───────────────────────────────────────────────────────────────

#[test]
fn renders_rrule_text_without_until() {
    let mut rule = RecurrenceRule::new(Frequency::Monthly);
    rule.interval = 2;
    rule.count = Some(10);
    rule.until = Some(utc("2026-01-01T00:00:00Z"));
    rule.by_weekday = vec![WeekdayNum::nth(-1, Weekday::Fri), WeekdayNum::every(Weekday::Mon)];
    rule.week_start = Some(Weekday::Sun);

    assert_eq!(
        rule.to_rrule_text(),
        "FREQ=MONTHLY;INTERVAL=2;COUNT=10;BYDAY=-1FR,MO;WKST=SU"
    );
}

#[test]
fn renders_month_and_set_pos_lists() {
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.by_month = vec![3, 9];
    rule.by_month_day = vec![1, -1];
    rule.by_set_pos = vec![1];

    assert_eq!(
        rule.to_rrule_text(),
        "FREQ=YEARLY;BYMONTHDAY=1,-1;BYMONTH=3,9;BYSETPOS=1"
    );
}

#[test]
fn weekday_codes_roundtrip() {
    for day in [Weekday::Mon, Weekday::Thu, Weekday::Sun] {
        assert_eq!(parse_weekday_code(weekday_code(day)), Some(day));
    }
    assert_eq!(parse_weekday_code("tu"), Some(Weekday::Tue));
    assert_eq!(parse_weekday_code("XX"), None);
}

#[test]
fn frequency_parsing() {
    assert_eq!(Frequency::parse("weekly"), Frequency::Weekly);
    assert_eq!(
        Frequency::parse("HOURLY"),
        Frequency::Unsupported("HOURLY".to_string())
    );
    assert!(!Frequency::parse("").is_supported());
}

// ── Classification ──────────────────────────────────────────────────────────

fn event() -> EventRecord {
    EventRecord::timed(
        "e",
        utc("2024-12-08T10:00:00Z"),
        utc("2024-12-08T11:00:00Z"),
        chrono_tz::UTC,
    )
}

#[test]
fn classifies_all_four_shapes() {
    let mut timed = event();
    assert_eq!(timed.classify(anchor()), EventKind::Single);

    timed.recurrence_rule = Some(RecurrenceRule::new(Frequency::Daily));
    assert!(matches!(timed.classify(anchor()), EventKind::Recurring(_)));

    let mut all_day = EventRecord::all_day("a", utc("2024-12-08T00:00:00Z"), utc("2024-12-09T00:00:00Z"));
    assert_eq!(all_day.classify(anchor()), EventKind::SingleAllDay);

    all_day.recurrence_rule = Some(RecurrenceRule::new(Frequency::Weekly));
    assert!(matches!(all_day.classify(anchor()), EventKind::RecurringAllDay(_)));
}

#[test]
fn classification_normalizes_the_rule() {
    let mut yearly = event();
    let mut rule = RecurrenceRule::new(Frequency::Yearly);
    rule.by_month_day = vec![8];
    yearly.recurrence_rule = Some(rule);

    match yearly.classify(anchor()) {
        EventKind::Recurring(rule) => assert_eq!(rule.by_month, vec![12]),
        other => panic!("expected recurring, got {:?}", other),
    }
}

#[test]
fn unsupported_frequency_classifies_as_single() {
    let mut timed = event();
    timed.recurrence_rule = Some(RecurrenceRule::new(Frequency::Unsupported("SECONDLY".to_string())));
    assert_eq!(timed.classify(anchor()), EventKind::Single);
}
