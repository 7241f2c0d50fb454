use chrono::Weekday;

use super::*;
use crate::clock::ManualClock;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn navigator_at(today: &str) -> WeekNavigator {
    WeekNavigator::new(Arc::new(ManualClock::at_date(date(today))))
}

#[test]
fn week_of_wednesday_starts_on_monday() {
    let range = week_of(date("2025-06-11"));
    assert_eq!(range.start_str(), "2025-06-09");
    assert_eq!(range.end_str(), "2025-06-15");
}

#[test]
fn week_of_sunday_belongs_to_preceding_monday() {
    let range = week_of(date("2025-06-15"));
    assert_eq!(range.start_str(), "2025-06-09");
    assert_eq!(range.end_str(), "2025-06-15");
}

#[test]
fn week_of_spans_year_boundary() {
    let range = week_of(date("2025-01-01"));
    assert_eq!(range.start_str(), "2024-12-30");
    assert_eq!(range.end_str(), "2025-01-05");
}

#[test]
fn week_of_spans_month_boundary_in_leap_year() {
    let range = week_of(date("2024-02-29"));
    assert_eq!(range.start_str(), "2024-02-26");
    assert_eq!(range.end_str(), "2024-03-03");
}

#[test]
fn every_day_of_a_year_maps_to_a_monday_and_is_idempotent() {
    let mut day = date("2024-01-01");
    let stop = date("2025-12-31");
    while day <= stop {
        let range = week_of(day);
        assert_eq!(range.start.weekday(), Weekday::Mon, "start for {day}");
        assert_eq!(range.end.weekday(), Weekday::Sun, "end for {day}");
        assert_eq!(range.end - range.start, TimeDelta::days(6));
        assert!(range.start <= day && day <= range.end);
        assert_eq!(week_of(range.start), range, "idempotent for {day}");
        day = day.succ_opt().unwrap();
    }
}

#[test]
fn shift_round_trips() {
    let mut day = date("2024-12-01");
    for _ in 0..60 {
        let range = week_of(day);
        assert_eq!(shift(shift(range, 1), -1), range);
        assert_eq!(shift(shift(range, -3), 3), range);
        day = day.succ_opt().unwrap();
    }
}

#[test]
fn shift_moves_whole_weeks() {
    let range = week_of(date("2025-06-11"));
    assert_eq!(shift(range, 1).start_str(), "2025-06-16");
    assert_eq!(shift(range, -2).start_str(), "2025-05-26");
    assert_eq!(shift(range, 0), range);
}

#[test]
fn shift_saturates_at_calendar_limits() {
    let range = week_of(date("2025-06-11"));
    assert_eq!(shift(range, i64::MAX), range);
}

#[test]
fn next_is_blocked_only_from_current_week() {
    let today = date("2026-10-21");
    let this_week = week_of(today);
    assert!(next_is_blocked(this_week, today));
    assert!(!next_is_blocked(shift(this_week, -1), today));
    assert!(!next_is_blocked(shift(this_week, -10), today));
}

#[test]
fn is_current_week_compares_starts() {
    let today = date("2025-06-15");
    assert!(is_current_week(week_of(date("2025-06-09")), today));
    assert!(!is_current_week(week_of(date("2025-06-16")), today));
}

#[test]
fn contains_is_inclusive_on_both_ends() {
    let range = week_of(date("2025-06-11"));
    assert!(range.contains("2025-06-09"));
    assert!(range.contains("2025-06-15"));
    assert!(!range.contains("2025-06-08"));
    assert!(!range.contains("2025-06-16"));
    assert!(!range.contains(""));
}

#[test]
fn label_uses_month_and_day_without_padding() {
    let range = week_of(date("2025-06-03"));
    assert_eq!(range.label(), "6월 2일 ~ 6월 8일");
}

#[test]
fn serializes_dates_as_iso_strings() {
    let range = week_of(date("2025-06-11"));
    let json = serde_json::to_value(range).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"start": "2025-06-09", "end": "2025-06-15"})
    );
}

#[test]
fn navigator_refuses_to_pass_current_week() {
    let mut nav = navigator_at("2025-06-11");
    assert!(nav.is_current_week());
    assert!(nav.next().is_none());
    assert_eq!(nav.range().start_str(), "2025-06-09");

    let prev = nav.previous();
    assert_eq!(prev.start_str(), "2025-06-02");
    assert!(nav.can_go_next());
    assert_eq!(nav.next().map(|r| r.start_str()).as_deref(), Some("2025-06-09"));
    assert!(nav.next().is_none());
}

#[test]
fn navigator_jump_clamps_to_current_week() {
    let mut nav = navigator_at("2025-06-11");
    nav.jump(-4);
    assert_eq!(nav.range().start_str(), "2025-05-12");
    let clamped = nav.jump(10);
    assert_eq!(clamped.start_str(), "2025-06-09");
}

#[test]
fn navigator_go_to_this_week_resets() {
    let mut nav = navigator_at("2025-06-11");
    nav.previous();
    nav.previous();
    assert!(!nav.is_current_week());
    assert_eq!(nav.go_to_this_week().start_str(), "2025-06-09");
}
