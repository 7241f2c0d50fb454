//! Monday-to-Sunday week windows and navigation between them.
//!
//! Ranges compare against record dates as `YYYY-MM-DD` strings. The format is
//! zero-padded and fixed-width, so lexicographic and chronological order agree.

use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Formats a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Inclusive week window. `start` is a Monday and `end` the Sunday after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    /// The week containing the clock's today.
    #[must_use]
    pub fn current(clock: &dyn Clock) -> Self {
        week_of(clock.today())
    }

    #[must_use]
    pub fn start_str(&self) -> String {
        format_date(self.start)
    }

    #[must_use]
    pub fn end_str(&self) -> String {
        format_date(self.end)
    }

    /// Inclusive string comparison against a record's `uploadedDate`.
    #[must_use]
    pub fn contains(&self, uploaded_date: &str) -> bool {
        DateBounds::from(self).contains(uploaded_date)
    }

    /// Short display label such as `6월 9일 ~ 6월 15일`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}월 {}일 ~ {}월 {}일",
            self.start.month(),
            self.start.day(),
            self.end.month(),
            self.end.day()
        )
    }
}

impl std::fmt::Display for WeekRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start_str(), self.end_str())
    }
}

/// Pre-formatted bounds, so filtering a long list formats each bound once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DateBounds {
    start: String,
    end: String,
}

impl DateBounds {
    pub(crate) fn contains(&self, uploaded_date: &str) -> bool {
        self.start.as_str() <= uploaded_date && uploaded_date <= self.end.as_str()
    }
}

impl From<&WeekRange> for DateBounds {
    fn from(range: &WeekRange) -> Self {
        Self {
            start: range.start_str(),
            end: range.end_str(),
        }
    }
}

/// The week containing `date`.
#[must_use]
pub fn week_of(date: NaiveDate) -> WeekRange {
    let since_monday = u64::from(date.weekday().num_days_from_monday());
    let start = date.checked_sub_days(Days::new(since_monday)).unwrap_or(date);
    let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
    WeekRange { start, end }
}

/// The week `delta_weeks` away from `range`. Returns `range` unchanged when
/// the target falls outside the representable calendar.
#[must_use]
pub fn shift(range: WeekRange, delta_weeks: i64) -> WeekRange {
    TimeDelta::try_weeks(delta_weeks)
        .and_then(|delta| range.start.checked_add_signed(delta))
        .map_or(range, week_of)
}

#[must_use]
pub fn is_current_week(range: WeekRange, today: NaiveDate) -> bool {
    range.start_str() == week_of(today).start_str()
}

/// True when stepping forward from `range` would pass the week of `today`.
#[must_use]
pub fn next_is_blocked(range: WeekRange, today: NaiveDate) -> bool {
    shift(range, 1).start_str() > week_of(today).start_str()
}

/// Week filter state with the "no future weeks" guard.
pub struct WeekNavigator {
    range: WeekRange,
    clock: Arc<dyn Clock>,
}

impl WeekNavigator {
    /// Starts on the current week.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let range = WeekRange::current(clock.as_ref());
        Self { range, clock }
    }

    #[must_use]
    pub fn range(&self) -> WeekRange {
        self.range
    }

    pub fn previous(&mut self) -> WeekRange {
        self.range = shift(self.range, -1);
        self.range
    }

    /// Moves one week forward, or returns `None` and stays put when that
    /// would pass the current week.
    pub fn next(&mut self) -> Option<WeekRange> {
        if !self.can_go_next() {
            tracing::debug!(range = %self.range, "next week suppressed");
            return None;
        }
        self.range = shift(self.range, 1);
        Some(self.range)
    }

    /// Jumps `delta_weeks` from the current position, clamped so it never
    /// passes the current week.
    pub fn jump(&mut self, delta_weeks: i64) -> WeekRange {
        let this_week = WeekRange::current(self.clock.as_ref());
        let target = shift(self.range, delta_weeks);
        self.range = if target.start > this_week.start {
            this_week
        } else {
            target
        };
        self.range
    }

    pub fn go_to_this_week(&mut self) -> WeekRange {
        self.range = WeekRange::current(self.clock.as_ref());
        self.range
    }

    #[must_use]
    pub fn can_go_next(&self) -> bool {
        !next_is_blocked(self.range, self.clock.today())
    }

    #[must_use]
    pub fn is_current_week(&self) -> bool {
        is_current_week(self.range, self.clock.today())
    }
}

#[cfg(test)]
#[path = "week_test.rs"]
mod tests;
