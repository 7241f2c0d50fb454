use std::sync::Arc;

use chrono::NaiveDate;
use dothi_core::{is_current_week, next_is_blocked, shift, week_of, Clock, SystemClock, WeekNavigator};

/// Prints the week range for `date` (or today) shifted by `offset` weeks.
///
/// Without `--date` the shift is clamped to the current week, the same way
/// the browse commands navigate.
pub(crate) fn run_week(date: Option<NaiveDate>, offset: i64) {
    let clock = SystemClock;
    let today = clock.today();
    let range = match date {
        Some(date) => shift(week_of(date), offset),
        None => {
            let mut navigator = WeekNavigator::new(Arc::new(SystemClock));
            navigator.jump(offset)
        }
    };

    println!("{}  {}", range.start_str(), range.end_str());
    println!("{}", range.label());
    println!("current week: {}", yes_no(is_current_week(range, today)));
    println!("next allowed: {}", yes_no(!next_is_blocked(range, today)));
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
