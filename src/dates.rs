//! Calendar helpers for month-stepped schedules

use chrono::{Datelike, Days, Months, NaiveDate};

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.day0() as u64)
}

/// Shift by whole calendar months, clamping the day to the month's end
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Signed day count from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Shift by a signed number of days
pub fn offset_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Schedule column label, e.g. `Jan-25`
pub fn month_label(month: NaiveDate) -> String {
    month.format("%b-%y").to_string()
}

/// Fraction of the `start..end` window elapsed at `at`, clamped to [0, 1].
///
/// Zero when the window is empty or inverted.
pub fn elapsed_fraction(start: NaiveDate, at: NaiveDate, end: NaiveDate) -> f64 {
    let span = days_between(start, end);
    if span <= 0 {
        return 0.0;
    }
    (days_between(start, at) as f64 / span as f64).clamp(0.0, 1.0)
}
