//! ISO-8601 week numbering
//!
//! Week 1 is the week containing the year's first Thursday, so the week-year
//! can differ from the calendar year for dates around January 1st.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// ISO week-year and week number for a calendar date.
///
/// Shifts the date to the Thursday of its Monday-based week; that Thursday's
/// calendar year is the ISO year and `ceil(ordinal / 7)` is the week number.
pub fn iso_week_of(date: NaiveDate) -> (i32, u32) {
    let to_thursday = 3 - date.weekday().num_days_from_monday() as i64;
    let thursday = date + Duration::days(to_thursday);
    (thursday.year(), thursday.ordinal().div_ceil(7))
}

/// Number of ISO weeks in `iso_year` (52 or 53).
///
/// December 28th always falls in the last ISO week of its year.
pub fn weeks_in_iso_year(iso_year: i32) -> Option<u32> {
    NaiveDate::from_ymd_opt(iso_year, 12, 28).map(|d| iso_week_of(d).1)
}

/// Monday of ISO week 1 of `iso_year`
pub fn iso_year_start(iso_year: i32) -> Option<NaiveDate> {
    NaiveDate::from_isoywd_opt(iso_year, 1, Weekday::Mon)
}
