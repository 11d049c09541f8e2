//! Period Windows
//!
//! Start and end instants of a period. Windows of consecutive periods of the
//! same frequency are contiguous: `end + 1ms == next.start`.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use super::identifier::PeriodIdentifier;
use super::iso_week::iso_year_start;
use crate::error::PeriodError;

/// Inclusive window of a period, millisecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodWindow {
    /// First instant of the first day (00:00:00.000)
    pub start: DateTime<Utc>,
    /// Last instant of the last day (23:59:59.999)
    pub end: DateTime<Utc>,
}

impl PeriodWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Window has fully elapsed at `now`
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end < now
    }

    /// Window has not started at `now`
    pub fn is_future(&self, now: DateTime<Utc>) -> bool {
        now < self.start
    }
}

impl PeriodIdentifier {
    /// Compute the window of this period.
    ///
    /// Fails for identifiers whose sub-period is out of range, which can only
    /// come from constructing the enum directly with bad values.
    pub fn window(&self) -> Result<PeriodWindow, PeriodError> {
        self.validate()?;
        let out_of_range = || PeriodError::OutOfRange(self.to_string());

        let (first_day, last_day) = match *self {
            Self::Annual { year } => (
                ymd(year, 1, 1).ok_or_else(out_of_range)?,
                ymd(year, 12, 31).ok_or_else(out_of_range)?,
            ),
            Self::Quarterly { year, quarter } => {
                let last_month = quarter * 3;
                (
                    ymd(year, last_month - 2, 1).ok_or_else(out_of_range)?,
                    last_day_of_month(year, last_month).ok_or_else(out_of_range)?,
                )
            }
            Self::Monthly { year, month } => (
                ymd(year, month, 1).ok_or_else(out_of_range)?,
                last_day_of_month(year, month).ok_or_else(out_of_range)?,
            ),
            Self::BiAnnual { year, half } => {
                let (first_month, last_month) = if half == 1 { (1, 6) } else { (7, 12) };
                (
                    ymd(year, first_month, 1).ok_or_else(out_of_range)?,
                    last_day_of_month(year, last_month).ok_or_else(out_of_range)?,
                )
            }
            Self::Weekly { year, week } => {
                let start = iso_year_start(year)
                    .and_then(|d| d.checked_add_signed(Duration::days(7 * (week as i64 - 1))))
                    .ok_or_else(out_of_range)?;
                let end = start
                    .checked_add_signed(Duration::days(6))
                    .ok_or_else(out_of_range)?;
                (start, end)
            }
        };

        Ok(PeriodWindow {
            start: start_of_day(first_day),
            end: end_of_day(last_day),
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> Result<bool, PeriodError> {
        Ok(self.window()?.contains(instant))
    }
}

pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

pub(crate) fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::milliseconds(86_399_999)
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Day 0 of the following month, so leap years need no table
fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    ymd(next_year, next_month, 1)?.pred_opt()
}
