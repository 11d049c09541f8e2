//! Preset Navigator
//!
//! Jumps for the test-mode date picker. Pure transforms of the current
//! simulated date; feeding the result back into the clock is the caller's job.

use chrono::{DateTime, Duration, Months, Utc};
use compliance_types::Frequency;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clock::ClockSource;
use crate::error::PeriodError;
use crate::period::PeriodIdentifier;

/// Last instant of the period of `frequency` containing `current`
pub fn end_of_current_period(
    current: DateTime<Utc>,
    frequency: Frequency,
) -> Result<DateTime<Utc>, PeriodError> {
    Ok(PeriodIdentifier::for_instant(current, frequency)?.window()?.end)
}

/// End of the current period advanced by one frequency unit.
///
/// Calendar-aware: month arithmetic clamps to the last valid day, so the
/// result always lands inside the next period.
pub fn start_of_next_period(
    current: DateTime<Utc>,
    frequency: Frequency,
) -> Result<DateTime<Utc>, PeriodError> {
    let end = end_of_current_period(current, frequency)?;
    add_frequency_unit(end, frequency)
}

pub fn one_year_ago(current: DateTime<Utc>) -> Result<DateTime<Utc>, PeriodError> {
    years_ago(current, 1)
}

pub fn five_years_ago(current: DateTime<Utc>) -> Result<DateTime<Utc>, PeriodError> {
    years_ago(current, 5)
}

/// Real wall-clock time, bypassing any simulation
pub fn now(real: &impl ClockSource) -> DateTime<Utc> {
    real.now()
}

fn years_ago(current: DateTime<Utc>, years: u32) -> Result<DateTime<Utc>, PeriodError> {
    current
        .checked_sub_months(Months::new(years * 12))
        .ok_or_else(|| PeriodError::OutOfRange(format!("{current} minus {years} years")))
}

/// Add one year / half / quarter / month / week
fn add_frequency_unit(
    instant: DateTime<Utc>,
    frequency: Frequency,
) -> Result<DateTime<Utc>, PeriodError> {
    let shifted = match frequency {
        Frequency::Annual => instant.checked_add_months(Months::new(12)),
        Frequency::BiAnnual => instant.checked_add_months(Months::new(6)),
        Frequency::Quarterly => instant.checked_add_months(Months::new(3)),
        Frequency::Monthly => instant.checked_add_months(Months::new(1)),
        Frequency::Weekly => instant.checked_add_signed(Duration::weeks(1)),
    };
    shifted.ok_or_else(|| PeriodError::OutOfRange(format!("{instant} plus one {frequency} unit")))
}

/// Named jumps offered by the test-mode UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    Now,
    EndOfCurrentPeriod,
    StartOfNextPeriod,
    OneYearAgo,
    FiveYearsAgo,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Now,
        Preset::EndOfCurrentPeriod,
        Preset::StartOfNextPeriod,
        Preset::OneYearAgo,
        Preset::FiveYearsAgo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Now => "now",
            Self::EndOfCurrentPeriod => "end-of-current-period",
            Self::StartOfNextPeriod => "start-of-next-period",
            Self::OneYearAgo => "one-year-ago",
            Self::FiveYearsAgo => "five-years-ago",
        }
    }

    /// Compute the target instant from the current simulated date
    pub fn resolve(
        &self,
        current: DateTime<Utc>,
        frequency: Frequency,
        real: &impl ClockSource,
    ) -> Result<DateTime<Utc>, PeriodError> {
        match self {
            Self::Now => Ok(now(real)),
            Self::EndOfCurrentPeriod => end_of_current_period(current, frequency),
            Self::StartOfNextPeriod => start_of_next_period(current, frequency),
            Self::OneYearAgo => one_year_ago(current),
            Self::FiveYearsAgo => five_years_ago(current),
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown preset: {s}"))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn ms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, milli: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap() + Duration::milliseconds(milli)
    }

    #[test]
    fn test_annual_presets() {
        let current = ms(2025, 6, 15, 0, 0, 0, 0);
        assert_eq!(
            end_of_current_period(current, Frequency::Annual).unwrap(),
            ms(2025, 12, 31, 23, 59, 59, 999)
        );
        assert_eq!(
            start_of_next_period(current, Frequency::Annual).unwrap(),
            ms(2026, 12, 31, 23, 59, 59, 999)
        );
    }

    #[test]
    fn test_monthly_addition_clamps_to_month_end() {
        // End of January + 1 month lands on the last day of February
        let current = ms(2024, 1, 10, 0, 0, 0, 0);
        assert_eq!(
            start_of_next_period(current, Frequency::Monthly).unwrap(),
            ms(2024, 2, 29, 23, 59, 59, 999)
        );
    }

    #[test]
    fn test_next_period_result_is_inside_next_period() {
        let current = ms(2025, 2, 3, 8, 0, 0, 0);
        for frequency in Frequency::ALL {
            let target = start_of_next_period(current, frequency).unwrap();
            let expected = PeriodIdentifier::for_instant(current, frequency).unwrap().next();
            assert_eq!(
                PeriodIdentifier::for_instant(target, frequency).unwrap(),
                expected,
                "{frequency}"
            );
        }
    }

    #[test]
    fn test_years_ago_handles_leap_day() {
        let leap = ms(2024, 2, 29, 12, 0, 0, 0);
        assert_eq!(one_year_ago(leap).unwrap(), ms(2023, 2, 28, 12, 0, 0, 0));
        assert_eq!(five_years_ago(leap).unwrap(), ms(2019, 2, 28, 12, 0, 0, 0));
    }

    #[test]
    fn test_now_preset_uses_real_clock() {
        let real = FixedClock::new(ms(2030, 1, 1, 0, 0, 0, 0));
        let simulated = ms(2020, 5, 5, 0, 0, 0, 0);
        assert_eq!(
            Preset::Now.resolve(simulated, Frequency::Monthly, &real).unwrap(),
            real.now()
        );
        assert_eq!(
            Preset::OneYearAgo.resolve(simulated, Frequency::Monthly, &real).unwrap(),
            ms(2019, 5, 5, 0, 0, 0, 0)
        );
    }

    #[test]
    fn test_preset_names_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(preset.as_str().parse::<Preset>().unwrap(), preset);
        }
        assert!("tomorrow".parse::<Preset>().is_err());
    }
}
