//! Period Identifiers
//!
//! Typed form of the period identifier strings used as lookup keys against
//! persisted compliance records. The string form only exists at the boundary:
//! `Display` renders it, `PeriodIdentifier::parse` is the only way back in.
//!
//! Canonical wire formats (all numbers zero-padded):
//! - annual: `YYYY`
//! - quarterly: `YYYY-Qn`
//! - monthly: `YYYY-MM`
//! - bi-annual: `YYYY-Hn`
//! - weekly: `YYYY-Wnn` (ISO week-year and week)

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use compliance_types::Frequency;
use serde::{Serialize, Serializer};
use std::fmt;

use super::iso_week::{iso_week_of, weeks_in_iso_year};
use crate::error::PeriodError;

/// Display labels for the four quarters, in order
pub const QUARTER_LABELS: [&str; 4] = [
    "Q1 Jan to Mar",
    "Q2 Apr to Jun",
    "Q3 Jul to Sep",
    "Q4 Oct to Dec",
];

/// Years expressible in the four-digit wire form
pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// One recurrence window of a compliance type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodIdentifier {
    Annual { year: i32 },
    Quarterly { year: i32, quarter: u32 },
    Monthly { year: i32, month: u32 },
    BiAnnual { year: i32, half: u32 },
    /// `year` is the ISO week-year, not necessarily the calendar year
    Weekly { year: i32, week: u32 },
}

impl PeriodIdentifier {
    /// The period of `frequency` containing `date`.
    ///
    /// Fails with `OutOfRange` when the period's year has no four-digit
    /// identifier.
    pub fn for_instant(date: DateTime<Utc>, frequency: Frequency) -> Result<Self, PeriodError> {
        Self::for_date(date.date_naive(), frequency)
    }

    /// The period of `frequency` containing the calendar day `date`
    pub fn for_date(date: NaiveDate, frequency: Frequency) -> Result<Self, PeriodError> {
        let year = date.year();
        let identifier = match frequency {
            Frequency::Annual => Self::Annual { year },
            Frequency::Quarterly => Self::Quarterly {
                year,
                quarter: date.month0() / 3 + 1,
            },
            Frequency::Monthly => Self::Monthly {
                year,
                month: date.month(),
            },
            Frequency::BiAnnual => Self::BiAnnual {
                year,
                half: if date.month() <= 6 { 1 } else { 2 },
            },
            Frequency::Weekly => {
                let (year, week) = iso_week_of(date);
                Self::Weekly { year, week }
            }
        };
        if !SUPPORTED_YEARS.contains(&identifier.year()) {
            return Err(PeriodError::OutOfRange(format!("{frequency} period of {date}")));
        }
        Ok(identifier)
    }

    /// Parse the wire form of an identifier for a known frequency.
    ///
    /// Anything that is not exactly the canonical shape is rejected; a wrong
    /// window means a wrong overdue classification.
    pub fn parse(raw: &str, frequency: Frequency) -> Result<Self, PeriodError> {
        let malformed = |reason: &str| PeriodError::malformed(raw, frequency, reason);

        let (year_part, rest) = match raw.split_once('-') {
            Some((year, rest)) => (year, Some(rest)),
            None => (raw, None),
        };
        let year = parse_padded(year_part, 4)
            .map(|y| y as i32)
            .ok_or_else(|| malformed("year must be four digits"))?;

        let identifier = match frequency {
            Frequency::Annual => {
                if rest.is_some() {
                    return Err(malformed("expected YYYY"));
                }
                Self::Annual { year }
            }
            Frequency::Quarterly => {
                let quarter = rest
                    .and_then(|r| r.strip_prefix('Q'))
                    .and_then(|n| parse_padded(n, 1))
                    .ok_or_else(|| malformed("expected YYYY-Qn"))?;
                Self::Quarterly { year, quarter }
            }
            Frequency::Monthly => {
                let month = rest
                    .and_then(|n| parse_padded(n, 2))
                    .ok_or_else(|| malformed("expected YYYY-MM"))?;
                Self::Monthly { year, month }
            }
            Frequency::BiAnnual => {
                let half = rest
                    .and_then(|r| r.strip_prefix('H'))
                    .and_then(|n| parse_padded(n, 1))
                    .ok_or_else(|| malformed("expected YYYY-Hn"))?;
                Self::BiAnnual { year, half }
            }
            Frequency::Weekly => {
                let week = rest
                    .and_then(|r| r.strip_prefix('W'))
                    .and_then(|n| parse_padded(n, 2))
                    .ok_or_else(|| malformed("expected YYYY-Wnn"))?;
                Self::Weekly { year, week }
            }
        };

        identifier.validate().map_err(|e| match e {
            PeriodError::MalformedIdentifier { reason, .. } => malformed(&reason),
            other => other,
        })?;
        Ok(identifier)
    }

    /// Check the sub-period number is in range for its frequency
    pub fn validate(&self) -> Result<(), PeriodError> {
        if !SUPPORTED_YEARS.contains(&self.year()) {
            return Err(PeriodError::OutOfRange(format!(
                "{} period in year {}",
                self.frequency(),
                self.year()
            )));
        }
        let reason = match *self {
            Self::Annual { .. } => None,
            Self::Quarterly { quarter, .. } if !(1..=4).contains(&quarter) => {
                Some(format!("quarter {quarter} out of range 1..4"))
            }
            Self::Monthly { month, .. } if !(1..=12).contains(&month) => {
                Some(format!("month {month} out of range 01..12"))
            }
            Self::BiAnnual { half, .. } if !(1..=2).contains(&half) => {
                Some(format!("half {half} out of range 1..2"))
            }
            Self::Weekly { year, week } => {
                let weeks = weeks_in_iso_year(year)
                    .ok_or_else(|| PeriodError::OutOfRange(self.to_string()))?;
                (!(1..=weeks).contains(&week))
                    .then(|| format!("week {week} out of range 01..{weeks} for {year}"))
            }
            _ => None,
        };
        match reason {
            Some(reason) => Err(PeriodError::malformed(
                &self.to_string(),
                self.frequency(),
                reason,
            )),
            None => Ok(()),
        }
    }

    pub fn frequency(&self) -> Frequency {
        match self {
            Self::Annual { .. } => Frequency::Annual,
            Self::Quarterly { .. } => Frequency::Quarterly,
            Self::Monthly { .. } => Frequency::Monthly,
            Self::BiAnnual { .. } => Frequency::BiAnnual,
            Self::Weekly { .. } => Frequency::Weekly,
        }
    }

    /// Year component (ISO week-year for weekly periods)
    pub fn year(&self) -> i32 {
        match *self {
            Self::Annual { year }
            | Self::Quarterly { year, .. }
            | Self::Monthly { year, .. }
            | Self::BiAnnual { year, .. }
            | Self::Weekly { year, .. } => year,
        }
    }

    /// The immediately following period of the same frequency
    pub fn next(&self) -> Self {
        match *self {
            Self::Annual { year } => Self::Annual { year: year + 1 },
            Self::Quarterly { year, quarter } if quarter >= 4 => Self::Quarterly {
                year: year + 1,
                quarter: 1,
            },
            Self::Quarterly { year, quarter } => Self::Quarterly {
                year,
                quarter: quarter + 1,
            },
            Self::Monthly { year, month } if month >= 12 => Self::Monthly {
                year: year + 1,
                month: 1,
            },
            Self::Monthly { year, month } => Self::Monthly {
                year,
                month: month + 1,
            },
            Self::BiAnnual { year, half } if half >= 2 => Self::BiAnnual {
                year: year + 1,
                half: 1,
            },
            Self::BiAnnual { year, half } => Self::BiAnnual { year, half: half + 1 },
            Self::Weekly { year, week } => {
                if week >= weeks_in_iso_year(year).unwrap_or(52) {
                    Self::Weekly {
                        year: year + 1,
                        week: 1,
                    }
                } else {
                    Self::Weekly {
                        year,
                        week: week + 1,
                    }
                }
            }
        }
    }

    /// The immediately preceding period of the same frequency
    pub fn previous(&self) -> Self {
        match *self {
            Self::Annual { year } => Self::Annual { year: year - 1 },
            Self::Quarterly { year, quarter } if quarter <= 1 => Self::Quarterly {
                year: year - 1,
                quarter: 4,
            },
            Self::Quarterly { year, quarter } => Self::Quarterly {
                year,
                quarter: quarter - 1,
            },
            Self::Monthly { year, month } if month <= 1 => Self::Monthly {
                year: year - 1,
                month: 12,
            },
            Self::Monthly { year, month } => Self::Monthly {
                year,
                month: month - 1,
            },
            Self::BiAnnual { year, half } if half <= 1 => Self::BiAnnual {
                year: year - 1,
                half: 2,
            },
            Self::BiAnnual { year, half } => Self::BiAnnual { year, half: half - 1 },
            Self::Weekly { year, week } if week <= 1 => Self::Weekly {
                year: year - 1,
                week: weeks_in_iso_year(year - 1).unwrap_or(52),
            },
            Self::Weekly { year, week } => Self::Weekly {
                year,
                week: week - 1,
            },
        }
    }

    /// Every period of `frequency` whose identifier carries `year`, in order
    pub fn periods_in_year(year: i32, frequency: Frequency) -> Vec<Self> {
        match frequency {
            Frequency::Annual => vec![Self::Annual { year }],
            Frequency::Quarterly => (1..=4)
                .map(|quarter| Self::Quarterly { year, quarter })
                .collect(),
            Frequency::Monthly => (1..=12).map(|month| Self::Monthly { year, month }).collect(),
            Frequency::BiAnnual => (1..=2).map(|half| Self::BiAnnual { year, half }).collect(),
            Frequency::Weekly => (1..=weeks_in_iso_year(year).unwrap_or(52))
                .map(|week| Self::Weekly { year, week })
                .collect(),
        }
    }

    /// Human-readable label for display
    pub fn label(&self) -> String {
        match *self {
            Self::Annual { year } => format!("{year:04}"),
            Self::Quarterly { year, quarter } => match quarter_label(quarter) {
                Some(label) => format!("{label} {year:04}"),
                None => self.to_string(),
            },
            Self::Monthly { year, month } => match NaiveDate::from_ymd_opt(year, month, 1) {
                Some(first) => first.format("%B %Y").to_string(),
                None => self.to_string(),
            },
            Self::BiAnnual { year, half } => format!("H{half} {year:04}"),
            Self::Weekly { year, week } => format!("Week {week:02}, {year:04}"),
        }
    }
}

/// Fixed label for quarter `1..=4`
pub fn quarter_label(quarter: u32) -> Option<&'static str> {
    let index = usize::try_from(quarter).ok()?.checked_sub(1)?;
    QUARTER_LABELS.get(index).copied()
}

/// Parse exactly `width` ASCII digits
fn parse_padded(raw: &str, width: usize) -> Option<u32> {
    if raw.len() == width && raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.parse().ok()
    } else {
        None
    }
}

impl fmt::Display for PeriodIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annual { year } => write!(f, "{year:04}"),
            Self::Quarterly { year, quarter } => write!(f, "{year:04}-Q{quarter}"),
            Self::Monthly { year, month } => write!(f, "{year:04}-{month:02}"),
            Self::BiAnnual { year, half } => write!(f, "{year:04}-H{half}"),
            Self::Weekly { year, week } => write!(f, "{year:04}-W{week:02}"),
        }
    }
}

impl Serialize for PeriodIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
