//! Period Identifier Calculator
//!
//! Maps a date and frequency to a canonical period identifier, and an
//! identifier back to its start/end window.

pub mod identifier;
pub mod iso_week;
pub mod window;

use chrono::{DateTime, Utc};
use compliance_types::Frequency;

pub use identifier::{quarter_label, PeriodIdentifier, QUARTER_LABELS, SUPPORTED_YEARS};
pub use iso_week::{iso_week_of, weeks_in_iso_year};
pub use window::PeriodWindow;

use crate::error::PeriodError;

/// Canonical period identifier of `frequency` containing `date`
pub fn period_identifier_for(
    date: DateTime<Utc>,
    frequency: Frequency,
) -> Result<PeriodIdentifier, PeriodError> {
    PeriodIdentifier::for_instant(date, frequency)
}

/// Window of the period named by the wire-form `identifier`
pub fn period_window(identifier: &str, frequency: Frequency) -> Result<PeriodWindow, PeriodError> {
    PeriodIdentifier::parse(identifier, frequency)?.window()
}
