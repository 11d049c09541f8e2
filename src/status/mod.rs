//! Overdue/Status Deriver
//!
//! Classifies (entity, period) pairs against the current, possibly simulated,
//! date. Overdue detection compares window ends; identifier strings are only
//! used as lookup keys.

pub mod summary;
pub mod timeline;

use chrono::{DateTime, Utc};
use compliance_types::{ComplianceRecord, DerivedStatus, Frequency};
use uuid::Uuid;

pub use summary::{
    is_deduplicated, summarize, ComplianceStats, ComplianceSummary, SummaryEntry, SummaryOptions,
};
pub use timeline::{
    current_period_status, quarterly_timeline, CurrentPeriodStatus, QuarterlyPeriod,
};

use crate::error::PeriodError;
use crate::period::PeriodIdentifier;

impl PeriodIdentifier {
    /// The period's window ended before `now`
    pub fn is_overdue(&self, now: DateTime<Utc>) -> Result<bool, PeriodError> {
        Ok(self.window()?.is_past(now))
    }
}

/// Whether the wire-form `identifier` names a period that has fully elapsed
pub fn is_overdue(
    identifier: &str,
    frequency: Frequency,
    now: DateTime<Utc>,
) -> Result<bool, PeriodError> {
    PeriodIdentifier::parse(identifier, frequency)?.is_overdue(now)
}

/// Derive the presentation status of one period.
///
/// A completed record wins; otherwise the date comparison alone decides.
/// `record == None` means the period has no record yet.
pub fn classify_period(
    record: Option<&ComplianceRecord>,
    period: &PeriodIdentifier,
    now: DateTime<Utc>,
) -> Result<DerivedStatus, PeriodError> {
    if record.is_some_and(|r| r.is_completed()) {
        return Ok(DerivedStatus::Completed);
    }
    if period.is_overdue(now)? {
        return Ok(DerivedStatus::Overdue);
    }
    if PeriodIdentifier::for_instant(now, period.frequency()) == Ok(*period) {
        return Ok(DerivedStatus::Due);
    }
    Ok(DerivedStatus::Upcoming)
}

/// Wire-form variant of [`classify_period`]
pub fn classify(
    record: Option<&ComplianceRecord>,
    identifier: &str,
    frequency: Frequency,
    now: DateTime<Utc>,
) -> Result<DerivedStatus, PeriodError> {
    let period = PeriodIdentifier::parse(identifier, frequency)?;
    classify_period(record, &period, now)
}

/// Find the record for an (entity, period) pair of one compliance type.
/// Duplicate rows can exist; a completed one takes precedence.
pub fn find_record<'a>(
    records: &'a [ComplianceRecord],
    compliance_type_id: Uuid,
    entity_id: Uuid,
    period: &PeriodIdentifier,
) -> Option<&'a ComplianceRecord> {
    let key = period.to_string();
    let mut matching = records.iter().filter(|r| {
        r.compliance_type_id == compliance_type_id
            && r.entity_id == entity_id
            && r.period_identifier == key
    });
    let first = matching.next()?;
    if first.is_completed() {
        return Some(first);
    }
    matching.find(|r| r.is_completed()).or(Some(first))
}
