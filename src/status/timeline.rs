//! Per-entity status views: the four-quarter timeline for quarterly types and a
//! single current-period status for everything else.

use chrono::{DateTime, Utc};
use compliance_types::{ComplianceRecord, ComplianceTypeConfig, DerivedStatus, Frequency};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::{classify_period, find_record};
use crate::error::PeriodError;
use crate::period::{quarter_label, PeriodIdentifier, PeriodWindow};

/// One quarter of an entity's yearly timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterlyPeriod {
    pub quarter: u32,
    /// Fixed label, e.g. "Q1 Jan to Mar"
    pub label: &'static str,
    pub period_identifier: PeriodIdentifier,
    pub window: PeriodWindow,
    pub status: DerivedStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_method: Option<String>,
}

/// Build Q1..Q4 for `entity_id` in `year`, each quarter classified on its own.
///
/// Only records of `compliance_type` count; it must be a quarterly type.
pub fn quarterly_timeline(
    compliance_type: &ComplianceTypeConfig,
    entity_id: Uuid,
    year: i32,
    records: &[ComplianceRecord],
    now: DateTime<Utc>,
) -> Result<Vec<QuarterlyPeriod>, PeriodError> {
    if compliance_type.frequency != Frequency::Quarterly {
        return Err(PeriodError::FrequencyMismatch {
            expected: Frequency::Quarterly,
            found: compliance_type.frequency,
        });
    }
    PeriodIdentifier::periods_in_year(year, Frequency::Quarterly)
        .into_iter()
        .map(|period| {
            let PeriodIdentifier::Quarterly { quarter, .. } = period else {
                return Err(PeriodError::malformed(
                    &period.to_string(),
                    Frequency::Quarterly,
                    "not a quarterly period",
                ));
            };
            let label = quarter_label(quarter).ok_or_else(|| {
                PeriodError::malformed(&period.to_string(), Frequency::Quarterly, "no label")
            })?;
            let record = find_record(records, compliance_type.id, entity_id, &period);
            let status = classify_period(record, &period, now)?;
            Ok(QuarterlyPeriod {
                quarter,
                label,
                period_identifier: period,
                window: period.window()?,
                status,
                completion_date: record.and_then(|r| r.completion_date),
                completion_method: record.and_then(|r| r.completion_method.clone()),
            })
        })
        .collect()
}

/// Status of the period currently containing `now`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentPeriodStatus {
    pub entity_id: Uuid,
    pub period_identifier: PeriodIdentifier,
    pub label: String,
    pub window: PeriodWindow,
    pub status: DerivedStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ComplianceRecord>,
}

/// Classify the current period of `compliance_type` for one entity
pub fn current_period_status(
    compliance_type: &ComplianceTypeConfig,
    entity_id: Uuid,
    records: &[ComplianceRecord],
    now: DateTime<Utc>,
) -> Result<CurrentPeriodStatus, PeriodError> {
    let period = PeriodIdentifier::for_instant(now, compliance_type.frequency)?;
    let record = find_record(records, compliance_type.id, entity_id, &period);
    let status = classify_period(record, &period, now)?;
    debug!(
        %entity_id,
        compliance_type = %compliance_type.name,
        period = %period,
        %status,
        "derived current period status"
    );

    Ok(CurrentPeriodStatus {
        entity_id,
        period_identifier: period,
        label: period.label(),
        window: period.window()?,
        status,
        record: record.cloned(),
    })
}
