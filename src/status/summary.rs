//! Batch Compliance Summary
//!
//! Assembles the due and completed lists for one compliance type across a
//! population of entities:
//! - every entity gets its current period classified (due or completed)
//! - past periods with an outstanding record are surfaced as overdue
//! - completions inside the trailing window are backfilled into completed
//!
//! An (entity, period) pair appears at most once across both lists.

use chrono::{DateTime, Months, Utc};
use compliance_types::{ComplianceRecord, ComplianceTypeConfig, DerivedStatus, Frequency};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use super::{classify_period, find_record};
use crate::error::PeriodError;
use crate::period::PeriodIdentifier;

/// Presentation limits for a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Length of the recently-completed backfill window, in calendar months
    pub recent_completion_months: u32,
    /// Cap applied independently to the due and completed lists
    pub limit: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            recent_completion_months: 3,
            limit: 5,
        }
    }
}

/// One (entity, period) line in a summary list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub entity_id: Uuid,
    pub period_identifier: PeriodIdentifier,
    pub status: DerivedStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_method: Option<String>,
    #[serde(skip)]
    period_start: DateTime<Utc>,
}

impl SummaryEntry {
    fn new(
        entity_id: Uuid,
        period: PeriodIdentifier,
        status: DerivedStatus,
        record: Option<&ComplianceRecord>,
    ) -> Result<Self, PeriodError> {
        Ok(Self {
            entity_id,
            period_identifier: period,
            status,
            completion_date: record.and_then(|r| r.completion_date),
            completion_method: record.and_then(|r| r.completion_method.clone()),
            period_start: period.window()?.start,
        })
    }

    fn key(&self) -> (Uuid, PeriodIdentifier) {
        (self.entity_id, self.period_identifier)
    }
}

/// Counts of derived statuses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComplianceStats {
    pub completed: usize,
    pub due: usize,
    pub overdue: usize,
    pub upcoming: usize,
}

impl ComplianceStats {
    pub fn from_statuses(statuses: impl IntoIterator<Item = DerivedStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut stats, status| {
            match status {
                DerivedStatus::Completed => stats.completed += 1,
                DerivedStatus::Due => stats.due += 1,
                DerivedStatus::Overdue => stats.overdue += 1,
                DerivedStatus::Upcoming => stats.upcoming += 1,
            }
            stats
        })
    }

    pub fn total(&self) -> usize {
        self.completed + self.due + self.overdue + self.upcoming
    }

    /// Completed share in `0.0..=1.0`; an empty set is 0
    pub fn completion_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.completed as f64 / total as f64,
        }
    }
}

/// Summary of one compliance type at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceSummary {
    pub compliance_type_id: Uuid,
    pub frequency: Frequency,
    pub current_period: PeriodIdentifier,
    /// Overdue first, then due; oldest period first; capped
    pub due: Vec<SummaryEntry>,
    /// Most recent completion first; capped
    pub completed: Vec<SummaryEntry>,
    /// Size of `due` before the cap
    pub total_due: usize,
    /// Size of `completed` before the cap
    pub total_completed: usize,
    /// Current-period statuses across the whole population
    pub current_period_stats: ComplianceStats,
}

/// Build the due/completed summary for `compliance_type`.
///
/// Only records of this type and for entities in `entity_ids` are considered.
/// A record whose period identifier does not parse under the type's frequency
/// is a hard error.
pub fn summarize(
    compliance_type: &ComplianceTypeConfig,
    entity_ids: &[Uuid],
    records: &[ComplianceRecord],
    now: DateTime<Utc>,
    options: SummaryOptions,
) -> Result<ComplianceSummary, PeriodError> {
    let frequency = compliance_type.frequency;
    let current = PeriodIdentifier::for_instant(now, frequency)?;
    let population: HashSet<Uuid> = entity_ids.iter().copied().collect();
    let relevant: Vec<ComplianceRecord> = records
        .iter()
        .filter(|r| {
            r.compliance_type_id == compliance_type.id && population.contains(&r.entity_id)
        })
        .cloned()
        .collect();

    let mut seen: HashSet<(Uuid, PeriodIdentifier)> = HashSet::new();
    let mut due = Vec::new();
    let mut completed = Vec::new();
    let mut current_statuses = Vec::with_capacity(entity_ids.len());

    // Current period for every entity
    for &entity_id in entity_ids {
        if !seen.insert((entity_id, current)) {
            continue;
        }
        let record = find_record(&relevant, compliance_type.id, entity_id, &current);
        let status = classify_period(record, &current, now)?;
        current_statuses.push(status);
        let entry = SummaryEntry::new(entity_id, current, status, record)?;
        match status {
            DerivedStatus::Completed => completed.push(entry),
            _ => due.push(entry),
        }
    }

    // Outstanding past periods and recent completions
    let recent_from = now
        .checked_sub_months(Months::new(options.recent_completion_months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    for candidate in &relevant {
        let period = PeriodIdentifier::parse(&candidate.period_identifier, frequency)?;
        if !seen.insert((candidate.entity_id, period)) {
            continue;
        }
        let record = find_record(&relevant, compliance_type.id, candidate.entity_id, &period);
        match classify_period(record, &period, now)? {
            DerivedStatus::Overdue => due.push(SummaryEntry::new(
                candidate.entity_id,
                period,
                DerivedStatus::Overdue,
                record,
            )?),
            DerivedStatus::Completed => {
                let recent = record
                    .and_then(|r| r.completion_date)
                    .is_some_and(|at| recent_from <= at && at <= now);
                if recent {
                    completed.push(SummaryEntry::new(
                        candidate.entity_id,
                        period,
                        DerivedStatus::Completed,
                        record,
                    )?);
                }
            }
            DerivedStatus::Due | DerivedStatus::Upcoming => {}
        }
    }

    due.sort_by_key(|e| (e.status != DerivedStatus::Overdue, e.period_start));
    completed.sort_by_key(|e| Reverse(e.completion_date));

    let total_due = due.len();
    let total_completed = completed.len();
    due.truncate(options.limit);
    completed.truncate(options.limit);

    debug!(
        compliance_type = %compliance_type.name,
        current_period = %current,
        total_due,
        total_completed,
        "assembled compliance summary"
    );

    Ok(ComplianceSummary {
        compliance_type_id: compliance_type.id,
        frequency,
        current_period: current,
        due,
        completed,
        total_due,
        total_completed,
        current_period_stats: ComplianceStats::from_statuses(current_statuses),
    })
}

/// No (entity, period) pair repeats across the two lists
pub fn is_deduplicated(summary: &ComplianceSummary) -> bool {
    let mut keys = HashSet::new();
    summary
        .due
        .iter()
        .chain(summary.completed.iter())
        .all(|entry| keys.insert(entry.key()))
}
