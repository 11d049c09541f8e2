//! Compliance Types - Level 1 Foundation Types
//!
//! This crate contains the pure data structures shared by the compliance core and
//! by whatever persistence layer feeds it records.
//!
//! ## Architecture Level: LEVEL 1 (Foundation)
//!
//! Nothing in this crate depends on another workspace crate. The calculation
//! core (`compliance-core`) depends on it, never the other way round.
//!
//! ## Contents
//!
//! - Recurrence frequencies attached to compliance types
//! - Persisted record status and derived (presentation) status
//! - The read-only `ComplianceRecord` row shape
//! - Compliance type configuration entries
//!
//! ## Rules
//!
//! 1. **NO CLASSIFICATION LOGIC** - dates and windows are computed in compliance-core
//! 2. **SERIALIZABLE** - every type round-trips through serde
//! 3. **STRICT PARSING** - unknown enum strings are errors, never silent defaults

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ERRORS
// ============================================================================

/// Errors raised while parsing foundation types from their wire form
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    #[error("Unknown frequency: {0}")]
    UnknownFrequency(String),

    #[error("Unknown record status: {0}")]
    UnknownRecordStatus(String),

    #[error("Invalid date '{0}': expected RFC 3339 or YYYY-MM-DD")]
    InvalidInstant(String),
}

// ============================================================================
// FREQUENCY
// ============================================================================

/// How often a compliance obligation recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Frequency {
    #[serde(rename = "annual")]
    Annual,
    #[serde(rename = "quarterly")]
    Quarterly,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "bi-annual")]
    BiAnnual,
    #[serde(rename = "weekly")]
    Weekly,
}

impl Frequency {
    /// Every frequency, in declaration order
    pub const ALL: [Frequency; 5] = [
        Frequency::Annual,
        Frequency::Quarterly,
        Frequency::Monthly,
        Frequency::BiAnnual,
        Frequency::Weekly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
            Self::Monthly => "monthly",
            Self::BiAnnual => "bi-annual",
            Self::Weekly => "weekly",
        }
    }
}

impl FromStr for Frequency {
    type Err = TypesError;

    /// Case-insensitive. Configuration data spells bi-annual several ways.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annual" => Ok(Self::Annual),
            "quarterly" => Ok(Self::Quarterly),
            "monthly" => Ok(Self::Monthly),
            "bi-annual" | "biannual" | "bi_annual" => Ok(Self::BiAnnual),
            "weekly" => Ok(Self::Weekly),
            _ => Err(TypesError::UnknownFrequency(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// STATUS TYPES
// ============================================================================

/// Status as stored on a compliance record by the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Completed,
    Pending,
    Overdue,
    New,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Overdue => "overdue",
            Self::New => "new",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl FromStr for RecordStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "overdue" => Ok(Self::Overdue),
            "new" => Ok(Self::New),
            _ => Err(TypesError::UnknownRecordStatus(s.to_string())),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Presentation status for an (entity, period) pair.
/// Never persisted - recomputed against the current (possibly simulated) date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivedStatus {
    Completed,
    Due,
    Overdue,
    Upcoming,
}

impl DerivedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Due => "due",
            Self::Overdue => "overdue",
            Self::Upcoming => "upcoming",
        }
    }

    /// Due or overdue - something still has to be done for this period
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::Due | Self::Overdue)
    }
}

impl fmt::Display for DerivedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RECORDS AND CONFIGURATION
// ============================================================================

/// A compliance record row, consumed read-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    /// Employee or client the record belongs to
    pub entity_id: Uuid,
    pub compliance_type_id: Uuid,
    /// Wire form of the period identifier (e.g. "2025-Q2")
    pub period_identifier: String,
    pub status: RecordStatus,
    #[serde(
        default,
        deserialize_with = "deserialize_completion_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_method: Option<String>,
}

impl ComplianceRecord {
    /// Create a record with no completion metadata
    pub fn new(
        entity_id: Uuid,
        compliance_type_id: Uuid,
        period_identifier: impl Into<String>,
        status: RecordStatus,
    ) -> Self {
        Self {
            entity_id,
            compliance_type_id,
            period_identifier: period_identifier.into(),
            status,
            completion_date: None,
            completion_method: None,
        }
    }

    /// Mark as completed at the given instant
    pub fn completed_at(mut self, at: DateTime<Utc>, method: Option<String>) -> Self {
        self.status = RecordStatus::Completed;
        self.completion_date = Some(at);
        self.completion_method = method;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }
}

/// Parse an instant from either RFC 3339 or a bare `YYYY-MM-DD` date.
/// Bare dates are taken as midnight UTC.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, TypesError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TypesError::InvalidInstant(raw.to_string()))
}

fn deserialize_completion_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_instant(raw.trim())
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// A compliance type (supervision, appraisal, ...) and its recurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceTypeConfig {
    pub id: Uuid,
    pub name: String,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
