//! Compliance Core - period calculation and status derivation
//!
//! Stateless calculation library behind the employee and client compliance
//! views, plus a simulated clock for operator test mode.
//!
//! ## Call chain
//! Clock -> current period for a type's frequency -> records for that period
//! (supplied by the persistence layer) -> derived status per (entity, period).
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use compliance_core::{classify, period_identifier_for, DerivedStatus, Frequency};
//!
//! let now = Utc.with_ymd_and_hms(2025, 5, 15, 0, 0, 0).unwrap();
//! let current = period_identifier_for(now, Frequency::Quarterly).unwrap();
//! assert_eq!(current.to_string(), "2025-Q2");
//!
//! let status = classify(None, "2025-Q1", Frequency::Quarterly, now).unwrap();
//! assert_eq!(status, DerivedStatus::Overdue);
//! ```

// Core error handling
pub mod error;

// Environment settings and compliance-type catalog
pub mod config;

// "Now": real, fixed or operator-simulated
pub mod clock;

// Period identifiers and windows
pub mod period;

// Overdue detection, classification, timelines and summaries
pub mod status;

// Test-mode date jumps
pub mod presets;

pub use clock::{ClockSource, FixedClock, RealClock, SimulatedClock};
pub use config::{ComplianceCatalog, ComplianceConfig};
pub use error::{ClockError, ComplianceError, ConfigError, PeriodError, PreferenceError};
pub use period::{period_identifier_for, period_window, PeriodIdentifier, PeriodWindow};
pub use presets::Preset;
pub use status::{
    classify, classify_period, current_period_status, is_overdue, quarterly_timeline, summarize,
    ComplianceStats, ComplianceSummary, QuarterlyPeriod, SummaryOptions,
};

// Foundation types
pub use compliance_types::{
    parse_instant, ComplianceRecord, ComplianceTypeConfig, DerivedStatus, Frequency, RecordStatus,
    TypesError,
};
