//! Error handling for the compliance core
//!
//! Calculation errors (malformed identifiers, unknown frequencies) are hard
//! failures that surface synchronously. Clock persistence and configuration
//! have their own enums so callers can decide what is recoverable.

use compliance_types::{Frequency, TypesError};
use thiserror::Error;

/// Main error type for the compliance core
#[derive(Error, Debug)]
pub enum ComplianceError {
    #[error("Period error: {0}")]
    Period(#[from] PeriodError),

    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Type error: {0}")]
    Types(#[from] TypesError),
}

/// Period identifier and window errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Malformed {frequency} period identifier '{identifier}': {reason}")]
    MalformedIdentifier {
        identifier: String,
        frequency: Frequency,
        reason: String,
    },

    #[error("Unknown frequency: {0}")]
    UnknownFrequency(String),

    #[error("Date arithmetic out of range for {0}")]
    OutOfRange(String),

    #[error("Expected a {expected} compliance type, got {found}")]
    FrequencyMismatch {
        expected: Frequency,
        found: Frequency,
    },
}

impl PeriodError {
    pub(crate) fn malformed(
        identifier: &str,
        frequency: Frequency,
        reason: impl Into<String>,
    ) -> Self {
        PeriodError::MalformedIdentifier {
            identifier: identifier.to_string(),
            frequency,
            reason: reason.into(),
        }
    }
}

impl From<TypesError> for PeriodError {
    fn from(error: TypesError) -> Self {
        match error {
            TypesError::UnknownFrequency(raw) => PeriodError::UnknownFrequency(raw),
            other => PeriodError::OutOfRange(other.to_string()),
        }
    }
}

/// Simulated clock persistence errors
#[derive(Error, Debug)]
pub enum ClockError {
    #[error("Preference store error: {0}")]
    Store(#[from] PreferenceError),
}

/// Durable preference store errors
#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration and catalog errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Duplicate compliance type id {0}")]
    DuplicateType(uuid::Uuid),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ComplianceError>;
