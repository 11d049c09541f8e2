//! Runtime configuration and the compliance-type catalog
//!
//! Settings come from the environment (a `.env` file is loaded by the CLI);
//! compliance types and their frequencies come from a YAML catalog.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use compliance_types::ComplianceTypeConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::ConfigError;
use crate::status::SummaryOptions;

pub const PREFERENCES_PATH_VAR: &str = "COMPLIANCE_PREFERENCES_PATH";
pub const RECENT_MONTHS_VAR: &str = "COMPLIANCE_RECENT_COMPLETION_MONTHS";
pub const SUMMARY_LIMIT_VAR: &str = "COMPLIANCE_SUMMARY_LIMIT";

/// Compliance core configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceConfig {
    /// Where the test-mode clock state is persisted
    pub preferences_path: PathBuf,
    pub recent_completion_months: u32,
    pub summary_limit: usize,
}

impl ComplianceConfig {
    fn builtin() -> Self {
        Self {
            preferences_path: PathBuf::from(".compliance/preferences.json"),
            recent_completion_months: 3,
            summary_limit: 5,
        }
    }

    /// Read the environment, rejecting values that do not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys take built-in defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::builtin();
        if let Some(path) = lookup(PREFERENCES_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            config.preferences_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(RECENT_MONTHS_VAR) {
            config.recent_completion_months = parse_var(RECENT_MONTHS_VAR, &raw)?;
        }
        if let Some(raw) = lookup(SUMMARY_LIMIT_VAR) {
            config.summary_limit = parse_var(SUMMARY_LIMIT_VAR, &raw)?;
        }
        Ok(config)
    }

    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            recent_completion_months: self.recent_completion_months,
            limit: self.summary_limit,
        }
    }
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|error| {
            warn!(%error, "invalid compliance configuration, using defaults");
            Self::builtin()
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Compliance types known to the application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceCatalog {
    #[serde(default)]
    pub compliance_types: Vec<ComplianceTypeConfig>,
}

impl ComplianceCatalog {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let catalog: Self = serde_yaml::from_str(yaml)?;
        let mut ids = HashSet::new();
        for ty in &catalog.compliance_types {
            if !ids.insert(ty.id) {
                return Err(ConfigError::DuplicateType(ty.id));
            }
        }
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn get(&self, id: Uuid) -> Option<&ComplianceTypeConfig> {
        self.compliance_types.iter().find(|ty| ty.id == id)
    }

    /// Look up by id or case-insensitive name
    pub fn find(&self, key: &str) -> Option<&ComplianceTypeConfig> {
        match Uuid::parse_str(key) {
            Ok(id) => self.get(id),
            Err(_) => self
                .compliance_types
                .iter()
                .find(|ty| ty.name.eq_ignore_ascii_case(key)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComplianceTypeConfig> {
        self.compliance_types.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_types::Frequency;
    use std::collections::HashMap;

    const CATALOG: &str = r#"
compliance_types:
  - id: 3f0c2a52-8d1e-4c55-9a57-0f4f6c1d2b01
    name: Supervision
    frequency: quarterly
  - id: 3f0c2a52-8d1e-4c55-9a57-0f4f6c1d2b02
    name: Appraisal
    frequency: Annual
    description: Yearly performance appraisal
"#;

    #[test]
    fn test_lookup_defaults() {
        let config = ComplianceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ComplianceConfig::builtin());
        assert_eq!(config.summary_options(), SummaryOptions::default());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            (PREFERENCES_PATH_VAR, "/tmp/prefs.json"),
            (RECENT_MONTHS_VAR, "6"),
            (SUMMARY_LIMIT_VAR, " 10 "),
        ]
        .into_iter()
        .collect();
        let config =
            ComplianceConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.preferences_path, PathBuf::from("/tmp/prefs.json"));
        assert_eq!(config.recent_completion_months, 6);
        assert_eq!(config.summary_limit, 10);
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let result = ComplianceConfig::from_lookup(|key| {
            (key == SUMMARY_LIMIT_VAR).then(|| "five".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_catalog_parses_and_finds() {
        let catalog = ComplianceCatalog::from_yaml_str(CATALOG).unwrap();
        assert_eq!(catalog.iter().count(), 2);
        let supervision = catalog.find("supervision").unwrap();
        assert_eq!(supervision.frequency, Frequency::Quarterly);
        let appraisal = catalog.find("3f0c2a52-8d1e-4c55-9a57-0f4f6c1d2b02").unwrap();
        assert_eq!(appraisal.frequency, Frequency::Annual);
        assert!(catalog.find("induction").is_none());
    }

    #[test]
    fn test_catalog_rejects_unknown_frequency() {
        let yaml = CATALOG.replace("quarterly", "fortnightly");
        assert!(matches!(
            ComplianceCatalog::from_yaml_str(&yaml),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_catalog_rejects_duplicate_ids() {
        let yaml = CATALOG.replace("2b02", "2b01");
        assert!(matches!(
            ComplianceCatalog::from_yaml_str(&yaml),
            Err(ConfigError::DuplicateType(_))
        ));
    }

    #[test]
    fn test_missing_catalog_file() {
        assert!(matches!(
            ComplianceCatalog::load("/nonexistent/catalog.yaml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
