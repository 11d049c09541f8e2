//! Simulated Clock Provider
//!
//! Everything that needs "now" takes a [`ClockSource`]. The application wires
//! either [`RealClock`] or a [`SimulatedClock`] (operator test mode) at startup.
//!
//! Test-mode state is two persisted preferences: an enabled flag and the
//! simulated instant as RFC 3339 with millisecond precision.

pub mod preferences;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use tracing::{info, warn};

pub use preferences::{FilePreferenceStore, InMemoryPreferenceStore, PreferenceStore};

use crate::error::ClockError;

/// Preference key of the test-mode flag (`"true"` / `"false"`)
pub const ENABLED_KEY: &str = "compliance.test_mode.enabled";
/// Preference key of the simulated instant (RFC 3339, milliseconds, `Z`)
pub const INSTANT_KEY: &str = "compliance.test_mode.simulated_instant";

/// Source of the current instant. Call on every use; never cache the result.
pub trait ClockSource {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl ClockSource for RealClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl ClockSource for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Operator-controlled clock backed by a preference store.
///
/// While disabled, `now()` is real time and the stored instant is ignored.
pub struct SimulatedClock<S: PreferenceStore> {
    store: S,
    enabled: bool,
    simulated: DateTime<Utc>,
}

impl<S: PreferenceStore> SimulatedClock<S> {
    /// Restore state from `store`.
    ///
    /// A missing, unreadable or unparseable preference is not fatal: the clock
    /// starts disabled at real time.
    pub fn load(store: S) -> Self {
        let real_now = truncate(Utc::now());
        let (enabled, simulated) = match read_state(&store) {
            Ok(Some((enabled, simulated))) => (enabled, simulated),
            Ok(None) => (false, real_now),
            Err(reason) => {
                warn!(%reason, "ignoring persisted test-mode clock state");
                (false, real_now)
            }
        };
        Self {
            store,
            enabled,
            simulated,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The stored simulated instant, whether or not simulation is enabled
    pub fn simulated_instant(&self) -> DateTime<Utc> {
        self.simulated
    }

    /// Turn simulation on or off.
    ///
    /// Turning it off discards the chosen simulated date: the stored instant
    /// is reset to real time.
    pub fn set_simulation_enabled(&mut self, enabled: bool) -> Result<(), ClockError> {
        let simulated = if enabled {
            self.simulated
        } else {
            truncate(Utc::now())
        };
        self.persist(enabled, simulated)?;
        self.enabled = enabled;
        self.simulated = simulated;
        info!(enabled, simulated = %format_instant(simulated), "test-mode clock toggled");
        Ok(())
    }

    /// Choose the simulated instant. Does not enable simulation.
    pub fn set_simulated_instant(&mut self, instant: DateTime<Utc>) -> Result<(), ClockError> {
        let simulated = truncate(instant);
        self.persist(self.enabled, simulated)?;
        self.simulated = simulated;
        info!(simulated = %format_instant(simulated), "test-mode clock moved");
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Both keys go to the store in a single update
    fn persist(&mut self, enabled: bool, simulated: DateTime<Utc>) -> Result<(), ClockError> {
        let flag = if enabled { "true" } else { "false" };
        let instant = format_instant(simulated);
        self.store.set_many(&[(ENABLED_KEY, flag), (INSTANT_KEY, instant.as_str())])?;
        Ok(())
    }
}

impl<S: PreferenceStore> ClockSource for SimulatedClock<S> {
    fn now(&self) -> DateTime<Utc> {
        if self.enabled {
            self.simulated
        } else {
            Utc::now()
        }
    }
}

/// Persisted form of an instant
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn truncate(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(3)
}

/// `Ok(None)` when nothing was ever persisted
fn read_state<S: PreferenceStore>(store: &S) -> Result<Option<(bool, DateTime<Utc>)>, String> {
    let flag = store.get(ENABLED_KEY).map_err(|e| e.to_string())?;
    let instant = store.get(INSTANT_KEY).map_err(|e| e.to_string())?;

    let enabled = match flag.as_deref() {
        None => return Ok(None),
        Some("true") => true,
        Some("false") => false,
        Some(other) => return Err(format!("unparseable enabled flag '{other}'")),
    };
    let simulated = match instant {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| format!("unparseable simulated instant '{raw}': {e}"))?,
        None if enabled => return Err("simulation enabled without an instant".to_string()),
        None => return Ok(None),
    };
    Ok(Some((enabled, simulated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreferenceError;
    use chrono::{Duration, TimeZone};

    fn june_15() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_fresh_store_is_disabled_real_time() {
        let clock = SimulatedClock::load(InMemoryPreferenceStore::new());
        assert!(!clock.is_enabled());
        let drift = (clock.now() - Utc::now()).num_seconds().abs();
        assert!(drift < 5);
    }

    #[test]
    fn test_setting_instant_does_not_enable() {
        let mut clock = SimulatedClock::load(InMemoryPreferenceStore::new());
        clock.set_simulated_instant(june_15()).unwrap();
        assert!(!clock.is_enabled());
        assert_ne!(clock.now(), june_15());

        clock.set_simulation_enabled(true).unwrap();
        assert_eq!(clock.now(), june_15());
    }

    #[test]
    fn test_disabling_discards_simulated_instant() {
        let mut clock = SimulatedClock::load(InMemoryPreferenceStore::new());
        clock.set_simulated_instant(june_15()).unwrap();
        clock.set_simulation_enabled(true).unwrap();
        clock.set_simulation_enabled(false).unwrap();

        let drift = (clock.simulated_instant() - Utc::now()).num_seconds().abs();
        assert!(drift < 5);

        // Re-enabling resumes from real time, not the old date
        clock.set_simulation_enabled(true).unwrap();
        assert_ne!(clock.now(), june_15());
    }

    #[test]
    fn test_state_survives_reload() {
        let mut clock = SimulatedClock::load(InMemoryPreferenceStore::new());
        let instant = june_15() + Duration::milliseconds(123);
        clock.set_simulated_instant(instant).unwrap();
        clock.set_simulation_enabled(true).unwrap();

        let store = clock.into_store();
        assert_eq!(
            store.get(INSTANT_KEY).unwrap().as_deref(),
            Some("2025-06-15T09:30:00.123Z")
        );
        let reloaded = SimulatedClock::load(store);
        assert!(reloaded.is_enabled());
        assert_eq!(reloaded.now(), instant);
    }

    #[test]
    fn test_sub_millisecond_precision_is_truncated() {
        let mut clock = SimulatedClock::load(InMemoryPreferenceStore::new());
        let instant = june_15() + Duration::nanoseconds(1_500_700);
        clock.set_simulated_instant(instant).unwrap();
        clock.set_simulation_enabled(true).unwrap();

        let expected = june_15() + Duration::milliseconds(1);
        assert_eq!(clock.now(), expected);
        assert_eq!(SimulatedClock::load(clock.into_store()).now(), expected);
    }

    #[test]
    fn test_corrupt_instant_falls_back_to_real_time() {
        let mut store = InMemoryPreferenceStore::new();
        store.set(ENABLED_KEY, "true").unwrap();
        store.set(INSTANT_KEY, "next tuesday").unwrap();

        let clock = SimulatedClock::load(store);
        assert!(!clock.is_enabled());
        let drift = (clock.now() - Utc::now()).num_seconds().abs();
        assert!(drift < 5);
    }

    #[test]
    fn test_corrupt_flag_falls_back_to_real_time() {
        let mut store = InMemoryPreferenceStore::new();
        store.set(ENABLED_KEY, "yes please").unwrap();
        store.set(INSTANT_KEY, "2025-06-15T09:30:00.000Z").unwrap();
        assert!(!SimulatedClock::load(store).is_enabled());
    }

    #[test]
    fn test_enabled_without_instant_falls_back() {
        let mut store = InMemoryPreferenceStore::new();
        store.set(ENABLED_KEY, "true").unwrap();
        assert!(!SimulatedClock::load(store).is_enabled());
    }

    /// In-memory store that refuses writes to the simulated instant
    struct ReadOnlyInstantStore(InMemoryPreferenceStore);

    impl PreferenceStore for ReadOnlyInstantStore {
        fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
            if key == INSTANT_KEY {
                return Err(std::io::Error::other("read-only").into());
            }
            self.0.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let mut inner = InMemoryPreferenceStore::new();
        inner.set(ENABLED_KEY, "true").unwrap();
        inner.set(INSTANT_KEY, &format_instant(june_15())).unwrap();
        let mut clock = SimulatedClock::load(ReadOnlyInstantStore(inner));
        assert!(clock.is_enabled());

        assert!(clock.set_simulation_enabled(false).is_err());
        assert!(clock.is_enabled());
        assert_eq!(clock.now(), june_15());
        assert_eq!(clock.store().get(ENABLED_KEY).unwrap().as_deref(), Some("true"));

        let reloaded = SimulatedClock::load(clock.into_store());
        assert!(reloaded.is_enabled());
        assert_eq!(reloaded.now(), june_15());
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock::new(june_15()).now(), june_15());
    }
}
