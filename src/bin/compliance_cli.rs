//! Compliance CLI - period lookups, status derivation and test-mode clock control
//!
//! Usage:
//!   compliance_cli period --frequency quarterly
//!   compliance_cli window --frequency monthly 2024-02
//!   compliance_cli classify --frequency quarterly 2025-Q1 --date 2025-05-15
//!   compliance_cli timeline --compliance-type supervision --records records.json \
//!       --entity <uuid> --year 2025
//!   compliance_cli summary --compliance-type supervision --records records.json
//!   compliance_cli preset end-of-current-period --frequency annual --apply
//!   compliance_cli clock set 2025-06-15 --enable
//!
//! Build with `cargo build --features cli`.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use compliance_core::clock::{format_instant, FilePreferenceStore};
use compliance_core::{
    classify, current_period_status, error, parse_instant, period_identifier_for, period_window,
    quarterly_timeline, summarize, ClockSource, ComplianceCatalog, ComplianceConfig,
    ComplianceRecord, ComplianceTypeConfig, Frequency, Preset, RealClock, RecordStatus,
    SimulatedClock,
};

#[derive(Parser)]
#[command(name = "compliance-cli")]
#[command(about = "Compliance period calculator and test-mode clock")]
struct Cli {
    /// Preference file holding the test-mode clock (overrides COMPLIANCE_PREFERENCES_PATH)
    #[arg(long, global = true)]
    preferences: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Period identifier containing a date
    Period {
        #[arg(short, long)]
        frequency: Frequency,
        /// RFC 3339 or YYYY-MM-DD (default: clock now)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Start and end of a period
    Window {
        #[arg(short, long)]
        frequency: Frequency,
        identifier: String,
    },
    /// Derived status of one period
    Classify {
        #[arg(short, long)]
        frequency: Frequency,
        identifier: String,
        /// Treat the period as having a completed record
        #[arg(long)]
        completed: bool,
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Quarterly timeline of one entity, or its current-period status for other frequencies
    Timeline {
        #[arg(long, default_value = "config/compliance_types.yaml")]
        catalog: PathBuf,
        /// Compliance type id or name
        #[arg(long)]
        compliance_type: String,
        /// JSON array of compliance records
        #[arg(long)]
        records: PathBuf,
        #[arg(long)]
        entity: Uuid,
        /// Defaults to the year of the clock date
        #[arg(long)]
        year: Option<i32>,
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Due and completed lists for one compliance type
    Summary {
        #[arg(long, default_value = "config/compliance_types.yaml")]
        catalog: PathBuf,
        /// Compliance type id or name
        #[arg(long)]
        compliance_type: String,
        #[arg(long)]
        records: PathBuf,
        /// Entity population (default: every entity in the records file)
        #[arg(long)]
        entity: Vec<Uuid>,
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Resolve a date preset from the clock date
    Preset {
        preset: Preset,
        #[arg(short, long)]
        frequency: Frequency,
        /// Move the simulated clock to the result
        #[arg(long)]
        apply: bool,
    },
    /// Inspect or change the test-mode clock
    Clock {
        #[command(subcommand)]
        action: ClockAction,
    },
}

#[derive(Subcommand)]
enum ClockAction {
    Show,
    Enable,
    Disable,
    /// Set the simulated instant (RFC 3339 or YYYY-MM-DD)
    Set {
        instant: String,
        /// Also enable simulation
        #[arg(long)]
        enable: bool,
    },
}

#[derive(Serialize)]
struct ClockState {
    enabled: bool,
    simulated_instant: String,
    now: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ComplianceConfig::default();
    let preferences = cli
        .preferences
        .clone()
        .unwrap_or_else(|| config.preferences_path.clone());
    let mut clock = SimulatedClock::load(FilePreferenceStore::new(preferences));
    let format = cli.format;

    match cli.command {
        Command::Period { frequency, date } => {
            let now = instant_or_now(date.as_deref(), &clock)?;
            let period = period_identifier_for(now, frequency)?;
            emit(format, &period, || format!("{period}  ({})", period.label()))?;
        }
        Command::Window {
            frequency,
            identifier,
        } => {
            let window = period_window(&identifier, frequency)?;
            emit(format, &window, || {
                format!(
                    "{identifier}: {} .. {}",
                    format_instant(window.start),
                    format_instant(window.end)
                )
            })?;
        }
        Command::Classify {
            frequency,
            identifier,
            completed,
            date,
        } => {
            let now = instant_or_now(date.as_deref(), &clock)?;
            let record = completed.then(|| {
                ComplianceRecord::new(
                    Uuid::nil(),
                    Uuid::nil(),
                    identifier.clone(),
                    RecordStatus::Completed,
                )
            });
            let status = classify(record.as_ref(), &identifier, frequency, now)?;
            emit(format, &status, || format!("{identifier}: {status}"))?;
        }
        Command::Timeline {
            catalog,
            compliance_type,
            records,
            entity,
            year,
            date,
        } => {
            let now = instant_or_now(date.as_deref(), &clock)?;
            let catalog = ComplianceCatalog::load(&catalog)?;
            let ty = find_type(&catalog, &compliance_type)?;
            let records = load_records(&records)?;
            if ty.frequency == Frequency::Quarterly {
                let year = match year {
                    Some(year) => year,
                    None => period_identifier_for(now, ty.frequency)?.year(),
                };
                let timeline = quarterly_timeline(ty, entity, year, &records, now)?;
                emit(format, &timeline, || {
                    timeline
                        .iter()
                        .map(|q| {
                            let id = q.period_identifier.to_string();
                            format!("{:<14} {:<8} {}", q.label, id, q.status)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })?;
            } else {
                let status = current_period_status(ty, entity, &records, now)?;
                emit(format, &status, || {
                    format!("{} ({}): {}", status.period_identifier, status.label, status.status)
                })?;
            }
        }
        Command::Summary {
            catalog,
            compliance_type,
            records,
            entity,
            date,
        } => {
            let now = instant_or_now(date.as_deref(), &clock)?;
            let catalog = ComplianceCatalog::load(&catalog)?;
            let ty = find_type(&catalog, &compliance_type)?;
            let records = load_records(&records)?;
            let population = if entity.is_empty() {
                distinct_entities(&records)
            } else {
                entity
            };
            let summary = summarize(ty, &population, &records, now, config.summary_options())?;
            emit(format, &summary, || {
                let mut lines = vec![format!(
                    "{} ({}) current period {}: {:.0}% complete",
                    ty.name,
                    ty.frequency,
                    summary.current_period,
                    summary.current_period_stats.completion_rate() * 100.0
                )];
                lines.push(format!("Due ({} total):", summary.total_due));
                lines.extend(
                    summary
                        .due
                        .iter()
                        .map(|e| format!("  {} {} {}", e.entity_id, e.period_identifier, e.status)),
                );
                lines.push(format!("Completed ({} total):", summary.total_completed));
                lines.extend(summary.completed.iter().map(|e| {
                    let at = e.completion_date.map(format_instant).unwrap_or_default();
                    format!("  {} {} {}", e.entity_id, e.period_identifier, at)
                }));
                lines.join("\n")
            })?;
        }
        Command::Preset {
            preset,
            frequency,
            apply,
        } => {
            let target = preset.resolve(clock.now(), frequency, &RealClock)?;
            if apply {
                clock.set_simulated_instant(target)?;
            }
            emit(format, &format_instant(target), || {
                format!("{preset}: {}", format_instant(target))
            })?;
        }
        Command::Clock { action } => {
            match action {
                ClockAction::Show => {}
                ClockAction::Enable => clock.set_simulation_enabled(true)?,
                ClockAction::Disable => clock.set_simulation_enabled(false)?,
                ClockAction::Set { instant, enable } => {
                    let instant = parse_instant(&instant)?;
                    clock.set_simulated_instant(instant)?;
                    if enable {
                        clock.set_simulation_enabled(true)?;
                    }
                }
            }
            let state = ClockState {
                enabled: clock.is_enabled(),
                simulated_instant: format_instant(clock.simulated_instant()),
                now: format_instant(clock.now()),
            };
            emit(format, &state, || {
                format!(
                    "test mode: {}\nsimulated: {}\nnow:       {}",
                    if state.enabled { "on" } else { "off" },
                    state.simulated_instant,
                    state.now
                )
            })?;
        }
    }

    Ok(())
}

/// `--date` when given, otherwise the (possibly simulated) clock
fn instant_or_now(raw: Option<&str>, clock: &impl ClockSource) -> error::Result<DateTime<Utc>> {
    match raw {
        Some(raw) => Ok(parse_instant(raw)?),
        None => Ok(clock.now()),
    }
}

fn find_type<'a>(catalog: &'a ComplianceCatalog, key: &str) -> Result<&'a ComplianceTypeConfig> {
    catalog
        .find(key)
        .ok_or_else(|| anyhow!("Unknown compliance type: {key}"))
}

fn load_records(path: &Path) -> Result<Vec<ComplianceRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading records from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing records in {}", path.display()))
}

fn distinct_entities(records: &[ComplianceRecord]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    records
        .iter()
        .map(|r| r.entity_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", text()),
    }
    Ok(())
}
