mod snapshot;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prima_core::{
    Cohort, CoreConfig, MeasurementPatch, OpaqueJson, PatientId, RecordFilter, YearMonth,
    aggregate, assess, build_dashboard, build_trend, latest_for_month, latest_for_patient,
    latest_per_patient, merge_into_latest, trend_window_from_env_value, vulnerable_patients,
};
use snapshot::Snapshot;

const TREND_WINDOW_ENV: &str = "PRIMA_TREND_WINDOW";

#[derive(Parser)]
#[command(name = "prima-run")]
#[command(about = "PRIMA posyandu risk stratification over a records snapshot")]
struct Cli {
    /// Snapshot file: {"patients": [...], "records": [...]}
    #[arg(long, short)]
    snapshot: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// High-risk counts per cohort plus monthly chart data
    Dashboard,
    /// Latest record of every patient, grouped by cohort
    History,
    /// Latest records, optionally for one patient and/or one month
    Latest {
        #[arg(long)]
        patient: Option<PatientId>,
        /// Calendar month (YYYY-MM)
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// High-risk patients of one cohort
    Vulnerable {
        /// child, pregnantWoman or adolescentGirl
        #[arg(long)]
        cohort: Cohort,
    },
    /// Risk assessment of every patient's latest record
    Classify,
    /// Monthly High/Medium/Safe series per cohort
    Trend,
    /// Correct the latest record of a patient
    Merge {
        #[arg(long)]
        patient: PatientId,
        /// Weight (kg)
        #[arg(long)]
        bb: Option<f64>,
        /// Height (cm)
        #[arg(long)]
        tb: Option<f64>,
        /// Mid-upper-arm circumference (cm)
        #[arg(long)]
        lila: Option<f64>,
        /// Average hemoglobin (g/dL)
        #[arg(long)]
        hb: Option<f64>,
        /// Write the corrected snapshot back to disk
        #[arg(long)]
        write: bool,
    },
}

/// Entry point for the PRIMA snapshot runner.
///
/// # Environment Variables
/// - `PRIMA_TREND_WINDOW`: months covered by trend series (default: 12)
/// - `RUST_LOG`: log filter; logs go to stderr so stdout stays valid JSON
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prima=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let trend_window = trend_window_from_env_value(std::env::var(TREND_WINDOW_ENV).ok())?;
    let config = CoreConfig::new(trend_window)?;

    let cli = Cli::parse();
    let mut snapshot = Snapshot::load(&cli.snapshot)?;
    let records = &snapshot.records;

    match cli.command {
        Commands::Dashboard => print_json(&build_dashboard(records, &config, Utc::now())),
        Commands::History => {
            let latest = latest_per_patient(records, &RecordFilter::all());
            print_json(&aggregate(latest.into_values()))
        }
        Commands::Latest { patient, month } => match (patient, month) {
            (Some(patient), Some(month)) => {
                let record = latest_for_month(records, &patient, month)
                    .with_context(|| format!("no record for patient {patient} in {month}"))?;
                print_json(record)
            }
            (Some(patient), None) => {
                let record = latest_for_patient(records, &patient)
                    .with_context(|| format!("no record for patient {patient}"))?;
                print_json(record)
            }
            (None, month) => {
                let mut filter = RecordFilter::all();
                if let Some(month) = month {
                    filter = filter.in_month(month);
                }
                let latest: Vec<_> = latest_per_patient(records, &filter).into_values().collect();
                print_json(&latest)
            }
        },
        Commands::Vulnerable { cohort } => {
            let latest = latest_per_patient(records, &RecordFilter::all());
            print_json(&vulnerable_patients(latest.into_values(), cohort))
        }
        Commands::Classify => {
            let assessments: Vec<_> = latest_per_patient(records, &RecordFilter::all())
                .into_values()
                .map(assess)
                .collect();
            print_json(&assessments)
        }
        Commands::Trend => print_json(&build_trend(records, config.trend_window(), Utc::now())),
        Commands::Merge {
            patient,
            bb,
            tb,
            lila,
            hb,
            write,
        } => {
            let patch = MeasurementPatch {
                hemoglobin_result: hb
                    .map(|hb| {
                        OpaqueJson::from_text(serde_json::json!({ "averageHb": hb }).to_string())
                    })
                    .transpose()?,
                weight_kg: bb,
                height_cm: tb,
                lila_cm: lila,
            };
            if patch.is_empty() {
                bail!("merge needs at least one of --bb, --tb, --lila or --hb");
            }

            let updated = merge_into_latest(&mut snapshot.records, &patient, &patch)?;
            print_json(updated)?;

            if write {
                snapshot.save(&cli.snapshot)?;
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialise output")?;
    println!("{text}");
    Ok(())
}
