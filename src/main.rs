//! CLI entry point for the flight schedule comparison report.
//!
//! Provides subcommands for building the full report, exporting the revenue
//! delta model, listing rescheduled flights, and inspecting single histograms.

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand, ValueEnum};
use flight_report::analyzers::delta::build_delta_model;
use flight_report::analyzers::histogram::histogram_by_time_field;
use flight_report::analyzers::moved::detect_moved_flights;
use flight_report::analyzers::report::{airport_directory, build_report, flight_groups_by_stage};
use flight_report::{
    config::ReportConfig,
    loader::load_flights,
    output::{ReportEnvelope, print_json, print_pretty, write_delta_csv, write_report_json},
    record::{FieldKey, Stage, TimeField},
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "flight_report")]
#[command(about = "Compare original and optimized flight schedules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full comparison report and write it as JSON
    Report {
        /// Dataset file (.json, .json.gz, .csv, .csv.gz)
        #[arg(value_name = "DATASET")]
        input: String,

        /// File to write the report to
        #[arg(short, long, default_value = "report.json")]
        output: String,

        /// Gzip compress the report
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// JSON config file with bin widths
        #[arg(short, long)]
        config: Option<String>,

        /// Departure time-of-day bin width in minutes
        #[arg(long)]
        departure_bin_minutes: Option<i64>,

        /// Departure timestamp bin width in milliseconds
        #[arg(long)]
        weekly_bin_ms: Option<i64>,

        /// Also log the whole report at debug level
        #[arg(long, default_value_t = false)]
        verbose: bool,

        /// Also log the whole report as pretty JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Export the per flight number revenue delta model as CSV
    Delta {
        #[arg(value_name = "DATASET")]
        input: String,

        /// CSV file to write the delta model to
        #[arg(short, long, default_value = "delta.csv")]
        output: String,
    },
    /// List occurrences whose schedule changed between the two variants
    Moved {
        #[arg(value_name = "DATASET")]
        input: String,
    },
    /// Print the histogram of one time field for one flight number
    Histogram {
        #[arg(value_name = "DATASET")]
        input: String,

        /// Flight number to inspect
        #[arg(short, long)]
        flight: String,

        /// Time field to bucket
        #[arg(long, value_enum, default_value_t = FieldArg::DepartureMinutes)]
        field: FieldArg,

        /// Schedule variant
        #[arg(long, value_enum, default_value_t = StageArg::Start)]
        stage: StageArg,

        /// Bin width in the field's unit
        #[arg(short, long, default_value_t = 10)]
        width: i64,
    },
    /// List the airports of the original schedule
    Airports {
        #[arg(value_name = "DATASET")]
        input: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FieldArg {
    DepartureMinutes,
    ArrivalMinutes,
    DepartureTimestamp,
    DepartureDate,
}

impl From<FieldArg> for TimeField {
    fn from(arg: FieldArg) -> Self {
        match arg {
            FieldArg::DepartureMinutes => TimeField::DepartureMinutes,
            FieldArg::ArrivalMinutes => TimeField::ArrivalMinutes,
            FieldArg::DepartureTimestamp => TimeField::DepartureTimestamp,
            FieldArg::DepartureDate => TimeField::DepartureDate,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StageArg {
    Start,
    Result,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Start => Stage::Start,
            StageArg::Result => Stage::Result,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/flight_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("flight_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            output,
            gzip,
            config,
            departure_bin_minutes,
            weekly_bin_ms,
            verbose,
            json,
        } => {
            let base = match config {
                Some(path) => ReportConfig::load(&path)?,
                None => ReportConfig::from_env()?,
            };
            let config = base.with_overrides(departure_bin_minutes, weekly_bin_ms)?;
            info!(?config, "Resolved report config");

            let dataset = load_flights(&input)?;
            let report = build_report(&dataset.records, &config)?;
            if verbose {
                print_pretty(&report);
            }
            if json {
                print_json(&report)?;
            }

            write_report_json(&output, &ReportEnvelope::new(&input, &report), gzip)?;
        }
        Commands::Delta { input, output } => {
            let dataset = load_flights(&input)?;
            let (start, result) = flight_groups_by_stage(&dataset.records);
            let model = build_delta_model(&start, &result);

            write_delta_csv(&output, &model.entries)?;
            info!(
                path = %output,
                entries = model.entries.len(),
                skipped = model.anomalies.len(),
                "Delta model exported"
            );
        }
        Commands::Moved { input } => {
            let dataset = load_flights(&input)?;
            let moved = detect_moved_flights(&dataset.records);

            for pair in &moved.pairs {
                let [new, old] = pair.as_array();
                info!(
                    flight_id = %pair.flight_id,
                    flight_number = %old.flight_number,
                    from = %format_departure(old.departure_ts),
                    to = %format_departure(new.departure_ts),
                    shift_minutes = pair.departure_shift_ms() / 60_000,
                    revenue_delta = pair.revenue_delta(),
                    "Rescheduled flight"
                );
            }
            info!(
                moved = moved.pairs.len(),
                anomalies = moved.anomalies.len(),
                "Rescheduled flights summary"
            );
        }
        Commands::Histogram {
            input,
            flight,
            field,
            stage,
            width,
        } => {
            let dataset = load_flights(&input)?;
            let (start, result) = flight_groups_by_stage(&dataset.records);
            let groups = match Stage::from(stage) {
                Stage::Start => &start,
                Stage::Result => &result,
            };

            let key = FieldKey::Text(flight.clone());
            let Some(members) = groups.get(&key) else {
                warn!(flight = %flight, "Flight number not present in the selected schedule");
                return Ok(());
            };

            let bins = histogram_by_time_field(members, field.into(), width)
                .with_context(|| format!("Cannot bucket flight {flight}"))?;
            for bin in &bins {
                info!(bin = bin.bin, count = bin.count, "Bin");
            }
            info!(flight = %flight, bins = bins.len(), records = members.len(), "Histogram summary");
        }
        Commands::Airports { input } => {
            let dataset = load_flights(&input)?;
            let airports = airport_directory(&dataset.records);

            for airport in &airports {
                info!(
                    airport = %airport.airport,
                    city = airport.city.as_deref().unwrap_or("unknown"),
                    coordinates = ?airport.coordinates,
                    "Airport"
                );
            }
            info!(total = airports.len(), "Airport list summary");
        }
    }

    Ok(())
}

/// Renders an epoch-millisecond departure for log output.
fn format_departure(ts: i64) -> String {
    DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
