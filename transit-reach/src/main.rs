use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transit_reach::domain::{DayType, ServiceTime};
use transit_reach::graph::GraphStore;
use transit_reach::timetable::Timetable;
use transit_reach::{Engine, EngineConfig, ReachError, ReachRequest};

/// Print the stops reachable from an origin as a timeline of JSON frames.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Normalized timetable document (JSON)
    timetable: PathBuf,

    /// Origin stop id
    origin: String,

    /// Departure time as HH:MM[:SS]; defaults to now
    #[arg(long)]
    at: Option<ServiceTime>,

    /// weekday, saturday or sunday; defaults to today's
    #[arg(long)]
    day: Option<DayType>,

    /// Time budget in minutes
    #[arg(long, default_value_t = 30)]
    budget: i64,

    /// Timeline step in minutes; defaults to REACH_DEFAULT_STEP_MINUTES
    #[arg(long)]
    step: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read timetable {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse timetable {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Reach(#[from] ReachError),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Read { .. } | CliError::Parse { .. } => 2,
            CliError::Reach(e) if e.class().is_client_error() => 2,
            CliError::Reach(_) => 1,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<String, CliError> {
    let config = EngineConfig::from_env().map_err(ReachError::from)?;
    let now = Local::now().naive_local();

    let departure = args
        .at
        .unwrap_or_else(|| ServiceTime::from_naive_time(now.time()));
    let day_type = args.day.unwrap_or_else(|| DayType::from_date(now.date()));

    let timetable = load_timetable(&args.timetable)?;
    info!(
        stops = timetable.stops.len(),
        trips = timetable.trips.len(),
        "Loaded timetable"
    );

    let engine = Engine::new(GraphStore::new(), config);
    let summary = engine.refresh(Arc::new(timetable)).await?;
    info!(
        built = ?summary.built,
        warnings = summary.warnings,
        "Schedule graphs ready"
    );

    let mut request = ReachRequest::new(args.origin.as_str(), departure, day_type, args.budget);
    request.step_minutes = args.step;

    // Searches are CPU-bound; keep them off the async workers
    let timeline = tokio::task::spawn_blocking(move || engine.timeline(&request))
        .await
        .map_err(|e| ReachError::Internal(format!("query task failed: {e}")))??;

    serde_json::to_string_pretty(&timeline)
        .map_err(|e| ReachError::Internal(format!("failed to encode timeline: {e}")).into())
}

fn load_timetable(path: &Path) -> Result<Timetable, CliError> {
    let display = path.display().to_string();

    let file = File::open(path).map_err(|source| CliError::Read {
        path: display.clone(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::Parse {
        path: display,
        source,
    })
}
