use std::process::ExitCode;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use transit_router::planner::{Planner, RouteRequest, SearchConfig};
use transit_router::transit::TransitSnapshot;

const USAGE: &str = "usage: transit-router <snapshot.json> <request.json> [config.json]";

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let filter = EnvFilter::try_new(rust_log).unwrap_or_else(|err| {
        eprintln!(
            "invalid {}, falling back to level '{default_level}' - {err}",
            EnvFilter::DEFAULT_ENV
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(args: &[String]) -> Result<(), String> {
    let (snapshot_path, request_path) = match args {
        [snapshot, request] | [snapshot, request, _] => (snapshot, request),
        _ => return Err(USAGE.to_string()),
    };

    let snapshot = TransitSnapshot::from_json_file(snapshot_path)
        .map_err(|e| format!("{snapshot_path}: {e}"))?;

    let request_text =
        std::fs::read_to_string(request_path).map_err(|e| format!("{request_path}: {e}"))?;
    let request: RouteRequest =
        serde_json::from_str(&request_text).map_err(|e| format!("{request_path}: {e}"))?;

    let config = match args.get(2) {
        Some(path) => SearchConfig::from_json_file(path).map_err(|e| format!("{path}: {e}"))?,
        None => SearchConfig::default(),
    };

    let result = Planner::new(&snapshot, &config)
        .route(&request)
        .map_err(|e| e.to_string())?;

    let output = serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
    println!("{output}");
    Ok(())
}

fn main() -> ExitCode {
    init_logger();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}
