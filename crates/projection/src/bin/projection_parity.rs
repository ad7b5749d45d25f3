//! Sweep a lat/lon lattice through both projection paths and report drift.
//!
//! Usage:
//!   cargo run --release --bin projection-parity -- --step 1 --center-lat 40 --center-lon -100
//!
//! Exits with a non-zero status when any kind exceeds the parity tolerance.

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use projection::{check_parity, LatLon, ProjectionKind, ProjectionSpec, PARITY_TOLERANCE};

#[derive(Parser, Debug)]
#[command(name = "projection-parity")]
#[command(about = "Compare the scalar and parallel projection paths")]
struct Args {
    /// Lattice spacing in degrees
    #[arg(long, env = "PARITY_STEP", default_value_t = 1.0)]
    step: f64,

    /// Latitude of the projection center
    #[arg(long, env = "PROJECTION_CENTER_LAT", default_value_t = 0.0, allow_hyphen_values = true)]
    center_lat: f64,

    /// Longitude of the projection center
    #[arg(long, env = "PROJECTION_CENTER_LON", default_value_t = 0.0, allow_hyphen_values = true)]
    center_lon: f64,

    /// Only check this kind (default: all)
    #[arg(long)]
    kind: Option<ProjectionKind>,

    /// Print reports as JSON lines
    #[arg(long)]
    json: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn lattice(step: f64) -> Vec<(f64, f64)> {
    let rows = (180.0 / step).floor() as usize;
    let cols = (360.0 / step).floor() as usize;
    (0..=rows)
        .flat_map(|i| {
            let lat = -90.0 + i as f64 * step;
            (0..cols).map(move |j| (lat, -180.0 + j as f64 * step))
        })
        .collect()
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if !(args.step > 0.0 && args.step <= 90.0) {
        bail!("--step must be in (0, 90], got {}", args.step);
    }

    let center = LatLon::new(args.center_lat, args.center_lon);
    let points = lattice(args.step);
    info!(samples = points.len(), center_lat = center.lat, center_lon = center.lon, "Sweeping lattice");

    let kinds: Vec<ProjectionKind> = match args.kind {
        Some(kind) => vec![kind],
        None => ProjectionKind::ALL.to_vec(),
    };

    let mut failures = Vec::new();
    for kind in kinds {
        let report = check_parity(&ProjectionSpec::new(kind, center), &points);
        if args.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!(
                "{:<24} compared {:>7}  skipped {:>6}  max deviation {:.3e}  {}",
                kind.as_str(),
                report.compared,
                report.skipped,
                report.max_deviation,
                if report.passes() { "ok" } else { "FAIL" }
            );
        }
        if !report.passes() {
            warn!(kind = %kind, worst = ?report.worst, mismatches = report.validity_mismatches, "Parity exceeded");
            failures.push(kind.as_str());
        }
    }

    if !failures.is_empty() {
        bail!(
            "{} kind(s) exceed tolerance {:e}: {}",
            failures.len(),
            PARITY_TOLERANCE,
            failures.join(", ")
        );
    }
    Ok(())
}
