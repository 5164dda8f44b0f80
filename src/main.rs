use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use streamsieve::metrics::{MetricWeights, METRIC_COUNT};
use streamsieve::rmsd::DEFAULT_TOLERANCE_FACTOR;
use streamsieve::{aggregate, file_handler, output, SieveError};

/// Rank per-event indexing results across stream files and keep the best
/// chunk per event.
#[derive(Parser, Debug)]
#[command(name = "streamsieve", version)]
struct Args {
    /// Directory containing the .stream files to process
    dir: PathBuf,

    /// Eight metric exponents in canonical order: weighted_rmsd,
    /// length_deviation, angle_deviation, num_peaks, num_reflections,
    /// peak_resolution, diffraction_resolution, profile_radius
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    weights: Option<Vec<f64>>,

    /// Metric exponents as a JSON object, e.g. '{"weighted_rmsd": 1, "num_peaks": -1}';
    /// unnamed metrics keep their default weight
    #[arg(long, conflicts_with = "weights")]
    weights_json: Option<String>,

    /// Outlier tolerance factor for the weighted RMSD
    #[arg(long, default_value_t = DEFAULT_TOLERANCE_FACTOR)]
    tolerance: f64,
}

fn resolve_weights(args: &Args) -> Result<MetricWeights, SieveError> {
    if let Some(values) = &args.weights {
        let values: [f64; METRIC_COUNT] = values
            .as_slice()
            .try_into()
            .map_err(|_| SieveError::Parse("expected exactly eight weights".to_string()))?;
        return Ok(MetricWeights::from_ordered(values));
    }
    if let Some(json) = &args.weights_json {
        return serde_json::from_str(json)
            .map_err(|e| SieveError::Parse(format!("invalid weight map: {e}")));
    }
    Ok(MetricWeights::default())
}

fn run(args: &Args) -> Result<(), SieveError> {
    let weights = resolve_weights(args)?;
    info!(weights = %weights.suffix(), tolerance = args.tolerance, "starting run");

    let removed = file_handler::remove_stale_best_results(&args.dir)?;
    if removed > 0 {
        info!(removed, "removed stale best-results files");
    }

    let files = file_handler::stream_files(&args.dir)?;
    if files.is_empty() {
        return Err(SieveError::Other(format!(
            "no stream files found in {}",
            args.dir.display()
        )));
    }
    info!(files = files.len(), "processing stream files");

    let aggregate = aggregate::process_directory(&files, &weights, args.tolerance);
    info!(
        events = aggregate.best_by_event.len(),
        scored = aggregate.scored.len(),
        unscored = aggregate.unscored.len(),
        "merge complete"
    );

    let (csv_path, stream_path) = output::write_outputs(&args.dir, &aggregate, &weights)?;
    info!(csv = %csv_path.display(), stream = %stream_path.display(), "outputs written");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
