use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::Aggregate;
use crate::error::SieveError;
use crate::metrics::MetricWeights;
use crate::pipeline::{CHUNK_BEGIN, CHUNK_END};

/// Marker written to the metric column for events that could not be scored.
pub const UNSCORED_SENTINEL: &str = "None";

/// Output paths embed the weight configuration so runs with different
/// weights do not clobber each other.
pub fn output_paths(dir: &Path, weights: &MetricWeights) -> (PathBuf, PathBuf) {
    let suffix = weights.suffix();
    (
        dir.join(format!("combined_metrics_IQM_{suffix}.csv")),
        dir.join(format!("best_results_IQM_{suffix}.stream")),
    )
}

/// Write the metrics table and the best-per-event stream file. Fails with
/// [`SieveError::NoResults`] when nothing scorable was found anywhere, in
/// which case neither file is written.
pub fn write_outputs(
    dir: &Path,
    aggregate: &Aggregate,
    weights: &MetricWeights,
) -> Result<(PathBuf, PathBuf), SieveError> {
    if aggregate.best_by_event.is_empty() {
        return Err(SieveError::NoResults);
    }
    let (csv_path, stream_path) = output_paths(dir, weights);
    write_metrics_csv(&csv_path, aggregate)?;
    write_best_stream(&stream_path, aggregate)?;
    Ok((csv_path, stream_path))
}

/// One row per processed event, scored rows first, then unscored rows with
/// the sentinel marker.
fn write_metrics_csv(path: &Path, aggregate: &Aggregate) -> Result<(), SieveError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["stream_file", "event_number", "combined_metric"])?;
    for record in &aggregate.scored {
        writer.write_record([
            record.source.clone(),
            record.event_number.to_string(),
            record.score.to_string(),
        ])?;
    }
    for record in &aggregate.unscored {
        writer.write_record([
            record.source.clone(),
            record.event_number.to_string(),
            UNSCORED_SENTINEL.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// The captured header followed by each winning chunk, delimited exactly as
/// in the input files, ascending by score.
fn write_best_stream(path: &Path, aggregate: &Aggregate) -> Result<(), SieveError> {
    let mut out = String::new();
    if let Some(header) = &aggregate.header {
        out.push_str(header);
    }
    for record in aggregate.best_results() {
        out.push_str(CHUNK_BEGIN);
        out.push_str(&record.chunk);
        if !record.chunk.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(CHUNK_END);
        out.push('\n');
    }
    fs::write(path, out).map_err(SieveError::Io)
}
