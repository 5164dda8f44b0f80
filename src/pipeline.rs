use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::cell::UnitCell;
use crate::chunk;
use crate::error::SieveError;
use crate::metrics::{self, MetricWeights, RawMetrics};

pub const CHUNK_BEGIN: &str = "----- Begin chunk -----";
pub const CHUNK_END: &str = "----- End chunk -----";

/// One event's final ranking entry: where it came from, how it scored, and
/// the chunk text that will be written back out if it wins its event.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub source: String,
    pub event_number: u64,
    pub score: f64,
    pub chunk: String,
}

/// An event that was parsed but is missing a mandatory metric.
#[derive(Debug, Clone, PartialEq)]
pub struct UnscoredRecord {
    pub source: String,
    pub event_number: u64,
}

/// Pure output of processing one stream file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub scored: Vec<ScoredRecord>,
    pub unscored: Vec<UnscoredRecord>,
    pub header: String,
}

pub fn process_stream_file(
    path: &Path,
    weights: &MetricWeights,
    tolerance_factor: f64,
) -> Result<FileOutcome, SieveError> {
    let content = fs::read_to_string(path).map_err(SieveError::Io)?;
    let source = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string());
    Ok(process_stream_text(&source, &content, weights, tolerance_factor))
}

/// Split a stream file into header and chunks, score every scorable event,
/// and rank the results ascending by combined score. Malformed chunks degrade
/// to absent metrics rather than failing the file.
pub fn process_stream_text(
    source: &str,
    content: &str,
    weights: &MetricWeights,
    tolerance_factor: f64,
) -> FileOutcome {
    let (header, raw_chunks) = split_stream(content);

    let reference_cell = UnitCell::from_header(header);
    if reference_cell.is_none() {
        warn!(source, "no reference cell parameters in header; cell deviations unavailable");
    }

    let total_chunks = raw_chunks.len();
    let mut scorable: Vec<(u64, RawMetrics, String)> = Vec::new();
    let mut unscored: Vec<UnscoredRecord> = Vec::new();

    for raw in raw_chunks {
        if chunk::is_unindexed(raw) {
            continue;
        }
        let record = chunk::parse_chunk(raw, reference_cell.as_ref(), tolerance_factor);
        let Some(event_number) = record.event_number else {
            warn!(source, "chunk without event number skipped");
            continue;
        };
        if record.metrics.is_scorable() {
            scorable.push((event_number, record.metrics, record.text));
        } else {
            unscored.push(UnscoredRecord {
                source: source.to_string(),
                event_number,
            });
        }
    }

    let rows: Vec<_> = scorable.iter().map(|(_, m, _)| m.values()).collect();
    let normalized = metrics::normalize(&rows);

    let mut scored: Vec<ScoredRecord> = scorable
        .into_iter()
        .zip(&normalized)
        .map(|((event_number, _, text), row)| ScoredRecord {
            source: source.to_string(),
            event_number,
            score: metrics::combined_score(row, weights),
            chunk: text,
        })
        .collect();
    // Stable sort keeps the original chunk order on equal scores.
    scored.sort_by(|a, b| a.score.total_cmp(&b.score));

    info!(
        source,
        chunks = total_chunks,
        scored = scored.len(),
        unscored = unscored.len(),
        "processed stream file"
    );

    FileOutcome {
        scored,
        unscored,
        header: header.to_string(),
    }
}

/// Split file content on the chunk-begin delimiter. The first piece is the
/// header; each remaining piece is truncated at the chunk-end delimiter.
pub fn split_stream(content: &str) -> (&str, Vec<&str>) {
    let mut pieces = content.split(CHUNK_BEGIN);
    let header = pieces.next().unwrap_or("");
    let chunks = pieces
        .map(|piece| piece.split(CHUNK_END).next().unwrap_or(piece))
        .collect();
    (header, chunks)
}
