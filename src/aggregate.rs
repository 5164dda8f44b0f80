use std::path::PathBuf;
use std::thread;

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::metrics::MetricWeights;
use crate::pipeline::{self, FileOutcome, ScoredRecord, UnscoredRecord};

/// Process-wide result table built up by merging per-file outcomes.
#[derive(Debug, Default)]
pub struct Aggregate {
    pub scored: Vec<ScoredRecord>,
    pub unscored: Vec<UnscoredRecord>,
    pub best_by_event: FxHashMap<u64, ScoredRecord>,
    pub header: Option<String>,
}

impl Aggregate {
    pub fn new() -> Self {
        Aggregate::default()
    }

    /// Merge one file's outcome. The best-by-event map only ever improves: a
    /// record replaces the current holder iff its score is strictly lower,
    /// with the lexicographically smaller source name breaking exact ties so
    /// the result is independent of merge order. Merging the same outcome
    /// twice is a no-op for the map.
    pub fn merge(&mut self, outcome: FileOutcome) {
        if self.header.is_none() && !outcome.header.is_empty() {
            self.header = Some(outcome.header);
        }

        for record in &outcome.scored {
            let replace = match self.best_by_event.get(&record.event_number) {
                Some(current) => {
                    record.score < current.score
                        || (record.score == current.score && record.source < current.source)
                }
                None => true,
            };
            if replace {
                self.best_by_event.insert(record.event_number, record.clone());
            }
        }

        self.scored.extend(outcome.scored);
        self.unscored.extend(outcome.unscored);
    }

    /// Final output order: ascending by combined score, with source name and
    /// event number as deterministic tiebreakers.
    pub fn best_results(&self) -> Vec<&ScoredRecord> {
        let mut best: Vec<&ScoredRecord> = self.best_by_event.values().collect();
        best.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.source.cmp(&b.source))
                .then_with(|| a.event_number.cmp(&b.event_number))
        });
        best
    }
}

/// Fan out one worker thread per stream file and merge their outcomes. The
/// workers produce pure `FileOutcome` values over a channel; this thread is
/// the only mutator of the aggregate. A failed file is reported and skipped
/// without disturbing its siblings. Outcomes are merged in input-file order
/// so the table contents do not depend on worker completion order.
pub fn process_directory(
    files: &[PathBuf],
    weights: &MetricWeights,
    tolerance_factor: f64,
) -> Aggregate {
    let mut aggregate = Aggregate::new();
    if files.is_empty() {
        return aggregate;
    }

    let (sender, receiver) = crossbeam_channel::unbounded();
    thread::scope(|scope| {
        for (index, path) in files.iter().enumerate() {
            let sender = sender.clone();
            scope.spawn(move || {
                let outcome = pipeline::process_stream_file(path, weights, tolerance_factor);
                let _ = sender.send((index, outcome));
            });
        }
        drop(sender);

        let mut outcomes: Vec<Option<FileOutcome>> = files.iter().map(|_| None).collect();
        for (index, outcome) in receiver {
            match outcome {
                Ok(outcome) => outcomes[index] = Some(outcome),
                Err(e) => {
                    warn!(file = %files[index].display(), error = %e, "stream file skipped");
                }
            }
        }

        for outcome in outcomes.into_iter().flatten() {
            aggregate.merge(outcome);
        }
    });

    aggregate
}
