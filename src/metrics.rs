use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub const METRIC_COUNT: usize = 8;

/// Canonical metric order. Ordered weight sequences, raw value rows, and
/// output-file suffixes all follow this order.
pub const METRIC_NAMES: [&str; METRIC_COUNT] = [
    "weighted_rmsd",
    "length_deviation",
    "angle_deviation",
    "num_peaks",
    "num_reflections",
    "peak_resolution",
    "diffraction_resolution",
    "profile_radius",
];

/// Per-event metrics extracted from one chunk. Fields that could not be
/// parsed or computed stay absent; the counts default to zero as the stream
/// format does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMetrics {
    pub weighted_rmsd: Option<f64>,
    pub length_deviation: Option<f64>,
    pub angle_deviation: Option<f64>,
    pub num_peaks: u32,
    pub num_reflections: u32,
    pub peak_resolution: Option<f64>,
    pub diffraction_resolution: Option<f64>,
    pub profile_radius: Option<f64>,
}

impl RawMetrics {
    /// An event is scorable iff the five mandatory metrics are present and
    /// finite. An infinite weighted RMSD (no inliers) disqualifies the event.
    pub fn is_scorable(&self) -> bool {
        [
            self.weighted_rmsd,
            self.length_deviation,
            self.angle_deviation,
            self.peak_resolution,
            self.diffraction_resolution,
        ]
        .iter()
        .all(|m| m.is_some_and(f64::is_finite))
    }

    /// Raw values in canonical metric order. Absent optional fields default
    /// to zero; they still participate in normalization and combination.
    pub fn values(&self) -> [f64; METRIC_COUNT] {
        [
            self.weighted_rmsd.unwrap_or(0.0),
            self.length_deviation.unwrap_or(0.0),
            self.angle_deviation.unwrap_or(0.0),
            f64::from(self.num_peaks),
            f64::from(self.num_reflections),
            self.peak_resolution.unwrap_or(0.0),
            self.diffraction_resolution.unwrap_or(0.0),
            self.profile_radius.unwrap_or(0.0),
        ]
    }
}

/// Signed exponent per metric. A negative weight inverts a metric's
/// contribution so that a higher raw value lowers the combined score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricWeights {
    pub weighted_rmsd: f64,
    pub length_deviation: f64,
    pub angle_deviation: f64,
    pub num_peaks: f64,
    pub num_reflections: f64,
    pub peak_resolution: f64,
    pub diffraction_resolution: f64,
    pub profile_radius: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        MetricWeights {
            weighted_rmsd: 1.0,
            length_deviation: 2.0,
            angle_deviation: 3.0,
            num_peaks: -1.0,
            num_reflections: 1.0,
            peak_resolution: -1.0,
            diffraction_resolution: 1.0,
            profile_radius: 1.0,
        }
    }
}

impl MetricWeights {
    /// Build from an ordered sequence matching [`METRIC_NAMES`].
    pub fn from_ordered(values: [f64; METRIC_COUNT]) -> Self {
        MetricWeights {
            weighted_rmsd: values[0],
            length_deviation: values[1],
            angle_deviation: values[2],
            num_peaks: values[3],
            num_reflections: values[4],
            peak_resolution: values[5],
            diffraction_resolution: values[6],
            profile_radius: values[7],
        }
    }

    pub fn exponents(&self) -> [f64; METRIC_COUNT] {
        [
            self.weighted_rmsd,
            self.length_deviation,
            self.angle_deviation,
            self.num_peaks,
            self.num_reflections,
            self.peak_resolution,
            self.diffraction_resolution,
            self.profile_radius,
        ]
    }

    /// Filename suffix embedding the weight configuration, e.g.
    /// `1_2_3_-1_1_-1_1_1`.
    pub fn suffix(&self) -> String {
        self.exponents().iter().map(format_weight).join("_")
    }
}

fn format_weight(weight: &f64) -> String {
    if weight.fract() == 0.0 {
        format!("{}", *weight as i64)
    } else {
        format!("{}", weight)
    }
}

/// Min-max normalize each metric column to [0,1] across the population. A
/// zero-variance column maps every member to 0.5.
pub fn normalize(rows: &[[f64; METRIC_COUNT]]) -> Vec<[f64; METRIC_COUNT]> {
    let mut normalized = vec![[0.5; METRIC_COUNT]; rows.len()];
    for column in 0..METRIC_COUNT {
        let Some((min, max)) = rows
            .iter()
            .map(|row| row[column])
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
        else {
            continue;
        };
        if max > min {
            for (out, row) in normalized.iter_mut().zip(rows) {
                out[column] = (row[column] - min) / (max - min);
            }
        }
    }
    normalized
}

/// Combined score: product over all metrics of `(1 + normalized)^weight`.
/// Strictly positive for any fully populated normalized row.
pub fn combined_score(normalized: &[f64; METRIC_COUNT], weights: &MetricWeights) -> f64 {
    normalized
        .iter()
        .zip(weights.exponents())
        .map(|(value, weight)| (1.0 + value).powf(weight))
        .product()
}
