use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::cell::{self, UnitCell};
use crate::metrics::RawMetrics;
use crate::rmsd;

static EVENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Event: //(\d+)").unwrap());

static PEAK_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Peaks from peak search(.*?)End of peak list").unwrap());

static PEAK_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+(\d+\.\d+)\s+(\d+\.\d+)\s+\d+\.\d+\s+(\d+\.\d+)\s+p\d+").unwrap()
});

static REFLECTION_SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Reflections measured after indexing(.*?)End of reflections").unwrap()
});

static REFLECTION_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\s+-?\d+\s+-?\d+\s+-?\d+\s+\d+\.\d+\s+\d+\.\d+\s+\d+\.\d+\s+\d+\.\d+\s+(\d+\.\d+)\s+(\d+\.\d+)\s+p\d+",
    )
    .unwrap()
});

static NUM_PEAKS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"num_peaks = (\d+)").unwrap());

static NUM_REFLECTIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"num_reflections = (\d+)").unwrap());

static PEAK_RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"peak_resolution = [\d.]+ nm\^-1 or ([\d.]+) A").unwrap());

static DIFFRACTION_RESOLUTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"diffraction_resolution_limit = [\d.]+ nm\^-1 or ([\d.]+) A").unwrap()
});

static PROFILE_RADIUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"profile_radius = ([\d.]+) nm\^-1").unwrap());

/// One measured peak in detector coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub fs: f64,
    pub ss: f64,
    pub intensity: f64,
}

/// A parsed chunk: the event it belongs to (if any), its extracted metrics,
/// and the original text kept for the best-results output.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub event_number: Option<u64>,
    pub metrics: RawMetrics,
    pub text: String,
}

/// Chunks the indexing tool gave up on are skipped before parsing.
pub fn is_unindexed(chunk: &str) -> bool {
    chunk.to_lowercase().contains("indexed_by = none")
}

/// Parse one chunk's text into a [`ChunkRecord`]. Pure with respect to its
/// inputs; every extraction failure degrades its own field and nothing else.
pub fn parse_chunk(
    chunk: &str,
    reference_cell: Option<&UnitCell>,
    tolerance_factor: f64,
) -> ChunkRecord {
    let event_number = EVENT_RE
        .captures(chunk)
        .and_then(|caps| caps[1].parse().ok());
    if event_number.is_none() {
        debug!("no event number found in chunk");
    }

    let peaks = peak_list(chunk);
    let reflections = reflection_list(chunk);

    let weighted_rmsd = if !peaks.is_empty() && !reflections.is_empty() {
        let fs_ss: Vec<(f64, f64)> = peaks.iter().map(|p| (p.fs, p.ss)).collect();
        let intensities: Vec<f64> = peaks.iter().map(|p| p.intensity).collect();
        Some(rmsd::weighted_rmsd(&fs_ss, &intensities, &reflections, tolerance_factor))
    } else {
        debug!("unable to calculate weighted RMSD for chunk");
        None
    };

    let fitted_cell = UnitCell::from_chunk(chunk);
    if fitted_cell.is_none() {
        debug!("no cell parameters found in chunk");
    }
    let (length_deviation, angle_deviation) = match (fitted_cell.as_ref(), reference_cell) {
        (Some(measured), Some(reference)) => {
            let (length, angle) = cell::cell_deviation(measured, reference);
            (Some(length), Some(angle))
        }
        _ => (None, None),
    };

    let metrics = RawMetrics {
        weighted_rmsd,
        length_deviation,
        angle_deviation,
        num_peaks: capture_u32(&NUM_PEAKS_RE, chunk).unwrap_or(0),
        num_reflections: capture_u32(&NUM_REFLECTIONS_RE, chunk).unwrap_or(0),
        peak_resolution: capture_f64(&PEAK_RESOLUTION_RE, chunk),
        diffraction_resolution: capture_f64(&DIFFRACTION_RESOLUTION_RE, chunk),
        profile_radius: capture_f64(&PROFILE_RADIUS_RE, chunk),
    };

    ChunkRecord {
        event_number,
        metrics,
        text: chunk.to_string(),
    }
}

/// Peaks between the fixed peak-list section markers; empty if the section or
/// all of its rows are missing.
pub fn peak_list(chunk: &str) -> Vec<Peak> {
    let Some(section) = PEAK_SECTION_RE.captures(chunk) else {
        debug!("no peak list found in chunk");
        return Vec::new();
    };
    PEAK_LINE_RE
        .captures_iter(&section[1])
        .filter_map(|caps| {
            Some(Peak {
                fs: caps[1].parse().ok()?,
                ss: caps[2].parse().ok()?,
                intensity: caps[3].parse().ok()?,
            })
        })
        .collect()
}

/// Predicted reflection positions from the reflections section.
pub fn reflection_list(chunk: &str) -> Vec<(f64, f64)> {
    let Some(section) = REFLECTION_SECTION_RE.captures(chunk) else {
        debug!("no reflections section found in chunk");
        return Vec::new();
    };
    REFLECTION_LINE_RE
        .captures_iter(&section[1])
        .filter_map(|caps| Some((caps[1].parse().ok()?, caps[2].parse().ok()?)))
        .collect()
}

fn capture_u32(re: &Regex, chunk: &str) -> Option<u32> {
    re.captures(chunk).and_then(|caps| caps[1].parse().ok())
}

fn capture_f64(re: &Regex, chunk: &str) -> Option<f64> {
    re.captures(chunk).and_then(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rmsd::DEFAULT_TOLERANCE_FACTOR;

    fn sample_chunk() -> String {
        "\nImage filename: run0001.h5\n\
         Event: //42\n\
         indexed_by = xgandalf\n\
         num_peaks = 2\n\
         num_reflections = 2\n\
         peak_resolution = 2.00 nm^-1 or 5.00 A\n\
         diffraction_resolution_limit = 4.00 nm^-1 or 2.50 A\n\
         Peaks from peak search\n\
          fs/px   ss/px (1/d)/nm^-1   Intensity  Panel\n\
          10.00 10.00 1.00 100.00 p0\n\
          20.00 20.00 1.00 50.00 p0\n\
         End of peak list\n\
         --- Begin crystal\n\
         Cell parameters 4.50 5.00 6.00 nm, 90.00 90.00 90.00 deg\n\
         profile_radius = 0.00150 nm^-1\n\
         Reflections measured after indexing\n\
            h    k    l          I   sigma(I)       peak background  fs/px  ss/px panel\n\
          1 2 3 100.00 10.00 100.00 5.00 10.10 10.10 p0\n\
          1 2 4 50.00 5.00 50.00 2.00 20.20 20.20 p0\n\
         End of reflections\n\
         --- End crystal\n"
            .to_string()
    }

    fn reference_cell() -> UnitCell {
        UnitCell::new(45.0, 50.0, 60.0, 90.0, 90.0, 90.0)
    }

    #[test]
    fn test_parse_full_chunk() {
        let chunk = sample_chunk();
        let record = parse_chunk(&chunk, Some(&reference_cell()), DEFAULT_TOLERANCE_FACTOR);

        assert_eq!(record.event_number, Some(42));
        assert_eq!(record.metrics.num_peaks, 2);
        assert_eq!(record.metrics.num_reflections, 2);
        assert_eq!(record.metrics.peak_resolution, Some(5.0));
        assert_eq!(record.metrics.diffraction_resolution, Some(2.5));
        assert_eq!(record.metrics.profile_radius, Some(0.0015));
        // The fitted cell matches the reference exactly after nm conversion.
        assert_eq!(record.metrics.length_deviation, Some(0.0));
        assert_eq!(record.metrics.angle_deviation, Some(0.0));
        // Distances sqrt(0.02) and sqrt(0.08) with intensities 100 and 50.
        let rmsd = record.metrics.weighted_rmsd.unwrap();
        assert!((rmsd - 0.2).abs() < 1e-9);
        assert!(record.metrics.is_scorable());
        assert_eq!(record.text, chunk);
    }

    #[test]
    fn test_peak_list_extraction() {
        let peaks = peak_list(&sample_chunk());
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0], Peak { fs: 10.0, ss: 10.0, intensity: 100.0 });
        assert_eq!(peaks[1], Peak { fs: 20.0, ss: 20.0, intensity: 50.0 });
    }

    #[test]
    fn test_reflection_list_extraction() {
        let reflections = reflection_list(&sample_chunk());
        assert_eq!(reflections, vec![(10.1, 10.1), (20.2, 20.2)]);
    }

    #[test]
    fn test_missing_sections_degrade_to_absent_fields() {
        let chunk = "Event: //7\nindexed_by = xgandalf\n";
        let record = parse_chunk(chunk, Some(&reference_cell()), DEFAULT_TOLERANCE_FACTOR);
        assert_eq!(record.event_number, Some(7));
        assert_eq!(record.metrics.weighted_rmsd, None);
        assert_eq!(record.metrics.length_deviation, None);
        assert_eq!(record.metrics.num_peaks, 0);
        assert_eq!(record.metrics.peak_resolution, None);
        assert!(!record.metrics.is_scorable());
    }

    #[test]
    fn test_missing_event_number() {
        let record = parse_chunk("num_peaks = 3\n", None, DEFAULT_TOLERANCE_FACTOR);
        assert_eq!(record.event_number, None);
        assert_eq!(record.metrics.num_peaks, 3);
    }

    #[test]
    fn test_no_reference_cell_drops_deviations_only() {
        let chunk = sample_chunk();
        let record = parse_chunk(&chunk, None, DEFAULT_TOLERANCE_FACTOR);
        assert_eq!(record.metrics.length_deviation, None);
        assert_eq!(record.metrics.angle_deviation, None);
        assert!(record.metrics.weighted_rmsd.is_some());
        assert!(!record.metrics.is_scorable());
    }

    #[test]
    fn test_is_unindexed() {
        assert!(is_unindexed("...\nindexed_by = none\n..."));
        assert!(is_unindexed("INDEXED_BY = NONE"));
        assert!(!is_unindexed("indexed_by = xgandalf"));
    }
}
