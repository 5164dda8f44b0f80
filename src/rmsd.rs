pub const DEFAULT_TOLERANCE_FACTOR: f64 = 2.0;

/// Intensity-weighted RMSD between measured peaks and their nearest predicted
/// reflections, with outlier peaks rejected.
///
/// Each peak is matched to its nearest reflection by brute force; ties resolve
/// to the first minimum in scan order. A peak is an inlier iff its nearest
/// distance is strictly below `mean + tolerance_factor * std` over the whole
/// population. Returns infinity when the inlier weight sum is zero, which
/// callers must treat as a disqualifying value rather than a score.
pub fn weighted_rmsd(
    peaks: &[(f64, f64)],
    intensities: &[f64],
    reflections: &[(f64, f64)],
    tolerance_factor: f64,
) -> f64 {
    if peaks.is_empty() || reflections.is_empty() {
        return f64::INFINITY;
    }

    let distances: Vec<f64> = peaks
        .iter()
        .map(|&(fs, ss)| nearest_distance(fs, ss, reflections))
        .collect();

    let mean = distances.iter().sum::<f64>() / distances.len() as f64;
    let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / distances.len() as f64;
    let threshold = mean + tolerance_factor * variance.sqrt();

    let mut total_rmsd = 0.0;
    let mut total_weight = 0.0;
    for (distance, weight) in distances.iter().zip(intensities) {
        if *distance < threshold {
            total_rmsd += distance.powi(2) * weight;
            total_weight += weight;
        }
    }

    if total_weight > 0.0 {
        (total_rmsd / total_weight).sqrt()
    } else {
        f64::INFINITY
    }
}

fn nearest_distance(fs: f64, ss: f64, reflections: &[(f64, f64)]) -> f64 {
    let mut min_distance = f64::INFINITY;
    for &(ref_fs, ref_ss) in reflections {
        let distance = ((fs - ref_fs).powi(2) + (ss - ref_ss).powi(2)).sqrt();
        if distance < min_distance {
            min_distance = distance;
        }
    }
    min_distance
}
