//! # Root for utility functions in `longsv`
//!
//! Small numeric helpers shared by the clustering and genotyping code; the
//! `cigar` sub-module holds CIGAR classification functions.
pub mod cigar;

/// Floor mean of a non-empty slice. Ties from the integer division land on
/// the earlier coordinate.
pub fn floor_mean(values: &[i64]) -> i64 {
    debug_assert!(!values.is_empty());
    values.iter().sum::<i64>() / values.len() as i64
}

/// Median of a sorted non-empty slice; for an even count the floor average
/// of the two middle elements.
pub fn median_of_sorted(sorted: &[i64]) -> i64 {
    debug_assert!(!sorted.is_empty());
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<i64>() as f64 / n;
    let var = values
        .iter()
        .map(|v| {
            let d = *v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    var.sqrt()
}
