//! # Include-region BED input
//!
//! An optional BED3 file restricts extraction to "interesting" regions. Each
//! region is padded by 1000 bp on both sides; windows later intersect their
//! own slice of the region list so workers only test local intervals.
use std::collections::HashMap;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use log::info;
use serde::Deserialize;

/// Padding added around every BED region.
const REGION_PADDING: i64 = 1000;

#[derive(Debug, Deserialize)]
struct BedRecord {
    chrom: String,
    start: i64,
    end: i64,
}

/// Padded include regions, grouped per chromosome and sorted.
#[derive(Debug, Default)]
pub struct IncludeRegions {
    regions: HashMap<String, Vec<(i64, i64)>>,
}

impl IncludeRegions {
    pub fn load(file_path: &str) -> Result<IncludeRegions> {
        let mut bed_reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .from_path(file_path)
            .with_context(|| format!("Could not read bed file {file_path}"))?;

        let mut regions: HashMap<String, Vec<(i64, i64)>> = HashMap::new();
        let mut n = 0usize;
        for result in bed_reader.deserialize() {
            let record: BedRecord = result
                .with_context(|| format!("Failed to deserialize bed record in {file_path}"))?;
            regions
                .entry(record.chrom)
                .or_default()
                .push((record.start - REGION_PADDING, record.end + REGION_PADDING));
            n += 1;
        }
        for intervals in regions.values_mut() {
            intervals.sort();
        }

        info!("Read {n} include regions from {file_path}");
        Ok(IncludeRegions { regions })
    }

    /// The padded regions overlapping one extraction window.
    pub fn for_window(&self, chrom: &str, start: i64, end: i64) -> Vec<(i64, i64)> {
        let Some(intervals) = self.regions.get(chrom) else {
            return Vec::new();
        };
        intervals
            .iter()
            .filter(|(rs, re)| (start <= *rs && end > *rs) || (*rs <= start && start < *re))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn regions_are_padded_and_assigned_to_windows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("include.bed");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "chr1\t5000\t6000").unwrap();
        writeln!(file, "chr2\t100\t200").unwrap();
        drop(file);

        let regions = IncludeRegions::load(path.to_str().unwrap()).unwrap();
        assert_eq!(
            regions.for_window("chr1", 0, 10_000),
            vec![(4000, 7000)]
        );
        // window that starts inside the padded region
        assert_eq!(
            regions.for_window("chr1", 5000, 10_000),
            vec![(4000, 7000)]
        );
        assert!(regions.for_window("chr1", 8000, 10_000).is_empty());
        assert!(regions.for_window("chr3", 0, 10_000).is_empty());
    }
}
